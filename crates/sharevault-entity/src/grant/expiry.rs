//! Grant expiry: the time bound on a grant, and the duration vocabulary
//! offered when sharing.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use sharevault_core::AppError;

/// The time bound on a grant.
///
/// Serialized as a nullable timestamp: `null` means unlimited, matching the
/// stored document shape. Expiry is enforced locally; the policy engine has
/// no notion of a grant's time bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<DateTime<Utc>>", into = "Option<DateTime<Utc>>")]
pub enum GrantExpiry {
    /// The grant never expires.
    Unlimited,
    /// The grant expires at the given instant.
    At(DateTime<Utc>),
}

impl GrantExpiry {
    /// Whether the grant is expired as of `now`.
    ///
    /// `Unlimited` is never expired; `At(t)` is expired iff `now >= t`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Unlimited => false,
            Self::At(t) => now >= *t,
        }
    }
}

/// Ordered by longevity: `Unlimited` beats any finite expiry, and a later
/// finite expiry beats an earlier one.
impl Ord for GrantExpiry {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Unlimited, Self::Unlimited) => Ordering::Equal,
            (Self::Unlimited, Self::At(_)) => Ordering::Greater,
            (Self::At(_), Self::Unlimited) => Ordering::Less,
            (Self::At(a), Self::At(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for GrantExpiry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Option<DateTime<Utc>>> for GrantExpiry {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        match value {
            None => Self::Unlimited,
            Some(t) => Self::At(t),
        }
    }
}

impl From<GrantExpiry> for Option<DateTime<Utc>> {
    fn from(value: GrantExpiry) -> Self {
        match value {
            GrantExpiry::Unlimited => None,
            GrantExpiry::At(t) => Some(t),
        }
    }
}

/// Sharing durations offered at grant time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareDuration {
    /// 7 days.
    #[serde(rename = "7 days")]
    SevenDays,
    /// 14 days.
    #[serde(rename = "2 weeks")]
    TwoWeeks,
    /// 30 days.
    #[serde(rename = "a month")]
    OneMonth,
    /// No time bound.
    #[serde(rename = "unlimited")]
    Unlimited,
}

impl ShareDuration {
    /// Convert the duration into an absolute expiry starting from `now`.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> GrantExpiry {
        match self {
            Self::SevenDays => GrantExpiry::At(now + Duration::days(7)),
            Self::TwoWeeks => GrantExpiry::At(now + Duration::days(14)),
            Self::OneMonth => GrantExpiry::At(now + Duration::days(30)),
            Self::Unlimited => GrantExpiry::Unlimited,
        }
    }

    /// Whether the duration is unlimited.
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Return the duration as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenDays => "7 days",
            Self::TwoWeeks => "2 weeks",
            Self::OneMonth => "a month",
            Self::Unlimited => "unlimited",
        }
    }
}

impl fmt::Display for ShareDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShareDuration {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "7 days" => Ok(Self::SevenDays),
            "2 weeks" => Ok(Self::TwoWeeks),
            "a month" => Ok(Self::OneMonth),
            "unlimited" => Ok(Self::Unlimited),
            _ => Err(AppError::validation(format!(
                "Invalid share duration: '{s}'. Expected one of: 7 days, 2 weeks, a month, unlimited"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_unlimited_never_expires() {
        for secs in [0, 1, 1_000_000, i32::MAX as i64] {
            assert!(!GrantExpiry::Unlimited.is_expired(at(secs)));
        }
    }

    #[test]
    fn test_finite_expiry_boundary() {
        let expiry = GrantExpiry::At(at(1000));
        assert!(!expiry.is_expired(at(999)));
        // Expired exactly at the bound: now >= t.
        assert!(expiry.is_expired(at(1000)));
        assert!(expiry.is_expired(at(1001)));
    }

    #[test]
    fn test_longevity_ordering() {
        assert!(GrantExpiry::Unlimited > GrantExpiry::At(at(i32::MAX as i64)));
        assert!(GrantExpiry::At(at(2000)) > GrantExpiry::At(at(1000)));
        assert_eq!(GrantExpiry::Unlimited.cmp(&GrantExpiry::Unlimited), Ordering::Equal);
    }

    #[test]
    fn test_expiry_serde_nullable() {
        let json = serde_json::to_string(&GrantExpiry::Unlimited).unwrap();
        assert_eq!(json, "null");
        let parsed: GrantExpiry = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, GrantExpiry::Unlimited);

        let finite = GrantExpiry::At(at(1_700_000_000));
        let json = serde_json::to_string(&finite).unwrap();
        let parsed: GrantExpiry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, finite);
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!("7 days".parse::<ShareDuration>().unwrap(), ShareDuration::SevenDays);
        assert_eq!("2 weeks".parse::<ShareDuration>().unwrap(), ShareDuration::TwoWeeks);
        assert_eq!("a month".parse::<ShareDuration>().unwrap(), ShareDuration::OneMonth);
        assert_eq!("Unlimited".parse::<ShareDuration>().unwrap(), ShareDuration::Unlimited);
        assert!("forever".parse::<ShareDuration>().is_err());
    }

    #[test]
    fn test_duration_to_expiry() {
        let now = at(0);
        assert_eq!(
            ShareDuration::SevenDays.expiry_from(now),
            GrantExpiry::At(now + Duration::days(7))
        );
        assert_eq!(
            ShareDuration::OneMonth.expiry_from(now),
            GrantExpiry::At(now + Duration::days(30))
        );
        assert_eq!(ShareDuration::Unlimited.expiry_from(now), GrantExpiry::Unlimited);
    }
}
