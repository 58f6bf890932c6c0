//! Effective-role resolution.
//!
//! The policy engine is the enforcement-side source of truth for roles,
//! but it has no notion of a grant's time bound. Expiry is therefore
//! enforced locally: an expired grant yields no role no matter what the
//! engine still claims. When the engine holds no claim but a live local
//! grant exists, the grant's recorded role applies as a degraded-mode
//! fallback until the engine catches up.

use chrono::{DateTime, Utc};

use sharevault_core::types::id::FileId;
use sharevault_entity::grant::{Grant, GrantRole};
use sharevault_policy::gateway::RoleClaim;

/// Pure resolver computing the effective role for one recipient on one
/// file. Stateless; every input is passed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleResolver;

impl RoleResolver {
    /// Resolve the effective role, or `None` when access is denied.
    ///
    /// `grants` are the recipient's grants on this file (normally one,
    /// but documents written before re-shares replaced grants may hold
    /// several); `claims` are all of the recipient's policy claims.
    pub fn resolve(
        file_id: FileId,
        grants: &[Grant],
        claims: &[RoleClaim],
        now: DateTime<Utc>,
    ) -> Option<GrantRole> {
        let claim_role = claims
            .iter()
            .filter(|c| c.file_id == file_id)
            .map(|c| c.role)
            .max_by_key(|r| r.privilege_level());

        if grants.is_empty() {
            // No local record of sharing; only an external claim can
            // grant access.
            return claim_role;
        }

        let best_live = grants
            .iter()
            .filter(|g| !g.is_expired(now))
            .max_by_key(|g| (g.role.privilege_level(), g.expiry));

        // Expiry is local law: all grants expired means no access, even
        // if the engine has not been told yet.
        let best_live = best_live?;

        Some(claim_role.unwrap_or(best_live.role))
    }
}
