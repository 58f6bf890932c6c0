//! Policy engine configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external policy engine (PDP).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Base URL of the policy decision point.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API token sent as a bearer credential.
    #[serde(default)]
    pub api_token: String,
    /// Tenant every assignment is scoped to.
    #[serde(default = "default_tenant")]
    pub tenant: String,
    /// Resource type used when formatting resource instances
    /// (`"<resource_type>:<file_id>"`).
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// Maximum attempts per call (first try included).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial backoff between attempts in milliseconds; doubles per retry.
    #[serde(default = "default_backoff")]
    pub initial_backoff_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            tenant: default_tenant(),
            resource_type: default_resource_type(),
            request_timeout_seconds: default_timeout(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_backoff(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:7766".to_string()
}

fn default_tenant() -> String {
    "default".to_string()
}

fn default_resource_type() -> String {
    "file-share".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> u64 {
    200
}
