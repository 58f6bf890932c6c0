//! HTTP policy gateway.
//!
//! Speaks the policy engine's REST surface: subjects, role assignments,
//! and resource instances. Conflict and not-found responses are folded
//! into success where the operation's intent is already satisfied, which
//! is what makes every call retry-safe.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sharevault_core::config::policy::PolicyConfig;
use sharevault_core::error::{AppError, ErrorKind};
use sharevault_core::result::AppResult;
use sharevault_core::types::id::FileId;
use sharevault_entity::grant::GrantRole;

use async_trait::async_trait;

use crate::gateway::{PolicyGateway, RoleClaim, resource_instance, subject_key};
use crate::retry::{CallError, with_retry};

/// Body for subject creation.
#[derive(Debug, Serialize)]
struct SubjectBody<'a> {
    key: &'a str,
    email: &'a str,
}

/// Body for role assignment.
#[derive(Debug, Serialize)]
struct AssignmentBody<'a> {
    user: &'a str,
    role: &'a str,
    tenant: &'a str,
    resource_instance: &'a str,
}

/// Body for resource instance creation.
#[derive(Debug, Serialize)]
struct ResourceInstanceBody<'a> {
    key: &'a str,
    resource: &'a str,
    tenant: &'a str,
}

/// One assignment entry as returned by the engine.
#[derive(Debug, Deserialize)]
struct AssignmentEntry {
    role: String,
    resource_instance: Option<String>,
}

/// Reqwest-backed [`PolicyGateway`].
#[derive(Debug)]
pub struct HttpPolicyGateway {
    client: reqwest::Client,
    config: PolicyConfig,
}

impl HttpPolicyGateway {
    /// Build a gateway from configuration.
    pub fn new(config: PolicyConfig) -> AppResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if !config.api_token.is_empty() {
            let value =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.api_token))
                    .map_err(|e| {
                        AppError::configuration(format!("Invalid policy API token: {e}"))
                    })?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build policy engine client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send a request with retry/backoff. Connect failures and 5xx are
    /// transient; credential rejections are permanent and never retried;
    /// everything else is handed back for the operation to interpret.
    async fn send<F>(&self, operation: &'static str, build: F) -> AppResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        with_retry(
            operation,
            self.config.max_attempts,
            Duration::from_millis(self.config.initial_backoff_ms),
            || {
                let builder = build();
                async move {
                    let response = builder.send().await.map_err(|e| {
                        CallError::Transient(AppError::with_source(
                            ErrorKind::ServiceUnavailable,
                            format!("Policy engine unreachable: {e}"),
                            e,
                        ))
                    })?;

                    if let Some(err) = classify_status(response.status()) {
                        return Err(err);
                    }
                    Ok(response)
                }
            },
        )
        .await
    }
}

/// Failure classification for a response status. 5xx may clear on retry;
/// 401/403 will not, since the token is fixed for the client's lifetime.
/// Other statuses carry operation-level meaning (404 on lookup, 409 on
/// create) and pass through.
fn classify_status(status: StatusCode) -> Option<CallError> {
    if status.is_server_error() {
        return Some(CallError::Transient(AppError::external_service(format!(
            "Policy engine returned {status}"
        ))));
    }
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Some(CallError::Permanent(AppError::external_service(format!(
            "Policy engine rejected credentials: {status}"
        ))));
    }
    None
}

#[async_trait]
impl PolicyGateway for HttpPolicyGateway {
    async fn ensure_subject(&self, email: &str) -> AppResult<()> {
        let key = subject_key(email);

        let response = self
            .send("get_subject", || {
                self.client.get(self.url(&format!("users/{key}")))
            })
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                let response = self
                    .send("create_subject", || {
                        self.client
                            .post(self.url("users"))
                            .json(&SubjectBody { key: &key, email })
                    })
                    .await?;
                match response.status() {
                    status if status.is_success() => Ok(()),
                    // Raced another creator; the subject exists either way.
                    StatusCode::CONFLICT => Ok(()),
                    status => Err(AppError::external_service(format!(
                        "Failed to create policy subject for {email}: {status}"
                    ))),
                }
            }
            status => Err(AppError::external_service(format!(
                "Failed to look up policy subject for {email}: {status}"
            ))),
        }
    }

    async fn assign_role(&self, email: &str, role: GrantRole, file_id: FileId) -> AppResult<()> {
        let key = subject_key(email);
        let instance = resource_instance(&self.config.resource_type, file_id);

        let response = self
            .send("assign_role", || {
                self.client
                    .post(self.url("role_assignments"))
                    .json(&AssignmentBody {
                        user: &key,
                        role: role.as_str(),
                        tenant: &self.config.tenant,
                        resource_instance: &instance,
                    })
            })
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Ok(()),
            status => Err(AppError::external_service(format!(
                "Failed to assign {role} on {instance} to {email}: {status}"
            ))),
        }
    }

    async fn unassign_role(&self, email: &str, role: GrantRole, file_id: FileId) -> AppResult<()> {
        let key = subject_key(email);
        let instance = resource_instance(&self.config.resource_type, file_id);

        let response = self
            .send("unassign_role", || {
                self.client.delete(self.url("role_assignments")).query(&[
                    ("user", key.as_str()),
                    ("role", role.as_str()),
                    ("tenant", self.config.tenant.as_str()),
                    ("resource_instance", instance.as_str()),
                ])
            })
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(AppError::external_service(format!(
                "Failed to unassign {role} on {instance} from {email}: {status}"
            ))),
        }
    }

    async fn list_role_claims(&self, email: &str) -> AppResult<Vec<RoleClaim>> {
        let key = subject_key(email);

        let response = self
            .send("list_role_claims", || {
                self.client
                    .get(self.url("role_assignments"))
                    .query(&[("user", key.as_str())])
            })
            .await?;

        if !response.status().is_success() {
            return Err(AppError::external_service(format!(
                "Failed to list role claims for {email}: {}",
                response.status()
            )));
        }

        let entries: Vec<AssignmentEntry> = response.json().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                "Malformed role assignment response from policy engine",
                e,
            )
        })?;

        Ok(parse_claims(&self.config.resource_type, entries))
    }

    async fn create_resource(&self, file_id: FileId) -> AppResult<()> {
        let file_key = file_id.to_string();

        let response = self
            .send("create_resource", || {
                self.client
                    .post(self.url("resource_instances"))
                    .json(&ResourceInstanceBody {
                        key: &file_key,
                        resource: &self.config.resource_type,
                        tenant: &self.config.tenant,
                    })
            })
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Ok(()),
            status => Err(AppError::external_service(format!(
                "Failed to create resource instance for {file_id}: {status}"
            ))),
        }
    }

    async fn delete_resource(&self, file_id: FileId) -> AppResult<()> {
        let response = self
            .send("delete_resource", || {
                self.client
                    .delete(self.url(&format!("resource_instances/{file_id}")))
            })
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(AppError::external_service(format!(
                "Failed to delete resource instance for {file_id}: {status}"
            ))),
        }
    }
}

/// Filter raw assignment entries down to well-formed claims: a role from
/// the grant vocabulary and a `{resource_type}:{file_id}` instance.
fn parse_claims(resource_type: &str, entries: Vec<AssignmentEntry>) -> Vec<RoleClaim> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let role: GrantRole = match entry.role.parse() {
                Ok(role) => role,
                Err(_) => {
                    debug!(role = %entry.role, "Skipping claim with unknown role");
                    return None;
                }
            };

            let instance = entry.resource_instance?;
            let (kind, id) = instance.split_once(':')?;
            if kind != resource_type {
                return None;
            }
            let file_id: FileId = match id.parse() {
                Ok(id) => id,
                Err(_) => {
                    debug!(resource_instance = %instance, "Skipping claim with malformed file id");
                    return None;
                }
            };

            Some(RoleClaim { file_id, role })
        })
        .collect()
}
