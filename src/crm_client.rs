use crate::config::Config;
use crate::errors::AppError;
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;

/// Max length of an error detail persisted onto a lead record.
const DETAIL_MAX_LEN: usize = 500;

/// Outcome of a single CRM push, as stamped onto the lead record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The CRM accepted the contact (2xx) or already had it (409). Either
    /// way the contact exists with the tag, which is all delivery means.
    Delivered { status: u16 },
    /// Token or tag id absent from configuration; no network call was made.
    Skipped { reason: String },
    /// Every attempt failed; carries the last observed error, truncated.
    Failed { error: String },
}

/// Retry schedule for CRM pushes, kept separate from the transport so the
/// schedule is testable on its own and tests can inject a zero-delay policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(800),
        }
    }
}

impl RetryPolicy {
    /// Delay inserted after the given 1-based attempt number: linear in the
    /// attempt count (~0.8s after the first attempt, ~1.6s after the second).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// Client for pushing contacts into the external CRM.
///
/// Holds no mutable state; every `push` is an independent request/response
/// cycle, so a single instance is shared freely across concurrent
/// submissions.
#[derive(Clone)]
pub struct CrmClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    tag_id: Option<String>,
    policy: RetryPolicy,
}

impl CrmClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.crm_timeout())
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create CRM client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.crm_api_base.trim_end_matches('/').to_string(),
            token: config.crm_token.clone(),
            tag_id: config.crm_tag_id.clone(),
            policy: RetryPolicy::default(),
        })
    }

    /// Replace the retry schedule. Tests use this to drop the backoff sleeps.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Deliver one contact+tag association to the CRM.
    ///
    /// Any response outside the success/conflict set, and any transport
    /// failure including a per-attempt timeout, counts as a failed attempt
    /// and is retried up to `max_attempts` total with linearly increasing
    /// backoff in between.
    pub async fn push(&self, email: &str, profile: Option<&str>) -> PushOutcome {
        let (token, tag_id) = match (&self.token, &self.tag_id) {
            (Some(token), Some(tag_id)) => (token, tag_id),
            _ => {
                tracing::info!("CRM push skipped for {}: token or tag id not configured", email);
                return PushOutcome::Skipped {
                    reason: "skipped_missing_config".to_string(),
                };
            }
        };

        let url = format!("{}/public/v1/contacts", self.base_url);
        let payload = json!({
            "email": email,
            "first_name": profile.unwrap_or(""),
            "tags": [tag_id],
        });

        let mut last_error = "unknown_error".to_string();
        for attempt in 1..=self.policy.max_attempts {
            match self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", token))
                .json(&payload)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() || status == StatusCode::CONFLICT {
                        tracing::info!("CRM accepted contact {} ({})", email, status.as_u16());
                        return PushOutcome::Delivered {
                            status: status.as_u16(),
                        };
                    }
                    let body = response.text().await.unwrap_or_default();
                    last_error = truncate_detail(&format!("HTTP {}: {}", status.as_u16(), body));
                    tracing::warn!(
                        "CRM push attempt {}/{} rejected: {}",
                        attempt,
                        self.policy.max_attempts,
                        last_error
                    );
                }
                Err(e) => {
                    last_error = truncate_detail(&e.to_string());
                    tracing::warn!(
                        "CRM push attempt {}/{} failed: {}",
                        attempt,
                        self.policy.max_attempts,
                        last_error
                    );
                }
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        PushOutcome::Failed { error: last_error }
    }
}

/// Bound a push error message to what the store column should hold.
fn truncate_detail(detail: &str) -> String {
    if detail.chars().count() > DETAIL_MAX_LEN {
        detail.chars().take(DETAIL_MAX_LEN).collect()
    } else {
        detail.to_string()
    }
}
