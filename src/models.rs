use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============ Database Models ============

/// A captured email lead together with the outcome of its most recent CRM
/// push. One row per normalized email address, enforced by a unique index.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lead {
    /// Surrogate identifier assigned by the store on creation.
    pub id: Uuid,
    /// Creation timestamp (UTC); never changes after insert.
    pub created_at: DateTime<Utc>,
    /// Normalized (trimmed, lower-cased) address; the natural key.
    pub email: String,
    /// Optional free-text classification tag (e.g., quiz outcome).
    pub profile: Option<String>,
    /// Best-effort client address, audit only.
    pub source_ip: Option<String>,
    /// Request User-Agent, audit only.
    pub user_agent: Option<String>,
    /// Outcome of the latest CRM push; see [`SyncStatus`].
    pub sync_status: String,
    /// Code or message describing the latest push result.
    pub sync_detail: Option<String>,
}

/// Tri-state outcome of the most recent CRM push attempt, stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    NotAttempted,
    Succeeded,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::NotAttempted => "not_attempted",
            SyncStatus::Succeeded => "succeeded",
            SyncStatus::Failed => "failed",
        }
    }
}

// ============ Request/Response Models ============

/// Body of `POST /submit-email`.
#[derive(Debug, Deserialize)]
pub struct SubmitEmailRequest {
    pub email: Option<String>,
    pub profile: Option<String>,
}

/// Transport-level metadata captured from the inbound request, stored on the
/// lead for audit purposes only. Never used for identity.
#[derive(Debug, Default, Clone)]
pub struct RequestMeta {
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
}
