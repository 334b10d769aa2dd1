use crate::crm_client::{CrmClient, PushOutcome};
use crate::errors::AppError;
use crate::lead_store::LeadStore;
use crate::models::{RequestMeta, SyncStatus};
use regex::Regex;

/// Basic syntactic check: non-empty local part, `@`, domain containing a dot.
/// Sufficient for lead capture; deliverability is the CRM's problem.
pub fn is_valid_email(email: &str) -> bool {
    let email_regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    email_regex.is_match(email)
}

/// Trim and lowercase; the result is the lead's natural key.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Orchestrates one submission: validate, upsert, push, record.
///
/// The requester's result depends only on validation and storage; CRM
/// delivery is best-effort and observable only through the stored sync
/// status. A capture must never fail because the CRM is down.
#[derive(Clone)]
pub struct IngestionService {
    store: LeadStore,
    crm: CrmClient,
}

impl IngestionService {
    pub fn new(store: LeadStore, crm: CrmClient) -> Self {
        Self { store, crm }
    }

    pub async fn submit(
        &self,
        raw_email: &str,
        raw_profile: Option<&str>,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        let email = normalize_email(raw_email);
        if email.is_empty() {
            return Err(AppError::Validation("email_required"));
        }
        if !is_valid_email(&email) {
            return Err(AppError::Validation("email_invalid"));
        }

        let profile = raw_profile.map(str::trim).filter(|p| !p.is_empty());

        // Storage failure aborts here; no partial state, no CRM call.
        let lead = self
            .store
            .find_or_create(
                &email,
                profile,
                meta.source_ip.as_deref(),
                meta.user_agent.as_deref(),
            )
            .await?;

        let outcome = self.crm.push(&email, profile).await;
        let (status, detail) = match &outcome {
            PushOutcome::Delivered { status } => (SyncStatus::Succeeded, status.to_string()),
            PushOutcome::Skipped { reason } => (SyncStatus::Failed, reason.clone()),
            PushOutcome::Failed { error } => (SyncStatus::Failed, error.clone()),
        };

        self.store
            .update_sync_result(lead.id, status, Some(&detail))
            .await?;

        tracing::info!(
            "lead: email={} profile={} sync={} detail={} ip={}",
            email,
            profile.unwrap_or("-"),
            status.as_str(),
            detail.chars().take(120).collect::<String>(),
            meta.source_ip.as_deref().unwrap_or("-")
        );

        Ok(())
    }
}
