use crate::errors::AppError;
use crate::models::{Lead, SyncStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Durable keyed storage for lead records.
///
/// Uniqueness per normalized email is enforced by the database index, not by
/// application-level locking; storage failures surface to the caller
/// unretried.
#[derive(Clone)]
pub struct LeadStore {
    pool: PgPool,
}

impl LeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a lead for this email, or refresh the mutable fields of the
    /// existing row.
    ///
    /// `created_at` and `email` are never touched on conflict; `profile` and
    /// the audit columns take the latest submission's values. Two concurrent
    /// calls for the same email converge on one row: the index arbitrates,
    /// and the loser's insert becomes an update of the winner's row.
    pub async fn find_or_create(
        &self,
        email: &str,
        profile: Option<&str>,
        source_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<Lead, AppError> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO email_leads (email, profile, source_ip, user_agent)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET profile = EXCLUDED.profile,
                source_ip = EXCLUDED.source_ip,
                user_agent = EXCLUDED.user_agent
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(profile)
        .bind(source_ip)
        .bind(user_agent)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(lead)
    }

    /// Overwrite `sync_status`/`sync_detail` with the outcome of the most
    /// recent CRM push. Only the latest attempt is retained.
    pub async fn update_sync_result(
        &self,
        lead_id: Uuid,
        status: SyncStatus,
        detail: Option<&str>,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE email_leads SET sync_status = $2, sync_detail = $3 WHERE id = $1")
                .bind(lead_id)
                .bind(status.as_str())
                .bind(detail)
                .execute(&self.pool)
                .await
                .map_err(AppError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "lead {} vanished before sync result could be stored",
                lead_id
            )));
        }

        Ok(())
    }

    /// Total number of stored leads. Used by the health endpoint as a coarse
    /// connectivity probe.
    pub async fn count_all(&self) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM email_leads")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(row.0)
    }
}
