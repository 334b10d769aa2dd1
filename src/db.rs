use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct Database {
    pub pool: PgPool,
}

/// Bootstrap DDL for the leads table. The unique index on `email` is the
/// arbiter for concurrent submissions of the same address.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS email_leads (
    id          UUID        PRIMARY KEY DEFAULT gen_random_uuid(),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    email       TEXT        NOT NULL,
    profile     TEXT,
    source_ip   TEXT,
    user_agent  TEXT,
    sync_status TEXT        NOT NULL DEFAULT 'not_attempted',
    sync_detail TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS email_leads_email_key ON email_leads (email);
"#;

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        // Create the leads table on first boot; no-op afterwards.
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }
}
