use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub app_name: String,
    pub crm_api_base: String,
    /// CRM bearer token. Absence is legal: pushes are then recorded as
    /// skipped instead of attempted.
    pub crm_token: Option<String>,
    /// Identifier of the CRM tag attached to every pushed contact. Absence
    /// is handled like a missing token.
    pub crm_tag_id: Option<String>,
    pub crm_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "lead-capture-api".to_string()),
            crm_api_base: std::env::var("CRM_API_BASE")
                .unwrap_or_else(|_| "https://api.systeme.io".to_string())
                .trim_end_matches('/')
                .to_string(),
            crm_token: std::env::var("CRM_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            crm_tag_id: std::env::var("CRM_TAG_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            crm_timeout_secs: std::env::var("CRM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("CRM_TIMEOUT_SECS must be a valid number"))?,
        };

        if !config.crm_api_base.starts_with("http://") && !config.crm_api_base.starts_with("https://")
        {
            anyhow::bail!("CRM_API_BASE must start with http:// or https://");
        }

        // Log successful configuration load (without sensitive values)
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("CRM API base: {}", config.crm_api_base);
        tracing::debug!("CRM token configured: {}", config.crm_token.is_some());
        tracing::debug!("CRM tag configured: {}", config.crm_tag_id.is_some());
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Per-attempt timeout for CRM pushes.
    pub fn crm_timeout(&self) -> Duration {
        Duration::from_secs(self.crm_timeout_secs)
    }
}
