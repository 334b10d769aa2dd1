use crate::config::Config;
use crate::errors::AppError;
use crate::ingestion::IngestionService;
use crate::lead_store::LeadStore;
use crate::models::{RequestMeta, SubmitEmailRequest};
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead storage, shared with the ingestion service.
    pub store: LeadStore,
    /// The submission pipeline behind POST /submit-email.
    pub ingestion: IngestionService,
    /// Application configuration.
    pub config: Config,
}

/// Best-effort client address: first `X-Forwarded-For` entry when a proxy
/// provides one, otherwise the socket peer. Anything that does not parse as
/// an IP address is dropped rather than stored.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let candidate = match forwarded {
        Some(ip) => ip.to_string(),
        None => peer?.ip().to_string(),
    };

    candidate.parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

/// POST /submit-email
///
/// Accepts `{email, profile?}`, captures the lead, and answers
/// `{"ok": true}` for any syntactically valid email regardless of how the
/// CRM push went. Validation failures answer 400 with a machine-readable
/// code.
pub async fn submit_email(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<SubmitEmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let meta = RequestMeta {
        source_ip: client_ip(&headers, Some(peer)),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    };

    state
        .ingestion
        .submit(
            payload.email.as_deref().unwrap_or(""),
            payload.profile.as_deref(),
            &meta,
        )
        .await?;

    Ok(Json(json!({ "ok": true })))
}

/// GET /healthz
///
/// Process liveness plus a coarse storage connectivity signal. Storage
/// failure degrades the `db` field instead of failing the response, so a
/// platform probe does not restart a process that is merely cut off from
/// Postgres.
pub async fn healthz(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (db, leads) = match state.store.count_all().await {
        Ok(count) => ("connected", Some(count)),
        Err(e) => {
            tracing::warn!("Health check: storage unreachable: {}", e);
            ("disconnected", None)
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "app": state.config.app_name,
            "time": Utc::now().to_rfc3339(),
            "db": db,
            "leads": leads,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.7:55000".parse().unwrap())
    }

    #[test]
    fn forwarded_header_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, peer()), Some("203.0.113.9".to_string()));
    }

    #[test]
    fn falls_back_to_peer_address() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer()), Some("10.0.0.7".to_string()));
    }

    #[test]
    fn garbage_forwarded_value_is_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_ip(&headers, peer()), None);
    }

    #[test]
    fn no_peer_and_no_header_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, None), None);
    }
}
