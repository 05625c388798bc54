use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cleanbot_core::{config::Config, ledger::DedupLedger, stats::RuntimeStats, stats::StatsSnapshot};

#[derive(Clone)]
pub struct StatusState {
    pub cfg: Arc<Config>,
    pub stats: Arc<RuntimeStats>,
    pub ledger: Arc<DedupLedger>,
}

/// Body of `GET /health`. Reports presence of configuration, never values.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime: String,
    pub bot_token_configured: bool,
    pub group_chat_configured: bool,
    pub public_url_configured: bool,
    pub ledger_entries: usize,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `0.0.0.0:{cfg.port}` and serve until `cancel` fires.
pub async fn serve(state: StatusState, cancel: CancellationToken) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    serve_on(listener, state, cancel).await
}

pub async fn serve_on(
    listener: TcpListener,
    state: StatusState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let local_addr = listener
        .local_addr()
        .context("failed to resolve status server address")?;
    info!(addr = %local_addr, "status server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("status server exited unexpectedly")?;
    Ok(())
}

async fn ping() -> impl IntoResponse {
    debug!("received ping");
    ([(header::CONTENT_TYPE, "text/plain")], "pong")
}

async fn health(State(state): State<StatusState>) -> Json<HealthReport> {
    let stats = state.stats.snapshot();
    Json(HealthReport {
        status: "healthy",
        uptime: format_uptime(state.stats.uptime()),
        bot_token_configured: !state.cfg.telegram_bot_token.trim().is_empty(),
        group_chat_configured: state.cfg.target_chat_id.0 != 0,
        public_url_configured: state.cfg.public_url.is_some(),
        ledger_entries: state.ledger.len().await,
        stats,
    })
}

async fn index(State(state): State<StatusState>) -> Html<String> {
    let snap = state.stats.snapshot();
    Html(format!(
        r#"<html>
<head><title>Clean Bot Status</title></head>
<body>
  <h1>Clean Bot is running!</h1>
  <p>Uptime: {uptime}</p>
  <p>Monitoring chat: {chat}</p>
  <p>Delete after: {delay}</p>
  <p>Pending deletions: {pending}</p>
  <p>Deleted so far: {deleted}</p>
</body>
</html>"#,
        uptime = format_uptime(state.stats.uptime()),
        chat = state.cfg.target_chat_id,
        delay = format_uptime(state.cfg.delete_after),
        pending = snap.in_flight_deletions,
        deleted = snap.deleted,
    ))
}

/// `1h2m3s`-style rendering, whole seconds only.
pub fn format_uptime(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use cleanbot_core::domain::{ChatId, MessageId};

    use super::*;

    fn state() -> StatusState {
        let cfg = Config::new("123:secret-token", ChatId(-100));
        StatusState {
            ledger: Arc::new(DedupLedger::new(cfg.ledger_retention())),
            cfg: Arc::new(cfg),
            stats: Arc::new(RuntimeStats::new()),
        }
    }

    async fn get(state: StatusState, uri: &str) -> (StatusCode, String) {
        let resp = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn uptime_is_compact() {
        assert_eq!(format_uptime(Duration::from_secs(5)), "5s");
        assert_eq!(format_uptime(Duration::from_secs(180)), "3m0s");
        assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 61)), "3h1m1s");
    }

    #[tokio::test]
    async fn ping_answers_pong() {
        let (status, body) = get(state(), "/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");
    }

    #[tokio::test]
    async fn health_reports_presence_without_secrets() {
        let st = state();
        st.ledger.try_mark(ChatId(-100), MessageId(1)).await;

        let (status, body) = get(st, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("secret-token"));
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["status"], "healthy");
        assert_eq!(v["bot_token_configured"], true);
        assert_eq!(v["group_chat_configured"], true);
        assert_eq!(v["public_url_configured"], false);
        assert_eq!(v["ledger_entries"], 1);
        assert_eq!(v["in_flight_deletions"], 0);
        assert!(v["uptime"].is_string());
        assert!(v["uptime_secs"].is_u64());
    }

    #[tokio::test]
    async fn index_shows_target_chat_and_delay() {
        let (status, body) = get(state(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Monitoring chat: -100"));
        assert!(body.contains("Delete after: 3m0s"));
        assert!(!body.contains("secret-token"));
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let (status, _) = get(state(), "/admin").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
