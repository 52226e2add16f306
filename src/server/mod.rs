//! HTTP server for issue-planner.
//!
//! Exposes the issue store and the configured LLM client over a small
//! REST API. Handlers live in [`api`].

pub mod api;

use crate::client::LlmClient;
use crate::models::{PlannerError, Result, ServerConfig};
use crate::store::IssueStore;
use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderValue, Method};
use axum::response::{Html, Response};
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Span, debug, error, info, info_span, warn};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Issue Planner</title>
</head>
<body>
    <h1>Issue Planner</h1>
    <p>In-memory issue service with LLM analysis and planning.</p>
    <ul>
        <li><code>POST /events</code> create an issue</li>
        <li><code>GET /issues</code> list issues</li>
        <li><code>GET /issues/{id}</code> fetch an issue</li>
        <li><code>PUT /issues/{id}</code> update an issue</li>
        <li><code>DELETE /issues/{id}</code> delete an issue</li>
        <li><code>POST /analyze/{id}</code> analyze an issue</li>
        <li><code>POST /plan/{id}</code> plan an issue</li>
    </ul>
</body>
</html>
"#;

/// Shared state accessible from every handler.
pub struct AppState {
    /// Issue collection
    pub store: IssueStore,

    /// Client used for analysis and planning
    pub llm: Arc<dyn LlmClient>,
}

impl AppState {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            store: IssueStore::new(),
            llm,
        }
    }
}

/// Build the router with all routes registered.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            info_span!("http", method = %request.method(), uri = %request.uri())
        })
        .on_request(())
        .on_response(log_response)
        .on_failure(());

    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/events", post(api::create_issue))
        .route("/issues", get(api::list_issues))
        .route(
            "/issues/{id}",
            get(api::get_issue)
                .put(api::update_issue)
                .delete(api::delete_issue),
        )
        .route("/analyze/{id}", post(api::analyze_issue))
        .route("/plan/{id}", post(api::plan_issue))
        .layer(cors)
        .layer(trace)
        .with_state(state)
}

/// Log a finished request: error for 5xx, warn for 4xx, debug otherwise.
fn log_response(response: &Response, latency: Duration, _span: &Span) {
    let status = response.status().as_u16();
    let latency_ms = latency.as_millis() as u64;

    if response.status().is_server_error() {
        error!(status, latency_ms, "request completed");
    } else if response.status().is_client_error() {
        warn!(status, latency_ms, "request completed");
    } else {
        debug!(status, latency_ms, "request completed");
    }
}

/// Bind the listener and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> Result<()> {
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PlannerError::io(format!("Failed to bind {addr}"), e))?;

    info!(addr = %addr, provider = %state.llm.provider(), "Starting HTTP server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .map_err(|e| PlannerError::io("HTTP server failed", e))
}
