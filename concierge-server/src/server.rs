use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};
use concierge_rag::{AgentResult, ConciergeAgent, Settings};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::ApiError;

/// Name reported by the health check.
pub const DEFAULT_SERVICE_NAME: &str = "Bhils Kabeela AI Agent";

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<ConciergeAgent>,
    pub service: String,
}

impl AppState {
    pub fn new(agent: ConciergeAgent) -> Self {
        Self { agent: Arc::new(agent), service: DEFAULT_SERVICE_NAME.to_string() }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 3000 }
    }
}

impl From<&Settings> for ServerConfig {
    fn from(settings: &Settings) -> Self {
        Self { host: settings.host.clone(), port: settings.port }
    }
}

/// Install the `fmt` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/ask", post(ask))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for concierge server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("concierge listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("concierge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({"status": "ok", "service": state.service}))
}

/// Pull a non-empty `question` string out of an arbitrary JSON body.
fn question_from(payload: Result<Json<Value>, JsonRejection>) -> Result<String, ApiError> {
    let Ok(Json(body)) = payload else {
        return Err(ApiError::Validation);
    };
    match body.get("question").and_then(Value::as_str) {
        Some(question) if !question.is_empty() => Ok(question.to_string()),
        _ => Err(ApiError::Validation),
    }
}

async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AgentResult>, ApiError> {
    let question = question_from(payload)?;
    debug!(question_len = question.len(), "ask received");
    let result = state.agent.ask(&question).await?;
    Ok(Json(result))
}
