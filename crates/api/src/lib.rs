mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use reqwest::Client;
use scout_agents::{
    Dispatcher, KeywordRouter, ModelClient, ModelConfig, ModelPolicy, ModelRouter, Planner,
    RulePolicy, TurnExecutor, TurnRouter,
};
use scout_core::{ChatInput, ResponderRegistry, ToolInvocation, TurnError};
use scout_observability::AppMetrics;
use scout_providers::{ProviderConfig, ProviderRegistry};
use scout_storage::Store;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::rate_limit::IpRateLimiter;

type Executor = TurnExecutor<Planner, ProviderRegistry, Store>;

#[derive(Clone)]
pub struct ApiState {
    pub executor: Arc<Executor>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: scout_observability::MetricsSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatRequest {
    session_id: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    responder: &'static str,
    reasoning: String,
    invocations: Vec<ToolInvocation>,
    response: String,
}

pub async fn build_app() -> Result<Router> {
    let metrics = AppMetrics::shared();

    let http = Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(5))
        .build()
        .context("failed to build HTTP client")?;

    let providers = Arc::new(ProviderRegistry::new(
        http.clone(),
        ProviderConfig::from_env(),
    ));
    let registry = Arc::new(ResponderRegistry::standard());

    let (router, planner) = match ModelConfig::from_env() {
        Some(config) => {
            let client = ModelClient::new(http, config);
            (
                TurnRouter::Model(ModelRouter::new(client.clone())),
                Planner::Model(ModelPolicy::new(client)),
            )
        }
        None => (
            TurnRouter::Keyword(KeywordRouter),
            Planner::Rules(RulePolicy),
        ),
    };

    let store = if let Ok(database_url) = env::var("SCOUT_DATABASE_URL") {
        Store::sqlite(&database_url).await?
    } else {
        Store::memory()
    };

    let executor = Arc::new(TurnExecutor::new(
        Dispatcher::new(registry, router),
        planner,
        providers,
        Arc::new(store),
        metrics.clone(),
    ));

    let api_key = env::var("SCOUT_API_KEY").unwrap_or_else(|_| "dev-scout-key".to_string());
    let rate_limit_window = Duration::from_secs(
        env::var("SCOUT_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60),
    );
    let rate_limit_max = env::var("SCOUT_RATE_LIMIT_MAX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(80);

    let state = ApiState {
        executor,
        metrics,
        api_key,
        limiter: IpRateLimiter::new(rate_limit_window, rate_limit_max),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(32 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(payload))
}

async fn chat(State(state): State<ApiState>, Json(request): Json<ChatRequest>) -> Response {
    if request.message.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "empty_message",
                "message": "message must not be empty"
            })),
        )
            .into_response();
    }

    let input = ChatInput {
        session_id: request.session_id,
        message: request.message,
    };

    match state.executor.handle_turn(input).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ChatResponse {
                session_id: outcome.session_id,
                responder: outcome.responder,
                reasoning: outcome.result.reasoning,
                invocations: outcome.result.invocations,
                response: outcome.result.response,
            }),
        )
            .into_response(),
        Err(TurnError::MalformedOutput(detail)) => {
            error!(%detail, "responder output malformed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({
                    "error": "responder_output_malformed",
                    "message": "assistant failed to produce a structured reply"
                })),
            )
                .into_response()
        }
        Err(TurnError::Unhandled(cause)) => {
            error!(error = %cause, "turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "turn_failed",
                    "message": "assistant failed to process the request"
                })),
            )
                .into_response()
        }
    }
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if request.method() == Method::OPTIONS || is_public_endpoint(path.as_str()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this IP"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
