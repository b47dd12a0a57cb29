mod rate_limit;

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{ConnectInfo, Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use folio_agents::{SparkieAgent, DEFAULT_SUGGESTIONS, OPENING_MESSAGE, SUGGESTION_ROTATION};
use folio_core::{
    detect_links, render_hint, resolve_profile, segments, IntentKind, LinkSpan, Profile,
    RenderHint, Responder, Segment,
};
use folio_observability::AssistantMetrics;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use crate::rate_limit::{ClientRateLimiter, RateDecision};

const MAX_QUERY_CHARS: usize = 500;
const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub profile_path: Option<PathBuf>,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub allowed_origins: Vec<String>,
    /// Key rate limits on `x-forwarded-for` instead of the socket peer.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            profile_path: None,
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 60,
            allowed_origins: default_origins(),
            trust_forwarded_for: false,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            profile_path: env::var("FOLIO_PROFILE")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            rate_limit_window: env::var("FOLIO_RATE_LIMIT_WINDOW_SECONDS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: env::var("FOLIO_RATE_LIMIT_MAX")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.rate_limit_max),
            allowed_origins: env::var("FOLIO_ALLOWED_ORIGINS")
                .ok()
                .map(|value| parse_origins(&value))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),
            trust_forwarded_for: env::var("FOLIO_TRUST_FORWARDED_FOR")
                .ok()
                .map(|value| parse_flag(&value))
                .unwrap_or(defaults.trust_forwarded_for),
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<SparkieAgent>,
    pub profile: Arc<Profile>,
    pub limiter: ClientRateLimiter,
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("query exceeds {} characters", MAX_QUERY_CHARS)]
    QueryTooLong,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "empty_query",
            Self::QueryTooLong => "query_too_long",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": self.code(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub intent: Option<IntentKind>,
    pub render: RenderHint,
    pub links: Vec<LinkSpan>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    profile: String,
    metrics: folio_observability::MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct SuggestionsResponse {
    greeting: &'static str,
    prompts: &'static [&'static str],
    rotation_ms: u64,
}

pub async fn build_app(config: ApiConfig) -> Result<Router> {
    let profile = resolve_profile(config.profile_path.as_deref())
        .context("failed to load portfolio profile")?;
    let profile = Arc::new(profile);

    let agent = SparkieAgent::new(
        Arc::new(Responder::new(profile.clone())),
        AssistantMetrics::shared(),
    );

    let state = ApiState {
        agent: Arc::new(agent),
        profile,
        limiter: ClientRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        trust_forwarded_for: config.trust_forwarded_for,
    };

    Ok(build_router(state, &config.allowed_origins))
}

pub fn build_router(state: ApiState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/profile", get(profile))
        .route("/v1/suggestions", get(suggestions))
        .route("/v1/chat", post(chat))
        .layer(build_cors_layer(allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
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
        profile: state.profile.name.clone(),
        metrics: state.agent.metrics(),
    };
    (StatusCode::OK, Json(payload))
}

async fn profile(State(state): State<ApiState>) -> Json<Profile> {
    Json((*state.profile).clone())
}

async fn suggestions() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        greeting: OPENING_MESSAGE,
        prompts: DEFAULT_SUGGESTIONS,
        rotation_ms: SUGGESTION_ROTATION.as_millis() as u64,
    })
}

async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.text.chars().count() > MAX_QUERY_CHARS {
        return Err(ApiError::QueryTooLong);
    }
    let query = SparkieAgent::prepare_query(&request.text).ok_or(ApiError::EmptyQuery)?;

    let resolution = state.agent.answer(&query);
    Ok(Json(ChatResponse {
        render: render_hint(&resolution.text),
        links: detect_links(&resolution.text),
        segments: segments(&resolution.text),
        intent: resolution.intent,
        reply: resolution.text,
    }))
}

fn default_origins() -> Vec<String> {
    [
        "http://localhost:5173",
        "http://127.0.0.1:5173",
        "http://localhost:4173",
    ]
    .iter()
    .map(|origin| origin.to_string())
    .collect()
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || !request.uri().path().starts_with("/v1/") {
        return next.run(request).await;
    }

    let ip = request_ip(&request, state.trust_forwarded_for);
    match state.limiter.check(&ip) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            warn!(client = %ip, "rate limited");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate_limited",
                    "message": "rate limit exceeded for this client"
                })),
            )
                .into_response();
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

/// Rate-limit key: the socket peer, or the first forwarded address when the
/// deployment trusts its proxy. Falls back to `local` without connection info.
fn request_ip(request: &Request<Body>, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .flatten();

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}
