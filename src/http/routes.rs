use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::header::{HeaderName, AUTHORIZATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::catalog::{ShotType, TempoCatalog};
use crate::engine::session::{SessionOptions, SessionSnapshot, SessionSummary};
use crate::engine::TrainingController;
use crate::error::{CatalogError, ErrorCode, SessionError};

use super::sse;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct DebugHttpState {
    pub controller: Arc<TrainingController>,
    token: Arc<String>,
    started_at: Instant,
}

impl DebugHttpState {
    pub fn new(controller: Arc<TrainingController>, token: String) -> Self {
        Self {
            controller,
            token: Arc::new(token),
            started_at: Instant::now(),
        }
    }

    fn authorize(
        &self,
        headers: &HeaderMap,
        query_token: Option<&str>,
    ) -> Result<(), HttpServerError> {
        let provided = extract_token(headers, query_token);
        match provided {
            Some(value) if value == *self.token => Ok(()),
            _ => Err(HttpServerError::Unauthorized),
        }
    }
}

/// Query payload for extracting token from URL.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub token: Option<String>,
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    Unauthorized,
    BadRequest(String),
    NotFound(String),
    Unprocessable { code: i32, message: String },
    ServiceUnavailable { code: i32, message: String },
    Internal(String),
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                None,
                "missing or invalid token".to_string(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, None, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, None, msg),
            Self::Unprocessable { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, Some(code), message)
            }
            Self::ServiceUnavailable { code, message } => {
                (StatusCode::SERVICE_UNAVAILABLE, Some(code), message)
            }
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, None, msg),
        };

        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}

impl From<SessionError> for HttpServerError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidTempo(_) => Self::Unprocessable {
                code: err.code(),
                message: err.message(),
            },
            SessionError::AudioDeviceUnavailable { .. } | SessionError::LockPoisoned { .. } => {
                Self::ServiceUnavailable {
                    code: err.code(),
                    message: err.message(),
                }
            }
        }
    }
}

impl From<CatalogError> for HttpServerError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Malformed { .. } => Self::Internal(err.message()),
            _ => Self::NotFound(err.message()),
        }
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub session_active: bool,
    pub uptime_ms: u64,
}

/// Body of `POST /session/start`.
///
/// Either names a catalog professional (`pro`) or gives an explicit tempo
/// (`bpm`, optional `ratio` defaulting to 3.0).
#[derive(Debug, Clone, Deserialize)]
pub struct StartRequest {
    pub shot_type: String,
    #[serde(default)]
    pub pro: Option<String>,
    #[serde(default)]
    pub bpm: Option<u32>,
    #[serde(default)]
    pub ratio: Option<f64>,
    #[serde(default = "default_analyze")]
    pub analyze_swings: bool,
}

fn default_analyze() -> bool {
    true
}

/// Response of `POST /session/stop`.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub summary: Option<SessionSummary>,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: DebugHttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(catalog))
        .route("/session", get(session))
        .route("/session/stream", get(session_stream_handler))
        .route("/session/start", post(start_session))
        .route("/session/stop", post(stop_session))
        .with_state(state)
}

/// Run the HTTP server loop.
pub async fn run_http_server(state: DebugHttpState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding debug HTTP listener")?;
    let router = build_router(state);
    axum::serve(listener, router)
        .await
        .context("serving debug HTTP router")?;
    Ok(())
}

pub async fn health(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<HealthResponse>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;

    Ok(Json(HealthResponse {
        status: "ok",
        session_active: state.controller.is_active(),
        uptime_ms: state.started_at.elapsed().as_millis() as u64,
    }))
}

pub async fn catalog(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<&'static TempoCatalog>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;
    Ok(Json(TempoCatalog::builtin()))
}

pub async fn session(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<SessionSnapshot>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;
    Ok(Json(state.controller.snapshot()))
}

pub async fn session_stream_handler(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<sse::SessionStream, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;
    Ok(sse::session_updates(&state.controller))
}

pub async fn start_session(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
    Json(request): Json<StartRequest>,
) -> Result<Json<SessionSnapshot>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;

    let shot_type: ShotType = request.shot_type.parse()?;
    let options = SessionOptions {
        analyze_swings: request.analyze_swings,
    };

    let controller = Arc::clone(&state.controller);
    // Starting may tear down a previous session and join its threads
    let outcome = match (request.bpm, request.pro) {
        (Some(bpm), pro) => {
            let ratio = request.ratio.unwrap_or(3.0);
            let name = pro.unwrap_or_else(|| "Custom".to_string());
            tokio::task::spawn_blocking(move || {
                controller.start_custom(shot_type, &name, bpm, ratio, options)
            })
            .await
        }
        (None, Some(pro)) => {
            let profile = TempoCatalog::builtin().profile(shot_type, &pro)?;
            tokio::task::spawn_blocking(move || controller.start_training(&profile, options))
                .await
        }
        (None, None) => {
            return Err(HttpServerError::BadRequest(
                "either pro or bpm must be provided".to_string(),
            ))
        }
    };

    outcome.map_err(|err| HttpServerError::Internal(err.to_string()))??;
    Ok(Json(state.controller.snapshot()))
}

pub async fn stop_session(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<StopResponse>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;

    let controller = Arc::clone(&state.controller);
    let summary = tokio::task::spawn_blocking(move || controller.stop_training())
        .await
        .map_err(|err| HttpServerError::Internal(err.to_string()))?;
    Ok(Json(StopResponse { summary }))
}

fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    if let Some(token) = query_token {
        return Some(token.to_string());
    }

    static X_DEBUG_TOKEN: HeaderName = HeaderName::from_static("x-debug-token");

    headers
        .get(&X_DEBUG_TOKEN)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| raw.strip_prefix("Bearer ").map(|v| v.to_string()))
        })
}

#[cfg(all(test, feature = "debug_http"))]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::Value;
    use tokio::runtime::Handle;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::preferences::MemoryPreferenceStore;
    use crate::testing::FakeBackend;

    const TOKEN: &str = "smoke-token";

    fn make_router() -> Router {
        let controller = Arc::new(TrainingController::new(
            Arc::new(FakeBackend::new(44_100)),
            AppConfig::default(),
            Arc::new(MemoryPreferenceStore::default()),
            Handle::current(),
        ));
        build_router(DebugHttpState::new(controller, TOKEN.to_string()))
    }

    async fn response_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let json = serde_json::from_slice::<Value>(&bytes).expect("JSON body");
        (status, json)
    }

    fn post_json(uri: String, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("post request")
    }

    #[tokio::test]
    async fn health_requires_token() {
        let (status, json) = response_json(
            make_router()
                .oneshot(
                    Request::builder()
                        .uri("/health")
                        .body(Body::empty())
                        .expect("health request"),
                )
                .await
                .expect("health call"),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "missing or invalid token");
    }

    #[tokio::test]
    async fn health_succeeds_with_bearer_token() {
        let (status, json) = response_json(
            make_router()
                .oneshot(
                    Request::builder()
                        .uri("/health")
                        .header("authorization", format!("Bearer {TOKEN}"))
                        .body(Body::empty())
                        .expect("health request"),
                )
                .await
                .expect("health call"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["session_active"], false);
    }

    #[tokio::test]
    async fn start_and_stop_catalog_session() {
        let router = make_router();

        let (status, json) = response_json(
            router
                .clone()
                .oneshot(post_json(
                    format!("/session/start?token={TOKEN}"),
                    serde_json::json!({
                        "shot_type": "putting",
                        "pro": "tiger woods",
                        "analyze_swings": false
                    }),
                ))
                .await
                .expect("start call"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["active"], true);
        assert_eq!(json["pro_name"], "Tiger Woods");
        assert_eq!(json["bpm"], 76);

        let (status, json) = response_json(
            router
                .oneshot(post_json(
                    format!("/session/stop?token={TOKEN}"),
                    serde_json::json!({}),
                ))
                .await
                .expect("stop call"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["summary"]["pro_name"], "Tiger Woods");
    }

    #[tokio::test]
    async fn unknown_pro_is_not_found() {
        let (status, _json) = response_json(
            make_router()
                .oneshot(post_json(
                    format!("/session/start?token={TOKEN}"),
                    serde_json::json!({ "shot_type": "long_game", "pro": "Nobody" }),
                ))
                .await
                .expect("start call"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_tempo_is_unprocessable() {
        let (status, json) = response_json(
            make_router()
                .oneshot(post_json(
                    format!("/session/start?token={TOKEN}"),
                    serde_json::json!({ "shot_type": "long", "bpm": 0 }),
                ))
                .await
                .expect("start call"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], 3001);
    }

    #[tokio::test]
    async fn unschedulable_ratio_is_unprocessable() {
        let (status, json) = response_json(
            make_router()
                .oneshot(post_json(
                    format!("/session/start?token={TOKEN}"),
                    serde_json::json!({ "shot_type": "long_game", "bpm": 1, "ratio": 1e20 }),
                ))
                .await
                .expect("start call"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], 3001);
    }

    #[tokio::test]
    async fn idle_session_snapshot() {
        let (status, json) = response_json(
            make_router()
                .oneshot(
                    Request::builder()
                        .uri(format!("/session?token={TOKEN}"))
                        .body(Body::empty())
                        .expect("session request"),
                )
                .await
                .expect("session call"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["active"], false);
        assert_eq!(json["phase"], "Idle");
        assert_eq!(json["feedback"], "Waiting");
    }
}
