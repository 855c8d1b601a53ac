//! HTTP status/control API
//!
//! Routes:
//! - `GET /status`   current power, mute and source
//! - `POST /status`  apply `Power`, `Mute` and `Source` in that order
//! - `POST /source`  select an input
//! - `GET /version`  protocol and firmware versions reported by the device
//! - `GET /health`   liveness, never authenticated

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use cxa_core::DeviceState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::auth::{require_basic_auth, BasicAuth};
use crate::{Amplifier, BridgeError, Result};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Listen address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable permissive CORS
    #[serde(default)]
    pub cors_enabled: bool,
    /// Require HTTP Basic credentials on everything but `/health`
    #[serde(default)]
    pub auth: Option<BasicAuth>,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_enabled: false,
            auth: None,
        }
    }
}

/// Shared state for HTTP handlers
#[derive(Clone)]
struct AppState {
    amp: Amplifier,
}

/// Body of `POST /status` and `POST /source`.
///
/// Field names match case-insensitively (`Power`, `power`, `POWER`).
/// Missing or null fields are empty and leave that setting alone; other
/// fields are ignored.
#[derive(Debug, Default, PartialEq, Eq)]
struct ControlRequest {
    power: String,
    mute: String,
    source: String,
}

impl ControlRequest {
    fn from_json(body: &[u8]) -> std::result::Result<Self, String> {
        let fields: Map<String, Value> =
            serde_json::from_slice(body).map_err(|e| e.to_string())?;

        let mut req = Self::default();
        for (name, value) in fields {
            let slot = match name.to_ascii_lowercase().as_str() {
                "power" => &mut req.power,
                "mute" => &mut req.mute,
                "source" => &mut req.source,
                _ => continue,
            };
            *slot = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => return Err(format!("{} must be a string, got {}", name, other)),
            };
        }
        Ok(req)
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    state: DeviceState,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    errors: BTreeMap<&'static str, String>,
}

/// Build the API router
pub fn build_router(amp: Amplifier, config: &HttpServerConfig) -> Router {
    let mut control = Router::new()
        .route("/status", get(get_status).post(post_status))
        .route("/source", post(post_source))
        .route("/version", get(get_version));

    if let Some(auth) = &config.auth {
        control = control.route_layer(middleware::from_fn_with_state(
            Arc::new(auth.clone()),
            require_basic_auth,
        ));
    }

    let mut router = Router::new()
        .route("/health", get(health_check))
        .merge(control)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { amp });

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}

fn parse_body(body: &[u8]) -> std::result::Result<ControlRequest, Response> {
    ControlRequest::from_json(body).map_err(|e| {
        warn!("Rejecting request body: {}", e);
        (StatusCode::BAD_REQUEST, e).into_response()
    })
}

fn error_response(e: &BridgeError) -> Response {
    let status = if e.is_invalid_argument() {
        StatusCode::BAD_REQUEST
    } else {
        error!("Command failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, e.to_string()).into_response()
}

// HTTP Handlers

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.amp.snapshot())
}

async fn get_version(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.amp.info())
}

async fn post_status(State(state): State<AppState>, body: Bytes) -> Response {
    let req = match parse_body(&body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    let amp = &state.amp;
    let mut errors = BTreeMap::new();

    if let Err(e) = amp.set_power(&req.power).await {
        warn!("Power change failed: {}", e);
        errors.insert("power", e.to_string());
    }
    if let Err(e) = amp.set_mute(&req.mute).await {
        warn!("Mute change failed: {}", e);
        errors.insert("mute", e.to_string());
    }
    if let Err(e) = amp.set_source(&req.source).await {
        warn!("Source change failed: {}", e);
        errors.insert("source", e.to_string());
    }

    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = StatusResponse {
        state: amp.snapshot(),
        errors,
    };
    (status, Json(body)).into_response()
}

async fn post_source(State(state): State<AppState>, body: Bytes) -> Response {
    let req = match parse_body(&body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    match state.amp.set_source(&req.source).await {
        Ok(_) => Json(state.amp.snapshot()).into_response(),
        Err(e) => error_response(&e),
    }
}

/// HTTP server bound to an [`Amplifier`]
pub struct HttpServer {
    config: HttpServerConfig,
    amp: Amplifier,
    running: Arc<Mutex<bool>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl HttpServer {
    pub fn new(amp: Amplifier, config: HttpServerConfig) -> Self {
        Self {
            config,
            amp,
            running: Arc::new(Mutex::new(false)),
            shutdown_tx: None,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }

    /// Bind and start serving. Returns the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.is_running() {
            return Err(BridgeError::Other("HTTP server already running".to_string()));
        }

        let listener = tokio::net::TcpListener::bind(&self.config.bind)
            .await
            .map_err(|e| BridgeError::Config(format!("Bind {} failed: {}", self.config.bind, e)))?;
        let addr = listener.local_addr()?;

        let router = build_router(self.amp.clone(), &self.config);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let running = self.running.clone();
        *running.lock() = true;

        self.task = Some(tokio::spawn(async move {
            info!("HTTP server listening on {}", addr);

            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;

            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }

            *running.lock() = false;
            info!("HTTP server stopped");
        }));

        Ok(addr)
    }

    /// Stop accepting requests and wait for in-flight ones to finish
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| BridgeError::Other(format!("HTTP server task failed: {}", e)))?;
        }
        *self.running.lock() = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AmplifierConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use cxa_transport::{MemoryDevice, MemoryTransport};
    use tower::ServiceExt;

    fn app(config: &HttpServerConfig) -> (Router, Amplifier, MemoryDevice) {
        let (sender, _receiver, device) = MemoryTransport::pair();
        let amp = Amplifier::new(sender, AmplifierConfig::default());
        (build_router(amp.clone(), config), amp, device)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_status_initial() {
        let (router, _amp, _device) = app(&HttpServerConfig::default());

        let resp = router
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"power": false, "mute": false, "source": ""})
        );
    }

    #[tokio::test]
    async fn test_post_status_lowercase_fields() {
        let (router, _amp, mut device) = app(&HttpServerConfig::default());

        let resp = router
            .oneshot(post_json("/status", r#"{"power":"on","source":"D2"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"power": true, "mute": false, "source": "D2"})
        );
        assert_eq!(
            device.drain_writes(),
            vec![Bytes::from_static(b"#01,02,1\r"), Bytes::from_static(b"#03,04,05\r")]
        );
    }

    #[tokio::test]
    async fn test_post_status_reports_field_errors() {
        let (router, amp, _device) = app(&HttpServerConfig::default());
        amp.set_power("on").await.unwrap();

        let resp = router
            .oneshot(post_json("/status", r#"{"Mute":"loud","Source":"A3"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["source"], "A3");
        assert_eq!(body["mute"], false);
        assert!(body["errors"]["mute"]
            .as_str()
            .unwrap()
            .contains("Unexpected mute state loud"));
        assert!(body["errors"].get("source").is_none());
    }

    #[test]
    fn test_control_request_field_case() {
        let body = br#"{"POWER":"on","mute":"off","SoUrCe":"A2"}"#;
        let req = ControlRequest::from_json(body).unwrap();
        assert_eq!(
            req,
            ControlRequest {
                power: "on".into(),
                mute: "off".into(),
                source: "A2".into(),
            }
        );

        let req = ControlRequest::from_json(br#"{"Power":null,"Volume":"11"}"#).unwrap();
        assert_eq!(req, ControlRequest::default());

        assert!(ControlRequest::from_json(br#"{"Power":true}"#).is_err());
        assert!(ControlRequest::from_json(br#"["on"]"#).is_err());
    }

    #[tokio::test]
    async fn test_post_status_uppercase_fields() {
        let (router, _amp, mut device) = app(&HttpServerConfig::default());

        let resp = router
            .oneshot(post_json("/status", r#"{"POWER":"on"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["power"], true);
        assert_eq!(device.drain_writes(), vec![Bytes::from_static(b"#01,02,1\r")]);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (router, _amp, _device) = app(&HttpServerConfig::default());

        let resp = router.oneshot(post_json("/source", "{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_source_is_bad_request() {
        let (router, _amp, mut device) = app(&HttpServerConfig::default());

        let resp = router
            .oneshot(post_json("/source", r#"{"Source":"A9"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let text = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&text[..], b"Unknown source: A9");
        assert!(device.drain_writes().is_empty());
    }

    #[tokio::test]
    async fn test_source_write_failure_is_server_error() {
        let (router, amp, device) = app(&HttpServerConfig::default());
        device.set_connected(false);

        let resp = router
            .oneshot(post_json("/source", r#"{"Source":"USB"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(amp.snapshot(), DeviceState::default());
    }

    #[tokio::test]
    async fn test_auth_guards_control_routes_only() {
        let auth = BasicAuth::new("admin", "hunter2");
        let config = HttpServerConfig {
            auth: Some(auth.clone()),
            ..Default::default()
        };
        let (router, _amp, _device) = app(&config);

        let resp = router
            .clone()
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

        let resp = router
            .clone()
            .oneshot(
                Request::get("/status")
                    .header(header::AUTHORIZATION, auth.header_value())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_version_route() {
        let (router, amp, _device) = app(&HttpServerConfig::default());
        amp.store()
            .apply_reply(&cxa_core::Reply::new("14", "02", "v104-a-105"));

        let resp = router
            .oneshot(Request::get("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"protocol": "", "firmware": "v104-a-105"})
        );
    }
}
