//! Axum-based HTTP server for the API.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request},
    http::HeaderValue,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use oneul_core::{config::ServerConfig, Error, Result};

use crate::analyze::{analyze_handler, analyze_upload_handler};
use crate::audio::AudioProcessor;
use crate::context::{context_handler, context_upload_handler};
use crate::vision::VisionProcessor;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
    /// Request body limit, covering multipart uploads.
    pub max_upload_bytes: usize,
    /// CORS origins; `*` allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for GatewayConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            enable_cors: true,
            enable_tracing: true,
            max_upload_bytes: config.max_upload_bytes,
            allowed_origins: config.allowed_origins.clone(),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Image emotion analysis.
    pub vision: VisionProcessor,
    /// Audio retrieval and shout detection.
    pub audio: AudioProcessor,
}

/// API server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
    metrics_handle: Option<PrometheusHandle>,
}

impl GatewayServer {
    /// Create a new server.
    pub fn new(config: GatewayConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
            metrics_handle: None,
        }
    }

    /// Expose `/metrics` and record per-request metrics.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Build the router.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/context", post(context_handler))
            .route("/context/", post(context_handler))
            .route("/context/upload", post(context_upload_handler))
            .route("/analyze", post(analyze_handler))
            .route("/analyze/", post(analyze_handler))
            .route("/analyze/upload", post(analyze_upload_handler))
            .with_state(self.state.clone());

        if let Some(handle) = self.metrics_handle.clone() {
            router = router
                .route("/metrics", get(move || async move { handle.render() }))
                .layer(middleware::from_fn(track_metrics));
        }

        router = router.layer(DefaultBodyLimit::max(self.config.max_upload_bytes));

        if self.config.enable_cors {
            router = router.layer(self.cors_layer());
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins = &self.config.allowed_origins;
        let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowOrigin::from(Any)
        } else {
            AllowOrigin::list(
                origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok()),
            )
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any)
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::internal(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!(addr = %addr, "Oneuleun AI API starting");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// Service banner.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub status: &'static str,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status.
    pub status: &'static str,
    /// Version.
    pub version: &'static str,
}

async fn root_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "Oneuleun AI API",
        status: "running",
    })
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    oneul_governance::track_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
