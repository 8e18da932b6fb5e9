//! HTTP API
//!
//! - GET  /api/health     liveness probe
//! - GET  /api/captions   fetch a caption track (`videoUrl`, `lang`)
//! - POST /api/translate  batch-translate texts (`texts`, `targetLang`, `sourceLang`)

pub mod error;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{LivecapError, Result};
use crate::workflow::Workflow;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Shared state handed to every handler
pub struct AppState {
    pub workflow: Workflow,
    pub default_lang: String,
    pub default_target: String,
    pub default_source: String,
}

impl AppState {
    pub fn new(workflow: Workflow, config: &Config) -> Self {
        Self {
            workflow,
            default_lang: config.captions.default_lang.clone(),
            default_target: config.translate.default_target.clone(),
            default_source: config.translate.default_source.clone(),
        }
    }
}

pub struct HttpServer {
    addr: String,
    cors_origin: String,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: &Config, state: AppState) -> Self {
        Self {
            addr: config.server.addr(),
            cors_origin: config.server.cors_origin.clone(),
            state: Arc::new(state),
        }
    }

    fn cors_layer(&self) -> Result<CorsLayer> {
        let origin = if self.cors_origin.trim() == "*" {
            AllowOrigin::any()
        } else {
            let value = HeaderValue::from_str(self.cors_origin.trim()).map_err(|e| {
                LivecapError::Config(format!("Invalid CORS origin {:?}: {}", self.cors_origin, e))
            })?;
            AllowOrigin::exact(value)
        };

        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
            .max_age(Duration::from_secs(3600)))
    }

    pub fn build_router(&self) -> Result<Router> {
        let api = Router::new()
            .route("/health", get(handlers::health))
            .route("/captions", get(handlers::get_captions))
            .route("/translate", post(handlers::translate));

        Ok(Router::new()
            .nest("/api", api)
            .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
            .layer(TraceLayer::new_for_http())
            .layer(self.cors_layer()?)
            .with_state(self.state.clone()))
    }

    /// Serve until `shutdown_signal` resolves
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router()?;

        info!("Starting HTTP server on {}", self.addr);

        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}
