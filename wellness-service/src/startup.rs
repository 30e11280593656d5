//! Application startup and lifecycle management.
//!
//! Composes the five analysis routers with the probe and metrics routes
//! behind the shared request-id, tracing and metrics middleware.

use crate::config::WellnessConfig;
use crate::handlers;
use crate::services::providers::openrouter::OpenRouterProvider;
use crate::services::providers::ChatProvider;
use crate::services::AnalysisService;
use axum::{body::Body, middleware, Router};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{http_request_span, request_id_middleware};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: WellnessConfig,
    pub analysis: AnalysisService,
    /// Whether a model credential is present. Reported by the readiness probe.
    pub provider_configured: bool,
}

/// The gateway: every endpoint group under one router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::health::router())
        .merge(handlers::event::router())
        .merge(handlers::meal::router())
        .merge(handlers::daily::router())
        .merge(handlers::health_analysis::router())
        .merge(handlers::coach::router())
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(http_request_span::<Body>))
        .layer(middleware::from_fn(request_id_middleware))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application against the configured OpenRouter endpoint.
    pub async fn build(config: WellnessConfig) -> Result<Self, AppError> {
        let provider = OpenRouterProvider::new(&config.openrouter).map_err(|e| {
            tracing::error!("Failed to initialize model provider: {}", e);
            AppError::InternalError(anyhow::anyhow!(e))
        })?;
        let provider_configured = provider.is_configured();

        if provider_configured {
            tracing::info!(
                base_url = %config.openrouter.base_url,
                analysis_model = %config.models.analysis_model,
                coach_model = %config.models.coach_model,
                "Initialized OpenRouter provider"
            );
        } else {
            tracing::warn!("OPENROUTER_API_KEY is not set; model calls will fail until it is");
        }

        Self::with_provider(config, Arc::new(provider), provider_configured).await
    }

    /// Build the application around an existing provider.
    pub async fn with_provider(
        config: WellnessConfig,
        provider: Arc<dyn ChatProvider>,
        provider_configured: bool,
    ) -> Result<Self, AppError> {
        let analysis = AnalysisService::new(
            provider,
            config.models.clone(),
            config.image.clone(),
        );

        let state = AppState {
            config: config.clone(),
            analysis,
            provider_configured,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Wellness service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Serve until `signal` resolves, then let in-flight requests finish.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}
