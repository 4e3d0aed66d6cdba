use crate::config::Config;
use crate::generator::{KeywordTagGenerator, TagGenerator};
use crate::handlers::{api_status, generate_tags, get_stats, health_check, root, AppState};
use crate::middleware::logging_middleware;
use crate::rate_limiter::LimiterPolicy;
use crate::service::TagService;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router around the shared state.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        // Tagging API
        .route("/", get(root))
        .route("/api/generate-tags", post(generate_tags))
        .route("/api/status", get(api_status))
        // Health and statistics endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(logging_middleware)),
        )
}

pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Assemble the service. A generator that fails to load leaves the
    /// server running degraded: probes stay up, tagging returns errors.
    pub fn new(config: Config) -> Self {
        let generator: Option<Arc<dyn TagGenerator>> = match KeywordTagGenerator::load() {
            Ok(generator) => {
                tracing::info!("Keyword tag generator initialized");
                Some(Arc::new(generator))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize tag generator, starting degraded");
                None
            }
        };

        let service = TagService::new(
            LimiterPolicy::default(),
            generator,
            config.generation_timeout,
        );
        let state = AppState::new(service);

        Self { config, state }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.state
            .service
            .limiter()
            .spawn_idle_eviction(self.config.cleanup_interval);

        let app = create_app(self.state);
        let listener = tokio::net::TcpListener::bind(self.config.bind_address()).await?;

        tracing::info!("tagx server starting on port {}", self.config.port);
        tracing::info!("Tag generation available at POST /api/generate-tags");
        tracing::info!("Health check available at /health");

        // Run server with graceful shutdown
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
