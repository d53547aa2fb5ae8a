//! Application builder and server runner.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use relay_core::config::AppConfig;
use relay_core::error::{AppError, ErrorKind};
use relay_core::result::AppResult;

use crate::handlers::static_page::StaticPage;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(request_logging))
}

/// Binds the configured address and runs until Ctrl-C / SIGTERM.
///
/// A bind failure is returned as an error; it is the only startup failure
/// after configuration is loaded.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    let page = StaticPage::load(&config.static_page).await?;
    let state = AppState::new(config, page);

    let addr = state.config.bind_address();
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Connection,
            format!("Failed to bind {addr}: {e}"),
            e,
        )
    })?;

    serve(listener, state, shutdown_signal()).await
}

/// Serves on `listener` until `shutdown` resolves, then closes every
/// WebSocket connection.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let realtime = Arc::clone(&state.realtime);
    let app = build_app(state);

    let addr = listener.local_addr()?;
    tracing::info!("Echo relay listening on http://{}", addr);

    let on_shutdown = Arc::clone(&realtime);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            // Upgraded sockets outlive HTTP graceful shutdown; close them here.
            on_shutdown.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    realtime.shutdown();
    tracing::info!("Echo relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
