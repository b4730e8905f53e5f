//! Storybook PDF Service
//!
//! HTTP microservice that renders personalized children's books to PDF
//! with a headless Chromium process.

use std::net::SocketAddr;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storybook_pdf_service::config::Config;
use storybook_pdf_service::{app, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storybook_pdf_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let state = AppState::new(Config::from_env());
    let config = state.config();

    tracing::info!(
        "Starting Storybook PDF Service v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Chromium path: {}", config.browser.executable_path.display());
    if config.assets.hot_reload {
        tracing::info!("Template hot reload enabled");
    }

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .unwrap_or_else(|_| [0, 0, 0, 0].into());
    let addr = SocketAddr::from((host, config.server.port));

    // Preload templates so broken asset directories show up at boot, not
    // on the first render.
    match state.assets().templates().await {
        Ok(templates) => tracing::info!("Loaded {} PDF templates", templates.len()),
        Err(e) => tracing::warn!("Template preload failed: {}", e),
    }

    let app = app(state);

    tracing::info!("Storybook PDF Service listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    tracing::info!("Server shutdown complete");
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
