use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

extern crate pretty_env_logger;
#[macro_use] extern crate log;

use visit_tracker::config::TrackerConfig;
use visit_tracker::models::AppState;
use visit_tracker::{db, web};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    if std::env::var_os("RUST_LOG").is_none() {
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        pretty_env_logger::init();
    }

    let cancel_token = CancellationToken::new();
    let main_cancel_token = cancel_token.clone();

    info!("🚀 Starting visit tracker.");

    let config = TrackerConfig::load()
        .validate()
        .context("Error checking env variables.")?;

    let store = db::connect(&config)
        .await
        .context("Error initializing database pool.")?;
    info!("🗄 Store backend: {}", store.backend());

    match store.init_schema().await {
        Ok(()) => info!("Database tables created successfully"),
        Err(e) => error!("Error initializing database: {:#}", e),
    }

    let listener = tokio::net::TcpListener::bind(config.socket_addr()?)
        .await
        .with_context(|| format!("Error binding {}", config.bind_addr))?;

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal");
        main_cancel_token.cancel();
    });

    let state = Arc::new(AppState { store: store.clone() });
    web::serve(listener, state, cancel_token).await?;

    info!("Graceful Shutdown...");

    store.close().await;

    info!("Database connection closed.");
    Ok(())
}

// Wait Ctrl+C or SIGTERM Docker/OS
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
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
}
