use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use log::info;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::models::AppState;

pub mod handlers;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/visits", get(handlers::list_visits))
        .with_state(state)
}

/// Serves the tracker on `listener` until `cancel` fires.
pub async fn serve(listener: TcpListener, state: Arc<AppState>, cancel: CancellationToken) -> Result<()> {
    let address = listener.local_addr().context("Listener has no local address")?;
    info!("✅ Listening on http://{}", address);

    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            info!("Exiting HTTP server");
        })
        .await
        .context("HTTP server failed unexpectedly")
}
