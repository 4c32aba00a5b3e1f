use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;

use crate::db::{visits, Store, Visit};
use crate::models::AppState;

pub const GREETING: &str = "Hello from the visit tracker!";
const UNKNOWN_AGENT: &str = "Unknown";

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum RootResponse {
    Recorded {
        message: String,
        visit_count: i64,
        visit_id: i64,
    },
    Degraded {
        message: String,
        database: String,
        error: String,
    },
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
pub struct VisitsResponse {
    pub visits: Vec<Visit>,
    pub total: i64,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET / — records the visit. Storage problems never change the status
/// code; they are reported in the body instead.
pub async fn root(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> (StatusCode, Json<RootResponse>) {
    info!("Root endpoint accessed");

    let ip_address = peer
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();
    let user_agent = headers
        .get(header::USER_AGENT)
        .map(decode_header)
        .unwrap_or_else(|| UNKNOWN_AGENT.to_string());

    let body = match record_and_count(&state.store, &ip_address, &user_agent).await {
        Ok((visit, visit_count)) => RootResponse::Recorded {
            message: GREETING.to_string(),
            visit_count,
            visit_id: visit.id,
        },
        Err(e) => {
            error!("Database error: {}", e);
            RootResponse::Degraded {
                message: GREETING.to_string(),
                database: "unavailable".to_string(),
                error: e.to_string(),
            }
        }
    };

    (StatusCode::OK, Json(body))
}

/// UTF-8 when valid, otherwise each byte is taken as Latin-1.
fn decode_header(value: &HeaderValue) -> String {
    let bytes = value.as_bytes();
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

async fn record_and_count(store: &Store, ip_address: &str, user_agent: &str) -> anyhow::Result<(Visit, i64)> {
    let visit = visits::record_visit(store, ip_address, user_agent).await?;
    let total = visits::count_visits(store).await?;
    Ok((visit, total))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = match state.store.probe().await {
        Ok(()) => (StatusCode::OK, "healthy".to_string(), "healthy".to_string()),
        Err(e) => {
            error!("Health probe failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "unhealthy".to_string(),
                format!("unhealthy: {}", e),
            )
        }
    };

    let body = HealthResponse {
        status,
        database,
        timestamp: Utc::now(),
    };

    (code, Json(body))
}

/// GET /visits — the latest visits plus the overall total.
pub async fn list_visits(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VisitsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let listing = async {
        let visits = visits::recent_visits(&state.store, visits::RECENT_VISITS_LIMIT).await?;
        let total = visits::count_visits(&state.store).await?;
        anyhow::Ok(VisitsResponse { visits, total })
    };

    listing.await.map(Json).map_err(|e| {
        error!("Error fetching visits: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: e.to_string() }),
        )
    })
}
