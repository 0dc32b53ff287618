//! HTTP endpoint serving rendered price charts

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Duration, Utc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use crate::services::ChartService;
use crate::utils::errors::ChartError;

#[derive(Clone)]
pub struct WebState {
    charts: Arc<ChartService>,
    grace_period: Duration,
}

impl WebState {
    pub fn new(charts: Arc<ChartService>, grace_period: Duration) -> Self {
        Self { charts, grace_period }
    }
}

pub fn build_router(state: WebState) -> Router {
    Router::new()
        .route("/wow-token/chart/:unit/:period", get(handle_chart))
        .with_state(state)
}

/// Bind `addr` and serve until `cancel` fires
pub async fn serve(addr: &str, state: WebState, cancel: CancellationToken) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

pub fn error_status(error: &ChartError) -> StatusCode {
    match error {
        ChartError::InvalidUnit(_) => StatusCode::NOT_FOUND,
        ChartError::InvalidPeriod(_) | ChartError::PeriodOutOfRange { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Seconds a client may cache a chart, and its Last-Modified value
pub fn cache_headers(last_updated: DateTime<Utc>, grace_period: Duration, now: DateTime<Utc>) -> (i64, String) {
    let max_age = (last_updated + grace_period - now).num_seconds().max(0);
    let last_modified = last_updated.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    (max_age, last_modified)
}

async fn handle_chart(State(state): State<WebState>, Path((unit, period)): Path<(String, String)>) -> Response {
    let chart = match state.charts.render_price_chart(&unit, &period).await {
        Ok(chart) => chart,
        Err(e) => {
            if e.is_validation() {
                warn!("Rejected chart request {} {}: {}", period, unit, e);
            } else {
                error!("Failed to render chart for {} {}: {}", period, unit, e);
            }
            let status = error_status(&e);
            return (status, e.to_string()).into_response();
        }
    };

    let (max_age, last_modified) = cache_headers(chart.last_updated, state.grace_period, Utc::now());
    let mut response = chart.image.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(header::VARY, HeaderValue::from_static("accept"));
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", max_age)) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&last_modified) {
        headers.insert(header::LAST_MODIFIED, value);
    }
    response
}
