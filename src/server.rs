//! HTTP surface over [`BimonthlyRateService`].
//!
//! `GET /rate` and `GET /rate/info` wrap their payload in `{ success, data }`; failures
//! come back as `{ success: false, error, code }`.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::cli::ui;
use crate::core::{BimonthlyRateService, PeriodInfo, RateError, ResolvedRate};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

fn status_for(err: &RateError) -> StatusCode {
    match err {
        RateError::NoQuotationFound { .. } => StatusCode::NOT_FOUND,
        RateError::Transport { .. } | RateError::DataValidation(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for RateError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let body = ApiErrorResponse {
            success: false,
            error: self.to_string(),
            code: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

async fn current_rate(
    State(service): State<Arc<BimonthlyRateService>>,
) -> Result<Json<ApiResponse<ResolvedRate>>, RateError> {
    match service.get_current_rate().await {
        Ok(rate) => Ok(Json(ApiResponse::ok(rate))),
        Err(e) => {
            warn!(code = e.kind(), "Rate lookup failed: {}", e);
            Err(e)
        }
    }
}

async fn period_info(
    State(service): State<Arc<BimonthlyRateService>>,
) -> Json<ApiResponse<PeriodInfo>> {
    Json(ApiResponse::ok(service.get_current_period_info()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}

pub fn router(service: Arc<BimonthlyRateService>) -> Router {
    Router::new()
        .route("/rate", get(current_rate))
        .route("/rate/info", get(period_info))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Serves the router on `addr` until Ctrl-C.
pub async fn serve(service: Arc<BimonthlyRateService>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on {}", addr);
    println!(
        "Serving PTAX rates on {}",
        ui::style_text(&format!("http://{addr}"), ui::StyleType::Value)
    );

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
