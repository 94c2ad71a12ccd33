// Points Manager Gateway - HTTP entry point
// Thin shell over the account actor: JSON in, JSON out

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use points_core::{AccountHandle, Metrics, PayerAmounts, RedemptionPlan, Transaction};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub account: AccountHandle,
    pub metrics: Metrics,
    pub service_name: String,
    pub service_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPointsRequest {
    pub payer: String,
    pub points: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendRequest {
    pub points: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: String,
}

// Error handling
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid redemption request")]
    InvalidRedemption(SpendRequest),
    #[error("{0}")]
    Rejected(points_core::Error),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            // Echo the offending request back
            GatewayError::InvalidRedemption(request) => {
                (StatusCode::BAD_REQUEST, Json(request)).into_response()
            }
            GatewayError::Rejected(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "error": e.to_string(),
                    "timestamp": Utc::now(),
                })),
            )
                .into_response(),
            GatewayError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": format!("Internal error: {}", msg),
                    "timestamp": Utc::now(),
                })),
            )
                .into_response(),
        }
    }
}

impl From<points_core::Error> for GatewayError {
    fn from(err: points_core::Error) -> Self {
        if err.is_rejection() {
            GatewayError::Rejected(err)
        } else {
            GatewayError::Internal(err.to_string())
        }
    }
}

// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: state.service_name.clone(),
        version: state.service_version.clone(),
    })
}

// Prometheus metrics endpoint
async fn metrics_handler(State(state): State<AppState>) -> Result<Response, GatewayError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&state.metrics.registry().gather(), &mut buffer)
        .map_err(|e| GatewayError::Internal(format!("Failed to export metrics: {}", e)))?;

    Ok((
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response())
}

async fn get_balance(State(state): State<AppState>) -> Result<Json<PayerAmounts>, GatewayError> {
    let balances = state.account.balances().await.map_err(|e| {
        error!("Balance query failed: {}", e);
        GatewayError::from(e)
    })?;
    Ok(Json(balances))
}

async fn add_transaction(
    State(state): State<AppState>,
    Json(request): Json<AddPointsRequest>,
) -> Result<StatusCode, GatewayError> {
    info!(
        payer = %request.payer,
        points = request.points,
        timestamp = %request.timestamp,
        "Adding transaction"
    );

    state
        .account
        .add_transaction(Transaction::new(
            request.payer,
            request.points,
            request.timestamp,
        ))
        .await
        .map_err(|e| {
            error!("Add transaction failed: {}", e);
            GatewayError::from(e)
        })?;

    Ok(StatusCode::OK)
}

async fn redeem_points(
    State(state): State<AppState>,
    Json(request): Json<SpendRequest>,
) -> Result<Json<RedemptionPlan>, GatewayError> {
    info!(points = request.points, "Redeeming points");

    match state.account.redeem(request.points).await {
        Ok(plan) => Ok(Json(plan)),
        Err(points_core::Error::InvalidRedemptionRequest(points)) => {
            warn!(points, "Rejected negative redemption");
            Err(GatewayError::InvalidRedemption(request))
        }
        Err(e) => {
            warn!("Redemption failed: {}", e);
            Err(e.into())
        }
    }
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/get-balance", get(get_balance))
        .route("/add-transaction", patch(add_transaction))
        .route("/redeem-points", patch(redeem_points));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/points-manager", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
