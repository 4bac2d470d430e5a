//! REST API server for ledgerd
//!
//! Exposes the transfer engine and the read-only query facade over HTTP:
//! transfer submission, balance lookup, recent transaction history, plus
//! health and service statistics endpoints.

use axum::{
    extract::{Path, Query, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::engine::TransferEngine;
use crate::error::LedgerError;
use crate::persistence::Database;
use crate::query::QueryService;
use crate::transaction::TransferRecord;

/// Shared handler state: the write path (engine), the read path (query) and
/// request statistics.
#[derive(Clone)]
pub struct Service {
    pub engine: Arc<TransferEngine>,
    pub query: Arc<QueryService>,
    api_stats: Arc<RwLock<ApiStats>>,
}

impl Service {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            engine: Arc::new(TransferEngine::new(db.clone())),
            query: Arc::new(QueryService::new(db)),
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }

    /// Get API statistics
    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            transfers_submitted: stats.transfers_submitted,
            uptime_seconds: uptime,
        }
    }
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    transfers_submitted: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            LedgerError::InvalidParameters(_) | LedgerError::InsufficientFunds => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            LedgerError::FromWalletNotFound
            | LedgerError::ToWalletNotFound
            | LedgerError::WalletNotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            LedgerError::Conflict(_) => (StatusCode::CONFLICT, self.0.to_string()),
            LedgerError::DatabaseError(_) | LedgerError::CryptoError(_) => {
                // Storage details stay in the log, not on the wire
                tracing::error!("internal error: {}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct SendRequest {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

#[derive(Serialize)]
struct SuccessResponse {
    message: String,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub balance: f64,
    pub address: String,
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<TransferRecord> for TransactionResponse {
    fn from(record: TransferRecord) -> Self {
        TransactionResponse {
            from: record.from_address,
            to: record.to_address,
            amount: record.amount,
            timestamp: record.timestamp,
        }
    }
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub transfers_submitted: u64,
    pub uptime_seconds: u64,
}

#[derive(Deserialize)]
struct RecentQuery {
    count: Option<String>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Request counting middleware
async fn stats_middleware(State(service): State<Arc<Service>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = service.api_stats.write().await;
    stats.record_request(success);

    response
}

/// Request logging middleware. Logs method, path, status and duration.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints (for testing)
pub fn build_api_router(service: Arc<Service>) -> Router {
    // CORS configuration - allow all origins with credentials
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        // Transfer endpoint
        .route("/send", post(send_transfer))
        // Query endpoints
        .route("/transactions", get(get_recent_transactions))
        .route("/wallet/:address/balance", get(get_wallet_balance))
        // System endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        // logging before stats so we always record timing
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(
            service.clone(),
            stats_middleware,
        ))
        .with_state(service);

    Router::new().nest("/api", api_routes).layer(cors)
}

/// Run the API server until the listener fails or the process is stopped.
pub async fn run_api_server(
    service: Arc<Service>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn send_transfer(
    State(service): State<Arc<Service>>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    service.engine.transfer(&req.from, &req.to, req.amount)?;

    {
        let mut stats = service.api_stats.write().await;
        stats.transfers_submitted += 1;
    }

    Ok(Json(SuccessResponse {
        message: "Transaction successful".to_string(),
    }))
}

async fn get_recent_transactions(
    State(service): State<Arc<Service>>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let count = params
        .count
        .as_deref()
        .unwrap_or("")
        .parse::<i64>()
        .map_err(|_| {
            LedgerError::InvalidParameters(
                "'count' must be a positive integer".to_string(),
            )
        })?;

    let records = service.query.recent_transfers(count)?;
    let transactions: Vec<TransactionResponse> =
        records.into_iter().map(TransactionResponse::from).collect();
    Ok(Json(transactions))
}

async fn get_wallet_balance(
    State(service): State<Arc<Service>>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = service.query.balance_of(&address)?;
    Ok(Json(BalanceResponse { balance, address }))
}

async fn get_api_stats(State(service): State<Arc<Service>>) -> impl IntoResponse {
    Json(service.get_stats().await)
}
