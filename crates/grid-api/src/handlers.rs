//! # Request Handlers
//!
//! Axum handlers proxying the Grid service. Bodies and query strings use
//! the same camelCase shapes as the Grid API itself.

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use grid_client::ClientInfo;
use grid_core::{
    AccountInfo, CreateAccountRequest, CreateAccountResponse, CreateSpendingLimitRequest,
    CreateSpendingLimitResponse, DeleteSpendingLimitRequest, DeleteSpendingLimitResponse,
    GetAccountInfoRequest, GetBalancesRequest, GetBalancesResponse, GetSpendingLimitsRequest,
    GetSpendingLimitsResponse, GetTransactionsRequest, GetTransactionsResponse, GridError,
    GridErrorKind, LimitStatus, TransactionRequest, TransactionResponse, TransactionStatus,
    UpdateAccountRequest, UpdateAccountResponse, VerifyOtpRequest, VerifyOtpResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// User-facing message for the error category
    pub error: String,
    /// Machine-readable code, e.g. `GRID_VALIDATION_ERROR`
    pub code: String,
    pub category: String,
    /// Message as reported by Grid
    pub message: String,
    pub status: u16,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// HTTP status a Grid error is reported with
pub fn status_for(err: &GridError) -> StatusCode {
    let code = match err.kind() {
        GridErrorKind::Config | GridErrorKind::Unknown => 500,
        GridErrorKind::Network => 502,
        kind => err
            .status_code()
            .filter(|s| (400..600).contains(s))
            .or_else(|| kind.default_status())
            .unwrap_or(500),
    };
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn grid_error_to_response(err: GridError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(code = err.code(), "Grid call failed: {}", err);
    } else {
        warn!(code = err.code(), "Grid call rejected: {}", err);
    }

    let response = ErrorResponse {
        error: err.user_message(),
        code: err.code().to_string(),
        category: err.category().as_str().to_string(),
        message: err.message().to_string(),
        status: status.as_u16(),
    };
    (status, Json(response))
}

#[derive(Debug, Default, Deserialize)]
pub struct BalancesQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpendingLimitsQuery {
    pub status: Option<LimitStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub status: Option<TransactionStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint. Always 200; the body says whether Grid answers.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let grid_healthy = state.service.is_healthy().await;

    Json(serde_json::json!({
        "status": if grid_healthy { "healthy" } else { "degraded" },
        "service": "subsave-grid",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.as_str(),
        "grid": {
            "initialized": state.service.is_initialized(),
            "healthy": grid_healthy,
        },
        "advisor": {
            "enabled": state.advisor_enabled(),
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn client_info(State(state): State<AppState>) -> ApiResult<ClientInfo> {
    state
        .service
        .client_info()
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state, request))]
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> ApiResult<CreateAccountResponse> {
    state
        .service
        .create_account(request)
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state, request))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> ApiResult<VerifyOtpResponse> {
    state
        .service
        .verify_otp(request)
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state))]
pub async fn get_account_info(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> ApiResult<AccountInfo> {
    state
        .service
        .get_account_info(GetAccountInfoRequest::new(account_id))
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state, request), fields(account_id = %request.account_id))]
pub async fn update_account(
    State(state): State<AppState>,
    Json(request): Json<UpdateAccountRequest>,
) -> ApiResult<UpdateAccountResponse> {
    state
        .service
        .update_account(request)
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state, query))]
pub async fn get_balances(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<BalancesQuery>,
) -> ApiResult<GetBalancesResponse> {
    let request = GetBalancesRequest {
        account_id,
        currency: query.currency,
    };

    state
        .service
        .get_balances(request)
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state, request), fields(account_id = %request.account_id))]
pub async fn create_spending_limit(
    State(state): State<AppState>,
    Json(request): Json<CreateSpendingLimitRequest>,
) -> ApiResult<CreateSpendingLimitResponse> {
    state
        .service
        .create_spending_limit(request)
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state))]
pub async fn delete_spending_limit(
    State(state): State<AppState>,
    Path((account_id, limit_id)): Path<(String, String)>,
) -> ApiResult<DeleteSpendingLimitResponse> {
    state
        .service
        .delete_spending_limit(DeleteSpendingLimitRequest::new(account_id, limit_id))
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state, query))]
pub async fn get_spending_limits(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<SpendingLimitsQuery>,
) -> ApiResult<GetSpendingLimitsResponse> {
    let request = GetSpendingLimitsRequest {
        account_id,
        status: query.status,
        limit: query.limit,
        offset: query.offset,
    };

    state
        .service
        .get_spending_limits(request)
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state, request), fields(account_id = %request.account_id))]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<TransactionRequest>,
) -> ApiResult<TransactionResponse> {
    state
        .service
        .create_transaction(request)
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}

#[instrument(skip(state, query))]
pub async fn get_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<TransactionsQuery>,
) -> ApiResult<GetTransactionsResponse> {
    let request = GetTransactionsRequest {
        account_id,
        limit: query.limit,
        offset: query.offset,
        status: query.status,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    state
        .service
        .get_transactions(request)
        .await
        .map(Json)
        .map_err(grid_error_to_response)
}
