use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{AllocationPreview, CreditSummary, OwnerDebtSummary, PeriodRef};
use compute::{allocation, credit};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::schemas::{map_engine_error, ApiResponse, AppState, ErrorResponse};

/// Request body for simulating an allocation
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct PreviewAllocationRequest {
    /// Amount to simulate, in whole currency units
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
}

/// Reference period for the credit computation
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreditQuery {
    /// Reference year
    #[validate(range(min = 1970, max = 2999))]
    pub year: i32,
    /// Reference month (1-12)
    #[validate(range(min = 1, max = 12))]
    pub month: i32,
}

/// Get an owner's outstanding debt summary
///
/// Served from the in-process cache when possible; every mutating engine
/// call invalidates the affected entries.
#[utoipa::path(
    get,
    path = "/api/v1/owners/{owner_id}/debt",
    tag = "owners",
    params(
        ("owner_id" = i32, Path, description = "Owner ID"),
    ),
    responses(
        (status = 200, description = "Debt summary retrieved", body = ApiResponse<OwnerDebtSummary>),
        (status = 404, description = "Owner not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_owner_debt(
    Path(owner_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OwnerDebtSummary>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_owner_debt for owner_id: {}", owner_id);

    // Check cache first
    if let Some(summary) = state.debt_cache.get(&owner_id).await {
        debug!("Debt summary for owner {} served from cache", owner_id);
        let response = ApiResponse {
            data: summary,
            message: "Owner debt retrieved from cache".to_string(),
            success: true,
        };
        return Ok(Json(response));
    }

    match credit::owner_debt_summary(&state.db, owner_id).await {
        Ok(summary) => {
            info!(
                "Debt summary for owner {}: {} outstanding across {} expenses",
                owner_id,
                summary.total_debt,
                summary.expenses.len()
            );
            state.debt_cache.insert(owner_id, summary.clone()).await;

            let response = ApiResponse {
                data: summary,
                message: "Owner debt retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}

/// Get an owner's available credit before a reference period
#[utoipa::path(
    get,
    path = "/api/v1/owners/{owner_id}/credit",
    tag = "owners",
    params(
        ("owner_id" = i32, Path, description = "Owner ID"),
        ("year" = i32, Query, description = "Reference year"),
        ("month" = i32, Query, description = "Reference month (1-12)"),
    ),
    responses(
        (status = 200, description = "Credit position computed", body = ApiResponse<CreditSummary>),
        (status = 404, description = "Owner not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_owner_credit(
    Path(owner_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<CreditQuery>>,
) -> Result<Json<ApiResponse<CreditSummary>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_owner_credit for owner_id: {}", owner_id);
    debug!(
        "Computing credit for owner {} before {}-{:02}",
        owner_id, query.year, query.month
    );

    let reference = PeriodRef::new(query.year, query.month);

    match credit::available_credit(&state.db, owner_id, reference).await {
        Ok(summary) => {
            info!(
                "Credit for owner {} before {}: {} available",
                owner_id,
                reference.label(),
                summary.available_credit
            );
            let response = ApiResponse {
                data: summary,
                message: "Credit position computed successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}

/// Simulate allocating an amount against an owner's outstanding expenses
///
/// Nothing is persisted; the result shows what an allocation would do
/// against current balances.
#[utoipa::path(
    post,
    path = "/api/v1/owners/{owner_id}/allocations/preview",
    tag = "owners",
    params(
        ("owner_id" = i32, Path, description = "Owner ID"),
    ),
    request_body = PreviewAllocationRequest,
    responses(
        (status = 200, description = "Allocation preview computed", body = ApiResponse<AllocationPreview>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 404, description = "Owner not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn preview_owner_allocation(
    Path(owner_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<PreviewAllocationRequest>>,
) -> Result<Json<ApiResponse<AllocationPreview>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering preview_owner_allocation for owner_id: {}", owner_id);
    debug!(
        "Previewing allocation of {} for owner {}",
        request.amount, owner_id
    );

    match allocation::preview_allocation(&state.db, owner_id, request.amount).await {
        Ok(preview) => {
            info!(
                "Allocation preview for owner {}: {} allocatable, {} credit",
                owner_id, preview.allocatable, preview.credit_remaining
            );
            let response = ApiResponse {
                data: preview,
                message: "Allocation preview computed successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}
