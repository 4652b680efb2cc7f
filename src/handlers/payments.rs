use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, NaiveDateTime};
use common::{AllocationResult, ReversalResult};
use compute::allocation;
use compute::error::BillingError;
use model::entities::prelude::{Payment, PaymentAllocation};
use model::entities::{payment, payment_allocation};
use sea_orm::{EntityTrait, ModelTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::schemas::{map_engine_error, ApiResponse, AppState, ErrorResponse};

/// Request body for allocating a payment FIFO across all outstanding debt
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct AllocateRequest {
    /// User recorded on the ledger entry
    #[validate(length(min = 1, message = "requested_by must not be empty"))]
    pub requested_by: String,
}

/// Request body for allocating a payment against one period's expense
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct AllocateToPeriodRequest {
    /// Billing period whose expense the payment settles
    pub period_id: i32,
    /// User recorded on the ledger entry
    #[validate(length(min = 1, message = "requested_by must not be empty"))]
    pub requested_by: String,
}

/// Request body for reversing a payment
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ReverseRequest {
    /// Reason recorded on the cancelled payment
    #[validate(length(min = 1, message = "reason must not be empty"))]
    pub reason: String,
    /// User recorded as the canceller
    #[validate(length(min = 1, message = "requested_by must not be empty"))]
    pub requested_by: String,
}

/// Payment response model with its allocation rows
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub receipt_number: i64,
    pub owner_id: i32,
    pub amount: i64,
    pub payment_date: NaiveDate,
    pub period_id: Option<i32>,
    pub reference: Option<String>,
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<String>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub allocations: Vec<PaymentAllocationResponse>,
}

/// One persisted application of a payment to an expense
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentAllocationResponse {
    pub id: i32,
    pub expense_id: i32,
    pub amount: i64,
    pub created_at: NaiveDateTime,
}

impl From<payment_allocation::Model> for PaymentAllocationResponse {
    fn from(model: payment_allocation::Model) -> Self {
        Self {
            id: model.id,
            expense_id: model.expense_id,
            amount: model.amount,
            created_at: model.created_at,
        }
    }
}

impl PaymentResponse {
    fn from_model(model: payment::Model, allocations: Vec<payment_allocation::Model>) -> Self {
        Self {
            id: model.id,
            receipt_number: model.receipt_number,
            owner_id: model.owner_id,
            amount: model.amount,
            payment_date: model.payment_date,
            period_id: model.period_id,
            reference: model.reference,
            status: format!("{:?}", model.status),
            cancellation_reason: model.cancellation_reason,
            cancelled_by: model.cancelled_by,
            cancelled_at: model.cancelled_at,
            created_by: model.created_by,
            created_at: model.created_at,
            allocations: allocations
                .into_iter()
                .map(PaymentAllocationResponse::from)
                .collect(),
        }
    }
}

/// Allocate a payment across the owner's outstanding expenses
///
/// Oldest debt is settled first. A remainder beyond all outstanding debt
/// is reported as credit, never persisted.
#[utoipa::path(
    post,
    path = "/api/v1/payments/{payment_id}/allocate",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    request_body = AllocateRequest,
    responses(
        (status = 200, description = "Payment allocated", body = ApiResponse<AllocationResult>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Payment not allocatable or nothing outstanding", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn allocate_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<AllocateRequest>>,
) -> Result<Json<ApiResponse<AllocationResult>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering allocate_payment for payment_id: {}", payment_id);
    debug!(
        "Allocating payment {} requested by {}",
        payment_id, request.requested_by
    );

    match allocation::allocate_payment(&state.db, payment_id, &request.requested_by).await {
        Ok(result) => {
            info!(
                "Payment {} allocated: {} applied across {} expenses, credit {}",
                payment_id,
                result.allocated,
                result.lines.len(),
                result.credit_remaining
            );
            state.debt_cache.invalidate(&result.owner_id).await;

            let response = ApiResponse {
                data: result,
                message: "Payment allocated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}

/// Allocate a payment against a single period's expense
#[utoipa::path(
    post,
    path = "/api/v1/payments/{payment_id}/allocate-to-period",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    request_body = AllocateToPeriodRequest,
    responses(
        (status = 200, description = "Payment allocated", body = ApiResponse<AllocationResult>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Payment not allocatable or nothing outstanding", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn allocate_payment_to_period(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<AllocateToPeriodRequest>>,
) -> Result<Json<ApiResponse<AllocationResult>>, (StatusCode, Json<ErrorResponse>)> {
    trace!(
        "Entering allocate_payment_to_period for payment_id: {}",
        payment_id
    );
    debug!(
        "Allocating payment {} to period {} requested by {}",
        payment_id, request.period_id, request.requested_by
    );

    match allocation::allocate_payment_to_period(
        &state.db,
        payment_id,
        request.period_id,
        &request.requested_by,
    )
    .await
    {
        Ok(result) => {
            info!(
                "Payment {} allocated to period {}: {} applied",
                payment_id, request.period_id, result.allocated
            );
            state.debt_cache.invalidate(&result.owner_id).await;

            let response = ApiResponse {
                data: result,
                message: "Payment allocated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}

/// Reverse a payment
///
/// Returns every allocated amount to its expense, cancels the payment and
/// records one offsetting ledger entry.
#[utoipa::path(
    post,
    path = "/api/v1/payments/{payment_id}/reverse",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    request_body = ReverseRequest,
    responses(
        (status = 200, description = "Payment reversed", body = ApiResponse<ReversalResult>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 409, description = "Payment already cancelled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn reverse_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<ReverseRequest>>,
) -> Result<Json<ApiResponse<ReversalResult>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering reverse_payment for payment_id: {}", payment_id);
    debug!(
        "Reversing payment {} requested by {}: {}",
        payment_id, request.requested_by, request.reason
    );

    match allocation::reverse_payment(
        &state.db,
        payment_id,
        &request.reason,
        &request.requested_by,
    )
    .await
    {
        Ok(result) => {
            info!(
                "Payment {} reversed: {} returned across {} expenses",
                payment_id,
                result.reversed,
                result.lines.len()
            );
            state.debt_cache.invalidate(&result.owner_id).await;

            let response = ApiResponse {
                data: result,
                message: "Payment reversed successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}

/// Get a payment with its allocation rows
#[utoipa::path(
    get,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Payment retrieved successfully", body = ApiResponse<PaymentResponse>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaymentResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_payment function for payment_id: {}", payment_id);

    let payment = match Payment::find_by_id(payment_id).one(&state.db).await {
        Ok(Some(payment)) => payment,
        Ok(None) => {
            return Err(map_engine_error(BillingError::PaymentNotFound { payment_id }));
        }
        Err(db_error) => return Err(map_engine_error(db_error.into())),
    };

    match payment
        .find_related(PaymentAllocation)
        .order_by_asc(payment_allocation::Column::Id)
        .all(&state.db)
        .await
    {
        Ok(allocations) => {
            info!(
                "Successfully retrieved payment {} with {} allocations",
                payment_id,
                allocations.len()
            );
            let response = ApiResponse {
                data: PaymentResponse::from_model(payment, allocations),
                message: "Payment retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => Err(map_engine_error(db_error.into())),
    }
}
