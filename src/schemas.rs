use axum::http::StatusCode;
use axum::response::Json;
use common::{
    AllocationLine, AllocationPreview, AllocationResult, BaseRates, CreditSummary,
    ExpensePreview, ExpenseSummary, GenerationReport, OwnerDebtSummary, PeriodCollectionTotal,
    PeriodRef, ReversalLine, ReversalResult, WaterFactorSnapshot,
};
use compute::error::BillingError;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

use crate::handlers::expenses::{ExpenseDetailResponse, ExpenseResponse, PreviewExpenseRequest};
use crate::handlers::owners::{CreditQuery, PreviewAllocationRequest};
use crate::handlers::payments::{
    AllocateRequest, AllocateToPeriodRequest, PaymentAllocationResponse, PaymentResponse,
    ReverseRequest,
};
use crate::handlers::periods::{GenerateExpensesRequest, PeriodResponse};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache of owner debt summaries, invalidated by every mutating
    /// engine call
    pub debt_cache: Cache<i32, OwnerDebtSummary>,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Stable machine-readable error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Map an engine error to an HTTP status and response body.
///
/// Validation maps to 400, unknown ids to 404, business-rule conflicts to
/// 409 and internal failures to 500. Raw database error text never crosses
/// the HTTP boundary; it is logged here instead.
pub fn map_engine_error(err: BillingError) -> (StatusCode, Json<ErrorResponse>) {
    use BillingError as E;

    let (status, code) = match &err {
        E::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
        E::PeriodNotFound { .. } => (StatusCode::NOT_FOUND, "PERIOD_NOT_FOUND"),
        E::OwnerNotFound { .. } => (StatusCode::NOT_FOUND, "OWNER_NOT_FOUND"),
        E::PropertyNotFound { .. } => (StatusCode::NOT_FOUND, "PROPERTY_NOT_FOUND"),
        E::PaymentNotFound { .. } => (StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND"),
        E::ExpenseNotFound { .. } => (StatusCode::NOT_FOUND, "EXPENSE_NOT_FOUND"),
        E::PeriodNotOpen { .. } => (StatusCode::CONFLICT, "PERIOD_CLOSED"),
        E::PaymentNotActive { .. } => (StatusCode::CONFLICT, "PAYMENT_NOT_ACTIVE"),
        E::PaymentAlreadyCancelled { .. } => (StatusCode::CONFLICT, "PAYMENT_ALREADY_CANCELLED"),
        E::PaymentFullyAllocated { .. } => (StatusCode::CONFLICT, "PAYMENT_FULLY_ALLOCATED"),
        E::NoOutstandingExpenses { .. } => (StatusCode::CONFLICT, "NO_OUTSTANDING_EXPENSES"),
        E::Consistency(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONSISTENCY"),
        E::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE"),
    };

    if status.is_server_error() {
        error!("Engine call failed: {}", err);
    } else {
        warn!("Engine call rejected: {}", err);
    }

    let error = match &err {
        E::Database(_) => "internal database error".to_string(),
        _ => err.to_string(),
    };

    (
        status,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
            success: false,
        }),
    )
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::periods::list_periods,
        crate::handlers::periods::get_period,
        crate::handlers::periods::generate_period_expenses,
        crate::handlers::water_factors::recompute_period_water_factors,
        crate::handlers::water_factors::get_period_water_factors,
        crate::handlers::expenses::preview_expense,
        crate::handlers::expenses::get_expense,
        crate::handlers::payments::allocate_payment,
        crate::handlers::payments::allocate_payment_to_period,
        crate::handlers::payments::reverse_payment,
        crate::handlers::payments::get_payment,
        crate::handlers::owners::get_owner_debt,
        crate::handlers::owners::get_owner_credit,
        crate::handlers::owners::preview_owner_allocation,
    ),
    components(
        schemas(
            ApiResponse<GenerationReport>,
            ApiResponse<ExpensePreview>,
            ApiResponse<AllocationResult>,
            ApiResponse<AllocationPreview>,
            ApiResponse<ReversalResult>,
            ApiResponse<OwnerDebtSummary>,
            ApiResponse<CreditSummary>,
            ApiResponse<WaterFactorSnapshot>,
            ApiResponse<PeriodResponse>,
            ApiResponse<Vec<PeriodResponse>>,
            ApiResponse<ExpenseResponse>,
            ApiResponse<PaymentResponse>,
            ErrorResponse,
            HealthResponse,
            GenerateExpensesRequest,
            PreviewExpenseRequest,
            AllocateRequest,
            AllocateToPeriodRequest,
            ReverseRequest,
            PreviewAllocationRequest,
            CreditQuery,
            PeriodResponse,
            ExpenseResponse,
            ExpenseDetailResponse,
            PaymentResponse,
            PaymentAllocationResponse,
            BaseRates,
            PeriodRef,
            GenerationReport,
            ExpensePreview,
            AllocationResult,
            AllocationLine,
            PeriodCollectionTotal,
            AllocationPreview,
            ReversalResult,
            ReversalLine,
            OwnerDebtSummary,
            ExpenseSummary,
            CreditSummary,
            WaterFactorSnapshot,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "periods", description = "Billing period reads and expense generation"),
        (name = "water-factors", description = "Per-period water cost factor computation"),
        (name = "expenses", description = "Consolidated expense reads and previews"),
        (name = "payments", description = "Payment allocation and reversal"),
        (name = "owners", description = "Owner debt and credit positions"),
    ),
    info(
        title = "CondoRust API",
        description = "Condominium Billing API - shared-expense generation and payment allocation for building management",
        version = "0.1.0",
        contact(
            name = "CondoRust Team",
            email = "contact@condorust.com"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
