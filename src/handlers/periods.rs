use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDateTime;
use common::{BaseRates, GenerationReport};
use compute::generation;
use compute::error::BillingError;
use model::entities::billing_period;
use model::entities::prelude::BillingPeriod;
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::schemas::{map_engine_error, ApiResponse, AppState, ErrorResponse};

/// Request body for generating a period's consolidated expenses
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct GenerateExpensesRequest {
    /// Fallback base rates per category, used where no calculation factor
    /// is configured
    pub base_rates: Option<BaseRates>,
    /// User recorded as the generator of the created expenses
    #[validate(length(min = 1, message = "requested_by must not be empty"))]
    pub requested_by: String,
}

/// Billing period response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PeriodResponse {
    pub id: i32,
    pub year: i32,
    pub month: i32,
    pub status: String,
    pub total_generated: i64,
    pub total_collected: i64,
    pub closed_at: Option<NaiveDateTime>,
}

impl From<billing_period::Model> for PeriodResponse {
    fn from(model: billing_period::Model) -> Self {
        Self {
            id: model.id,
            year: model.year,
            month: model.month,
            status: format!("{:?}", model.status),
            total_generated: model.total_generated,
            total_collected: model.total_collected,
            closed_at: model.closed_at,
        }
    }
}

/// List all billing periods
#[utoipa::path(
    get,
    path = "/api/v1/periods",
    tag = "periods",
    responses(
        (status = 200, description = "Periods retrieved successfully", body = ApiResponse<Vec<PeriodResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn list_periods(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PeriodResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering list_periods function");
    debug!("Fetching all billing periods from database");

    match BillingPeriod::find()
        .order_by_asc(billing_period::Column::Year)
        .order_by_asc(billing_period::Column::Month)
        .all(&state.db)
        .await
    {
        Ok(periods) => {
            let period_count = periods.len();
            let period_responses: Vec<PeriodResponse> =
                periods.into_iter().map(PeriodResponse::from).collect();

            info!("Successfully retrieved {} billing periods", period_count);
            let response = ApiResponse {
                data: period_responses,
                message: "Periods retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => Err(map_engine_error(db_error.into())),
    }
}

/// Get a specific billing period with its running totals
#[utoipa::path(
    get,
    path = "/api/v1/periods/{period_id}",
    tag = "periods",
    params(
        ("period_id" = i32, Path, description = "Billing period ID"),
    ),
    responses(
        (status = 200, description = "Period retrieved successfully", body = ApiResponse<PeriodResponse>),
        (status = 404, description = "Period not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_period(
    Path(period_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PeriodResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_period function for period_id: {}", period_id);

    match BillingPeriod::find_by_id(period_id).one(&state.db).await {
        Ok(Some(period)) => {
            info!(
                "Successfully retrieved period {} ({}-{:02})",
                period.id, period.year, period.month
            );
            let response = ApiResponse {
                data: PeriodResponse::from(period),
                message: "Period retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => Err(map_engine_error(BillingError::PeriodNotFound { period_id })),
        Err(db_error) => Err(map_engine_error(db_error.into())),
    }
}

/// Generate the consolidated expenses of a billing period
///
/// One expense per owner holding at least one active property. Re-running
/// fills gaps and never duplicates; per-owner failures are reported in the
/// result without aborting the run.
#[utoipa::path(
    post,
    path = "/api/v1/periods/{period_id}/expenses/generate",
    tag = "periods",
    params(
        ("period_id" = i32, Path, description = "Billing period ID"),
    ),
    request_body = GenerateExpensesRequest,
    responses(
        (status = 200, description = "Expense generation completed", body = ApiResponse<GenerationReport>),
        (status = 404, description = "Period not found", body = ErrorResponse),
        (status = 409, description = "Period is not open for generation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn generate_period_expenses(
    Path(period_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<GenerateExpensesRequest>>,
) -> Result<Json<ApiResponse<GenerationReport>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering generate_period_expenses for period_id: {}", period_id);
    debug!(
        "Generating expenses for period {} requested by {}",
        period_id, request.requested_by
    );

    let base_rates = request.base_rates.unwrap_or_default();

    match generation::generate_expenses(&state.db, period_id, &base_rates, &request.requested_by)
        .await
    {
        Ok(report) => {
            info!(
                "Expense generation for period {} finished: {} created, {} skipped, {} errors",
                period_id,
                report.created,
                report.skipped,
                report.errors.len()
            );
            // New expenses change every owner's outstanding position.
            state.debt_cache.invalidate_all();

            let response = ApiResponse {
                data: report,
                message: "Expense generation completed".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}
