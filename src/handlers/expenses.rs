use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, NaiveDateTime};
use common::{BaseRates, ExpensePreview};
use compute::error::BillingError;
use compute::generation;
use model::entities::prelude::{ConsolidatedExpense, ExpenseDetail};
use model::entities::{consolidated_expense, expense_detail};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, ModelTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::schemas::{map_engine_error, ApiResponse, AppState, ErrorResponse};

/// Request body for previewing a single property's expense
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct PreviewExpenseRequest {
    /// Property to preview
    pub property_id: i32,
    /// Billing period to preview against
    pub period_id: i32,
    /// Fallback base rates per category
    pub base_rates: Option<BaseRates>,
}

/// Consolidated expense response model with its per-property breakdown
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: i32,
    pub period_id: i32,
    pub owner_id: i32,
    pub primary_property_id: Option<i32>,
    pub base_amount: i64,
    pub water_amount: i64,
    pub other_amount: i64,
    pub previous_debt: i64,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub balance: i64,
    pub status: String,
    pub due_date: NaiveDate,
    pub paid_at: Option<NaiveDateTime>,
    pub generated_by: String,
    pub created_at: NaiveDateTime,
    pub details: Vec<ExpenseDetailResponse>,
}

/// One contributing property inside a consolidated expense
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseDetailResponse {
    pub id: i32,
    pub property_id: i32,
    pub category: String,
    pub area_m2: Decimal,
    pub base_rate: Decimal,
    pub base_amount: i64,
    pub water_factor: Option<Decimal>,
    pub consumption: Option<Decimal>,
    pub current_reading: Option<Decimal>,
    pub previous_reading: Option<Decimal>,
    pub water_amount: i64,
    pub note: Option<String>,
}

impl From<expense_detail::Model> for ExpenseDetailResponse {
    fn from(model: expense_detail::Model) -> Self {
        Self {
            id: model.id,
            property_id: model.property_id,
            category: format!("{:?}", model.category),
            area_m2: model.area_m2,
            base_rate: model.base_rate,
            base_amount: model.base_amount,
            water_factor: model.water_factor,
            consumption: model.consumption,
            current_reading: model.current_reading,
            previous_reading: model.previous_reading,
            water_amount: model.water_amount,
            note: model.note,
        }
    }
}

impl ExpenseResponse {
    fn from_model(
        model: consolidated_expense::Model,
        details: Vec<expense_detail::Model>,
    ) -> Self {
        Self {
            id: model.id,
            period_id: model.period_id,
            owner_id: model.owner_id,
            primary_property_id: model.primary_property_id,
            base_amount: model.base_amount,
            water_amount: model.water_amount,
            other_amount: model.other_amount,
            previous_debt: model.previous_debt,
            total_amount: model.total_amount,
            paid_amount: model.paid_amount,
            balance: model.balance,
            status: format!("{:?}", model.status),
            due_date: model.due_date,
            paid_at: model.paid_at,
            generated_by: model.generated_by,
            created_at: model.created_at,
            details: details.into_iter().map(ExpenseDetailResponse::from).collect(),
        }
    }
}

/// Preview the expense of a single property for a period
///
/// Runs the same math as generation without persisting anything.
#[utoipa::path(
    post,
    path = "/api/v1/expenses/preview",
    tag = "expenses",
    request_body = PreviewExpenseRequest,
    responses(
        (status = 200, description = "Expense preview computed", body = ApiResponse<ExpensePreview>),
        (status = 400, description = "Invalid billing configuration", body = ErrorResponse),
        (status = 404, description = "Property or period not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn preview_expense(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<PreviewExpenseRequest>>,
) -> Result<Json<ApiResponse<ExpensePreview>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering preview_expense function");
    debug!(
        "Previewing expense for property {} in period {}",
        request.property_id, request.period_id
    );

    let base_rates = request.base_rates.unwrap_or_default();

    match generation::preview_property_expense(
        &state.db,
        request.property_id,
        request.period_id,
        &base_rates,
    )
    .await
    {
        Ok(preview) => {
            info!(
                "Expense preview for property {} in period {}: total {}",
                request.property_id, request.period_id, preview.total_amount
            );
            let response = ApiResponse {
                data: preview,
                message: "Expense preview computed successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}

/// Get a consolidated expense with its detail breakdown
#[utoipa::path(
    get,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Consolidated expense ID"),
    ),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = ApiResponse<ExpenseResponse>),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ExpenseResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_expense function for expense_id: {}", expense_id);

    let expense = match ConsolidatedExpense::find_by_id(expense_id).one(&state.db).await {
        Ok(Some(expense)) => expense,
        Ok(None) => {
            return Err(map_engine_error(BillingError::ExpenseNotFound { expense_id }));
        }
        Err(db_error) => return Err(map_engine_error(db_error.into())),
    };

    match expense
        .find_related(ExpenseDetail)
        .order_by_asc(expense_detail::Column::Id)
        .all(&state.db)
        .await
    {
        Ok(details) => {
            info!(
                "Successfully retrieved expense {} with {} details",
                expense_id,
                details.len()
            );
            let response = ApiResponse {
                data: ExpenseResponse::from_model(expense, details),
                message: "Expense retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => Err(map_engine_error(db_error.into())),
    }
}
