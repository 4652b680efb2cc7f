use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::WaterFactorSnapshot;
use compute::water;
use tracing::{debug, info, instrument, trace, warn};

use crate::schemas::{map_engine_error, ApiResponse, AppState, ErrorResponse};

/// Recompute a period's water cost factors from its main-meter invoices
///
/// Invoked by the invoice ingestion flow after every invoice mutation.
/// The per-period snapshot row is overwritten in place, so recomputing is
/// idempotent.
#[utoipa::path(
    post,
    path = "/api/v1/periods/{period_id}/water-factors/recompute",
    tag = "water-factors",
    params(
        ("period_id" = i32, Path, description = "Billing period ID"),
    ),
    responses(
        (status = 200, description = "Water factors recomputed", body = ApiResponse<WaterFactorSnapshot>),
        (status = 404, description = "Period not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn recompute_period_water_factors(
    Path(period_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WaterFactorSnapshot>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering recompute_period_water_factors for period_id: {}", period_id);

    match water::recompute_water_factors(&state.db, period_id).await {
        Ok(snapshot) => {
            info!(
                "Water factors recomputed for period {}: commercial {:?}, residential {:?}",
                period_id, snapshot.factor_commercial, snapshot.factor_residential
            );
            let response = ApiResponse {
                data: snapshot,
                message: "Water factors recomputed successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}

/// Get a period's current water factor snapshot
#[utoipa::path(
    get,
    path = "/api/v1/periods/{period_id}/water-factors",
    tag = "water-factors",
    params(
        ("period_id" = i32, Path, description = "Billing period ID"),
    ),
    responses(
        (status = 200, description = "Water factor snapshot retrieved", body = ApiResponse<WaterFactorSnapshot>),
        (status = 404, description = "No snapshot computed for this period", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_period_water_factors(
    Path(period_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WaterFactorSnapshot>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_period_water_factors for period_id: {}", period_id);
    debug!("Fetching water factor snapshot for period {}", period_id);

    match water::water_factor_snapshot(&state.db, period_id).await {
        Ok(Some(snapshot)) => {
            info!("Water factor snapshot retrieved for period {}", period_id);
            let response = ApiResponse {
                data: snapshot,
                message: "Water factor snapshot retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("No water factor snapshot computed for period {}", period_id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("no water factors computed for period {period_id}"),
                    code: "WATER_FACTORS_NOT_COMPUTED".to_string(),
                    success: false,
                }),
            ))
        }
        Err(err) => Err(map_engine_error(err)),
    }
}
