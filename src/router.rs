use crate::handlers::{
    expenses::{get_expense, preview_expense},
    health::health_check,
    owners::{get_owner_credit, get_owner_debt, preview_owner_allocation},
    payments::{allocate_payment, allocate_payment_to_period, get_payment, reverse_payment},
    periods::{generate_period_expenses, get_period, list_periods},
    water_factors::{get_period_water_factors, recompute_period_water_factors},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Billing period routes
        .route("/api/v1/periods", get(list_periods))
        .route("/api/v1/periods/:period_id", get(get_period))
        .route(
            "/api/v1/periods/:period_id/expenses/generate",
            post(generate_period_expenses),
        )
        // Water factor routes
        .route(
            "/api/v1/periods/:period_id/water-factors",
            get(get_period_water_factors),
        )
        .route(
            "/api/v1/periods/:period_id/water-factors/recompute",
            post(recompute_period_water_factors),
        )
        // Expense routes
        .route("/api/v1/expenses/preview", post(preview_expense))
        .route("/api/v1/expenses/:expense_id", get(get_expense))
        // Payment routes
        .route("/api/v1/payments/:payment_id", get(get_payment))
        .route("/api/v1/payments/:payment_id/allocate", post(allocate_payment))
        .route(
            "/api/v1/payments/:payment_id/allocate-to-period",
            post(allocate_payment_to_period),
        )
        .route("/api/v1/payments/:payment_id/reverse", post(reverse_payment))
        // Owner position routes
        .route("/api/v1/owners/:owner_id/debt", get(get_owner_debt))
        .route("/api/v1/owners/:owner_id/credit", get(get_owner_credit))
        .route(
            "/api/v1/owners/:owner_id/allocations/preview",
            post(preview_owner_allocation),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state);

    attach_metrics(router)
}

#[cfg(not(test))]
fn attach_metrics(router: Router) -> Router {
    use axum_prometheus::PrometheusMetricLayer;

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
    router
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
}

// The prometheus recorder is process-global and can only be installed
// once; the test suite builds a fresh router per test.
#[cfg(test)]
fn attach_metrics(router: Router) -> Router {
    router
}
