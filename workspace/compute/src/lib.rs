pub mod allocation;
pub mod consumption;
pub mod credit;
pub mod error;
pub mod generation;
pub mod rounding;
pub mod water;

#[cfg(test)]
pub mod testing;

use common::{BaseRates, GenerationReport};
use sea_orm::DatabaseConnection;

use crate::error::Result;

/// Runs the regular monthly close for one billing period.
///
/// Recomputes the period's water factors from the main meter invoices
/// ingested so far, then generates the consolidated expenses. This is
/// the sequence the administration runs once all invoices and meter
/// readings for the month have been entered.
pub async fn run_monthly_billing(
    db: &DatabaseConnection,
    period_id: i32,
    base_rates: &BaseRates,
    actor: &str,
) -> Result<GenerationReport> {
    water::recompute_water_factors(db, period_id).await?;
    generation::generate_expenses(db, period_id, base_rates, actor).await
}
