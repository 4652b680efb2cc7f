use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::DbErr;

use common::BaseRates;
use model::entities::billing_period::PeriodStatus;
use model::entities::main_meter_invoice::WaterCategory;
use model::entities::property::PropertyCategory;

use super::{helpers, setup_db, TestScenario, TestScenarioBuilder};

/// Canonical small building: two owners, three properties, direct meters,
/// invoices for both water categories and configured base rates.
///
/// Expected generation outcome for the open period 2026-03:
///   - owner 1 (C-101): base 25.00 x 120.00 = 3000, water 30.000 m3 x 150 = 4500, total 7500
///   - owner 2 (R-201 + S-001): base 1539 + 50, water 12.500 m3 x 160 = 2000, total 3589
pub struct ScenarioBuilding;

impl ScenarioBuilding {
    pub fn new() -> Self {
        Self
    }

    /// Fallback rates for categories without a configured factor. The
    /// scenario configures all three categories, so these stay unused.
    pub fn base_rates(&self) -> BaseRates {
        BaseRates::default()
    }
}

#[async_trait]
impl TestScenarioBuilder for ScenarioBuilding {
    async fn get_scenario(&self) -> Result<TestScenario, DbErr> {
        let db = setup_db().await?;

        let previous = helpers::new_period(&db, 2026, 2, PeriodStatus::Closed).await?;
        let current = helpers::new_period(&db, 2026, 3, PeriodStatus::Open).await?;

        helpers::new_category_factor(&db, PropertyCategory::Commercial, Decimal::new(2500, 2))
            .await?;
        helpers::new_category_factor(&db, PropertyCategory::Residential, Decimal::new(1800, 2))
            .await?;
        helpers::new_category_factor(&db, PropertyCategory::Other, Decimal::new(500, 2)).await?;

        let ana = helpers::new_owner(&db, "Ana Morales").await?;
        let boris = helpers::new_owner(&db, "Boris Stanek").await?;

        let shop = helpers::new_property(
            &db,
            "C-101",
            PropertyCategory::Commercial,
            Decimal::new(12000, 2),
            true,
        )
        .await?;
        let flat = helpers::new_property(
            &db,
            "R-201",
            PropertyCategory::Residential,
            Decimal::new(8550, 2),
            true,
        )
        .await?;
        let storage = helpers::new_property(
            &db,
            "S-001",
            PropertyCategory::Other,
            Decimal::new(1000, 2),
            false,
        )
        .await?;

        helpers::new_ownership(&db, &ana, &shop, true).await?;
        helpers::new_ownership(&db, &boris, &flat, true).await?;
        helpers::new_ownership(&db, &boris, &storage, false).await?;

        let shop_meter = helpers::new_meter(&db, &shop, "M-C101").await?;
        helpers::new_reading(&db, &shop_meter, &previous, Decimal::new(100500, 3)).await?;
        helpers::new_reading(&db, &shop_meter, &current, Decimal::new(130500, 3)).await?;

        let flat_meter = helpers::new_meter(&db, &flat, "M-R201").await?;
        helpers::new_reading(&db, &flat_meter, &previous, Decimal::new(80000, 3)).await?;
        helpers::new_reading(&db, &flat_meter, &current, Decimal::new(92500, 3)).await?;

        helpers::new_invoice(&db, &current, WaterCategory::Commercial, 7500, Decimal::new(50, 0))
            .await?;
        helpers::new_invoice(&db, &current, WaterCategory::Residential, 9600, Decimal::new(60, 0))
            .await?;

        Ok((db, current, vec![ana, boris]))
    }
}
