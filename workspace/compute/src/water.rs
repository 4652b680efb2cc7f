use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, SqlErr,
};
use tracing::{debug, info, instrument};

use common::{PeriodRef, WaterFactorSnapshot};
use model::entities::main_meter_invoice::WaterCategory;
use model::entities::prelude::{BillingPeriod, MainMeterInvoice, WaterFactor};
use model::entities::{billing_period, main_meter_invoice, water_factor};

use crate::error::{BillingError, Result};
use crate::rounding::round_factor;

/// Running totals of one water category's invoices over a period.
#[derive(Debug, Default, Clone, Copy)]
struct CategoryTotals {
    amount: i64,
    consumption: Decimal,
}

impl CategoryTotals {
    fn add(&mut self, invoice: &main_meter_invoice::Model) {
        self.amount += invoice.amount;
        self.consumption += invoice.consumption_m3;
    }

    /// Factor is undefined while the category has no invoiced consumption.
    fn factor(&self) -> Option<Decimal> {
        if self.consumption <= Decimal::ZERO {
            return None;
        }
        Some(round_factor(Decimal::from(self.amount) / self.consumption))
    }
}

/// Recomputes the water cost factors of a period from its main meter
/// invoices and stores them as the period's snapshot.
///
/// The factor of a category is the invoiced amount divided by the invoiced
/// consumption over all of the period's invoices for that category. A
/// category without consumption gets no factor at all; its properties carry
/// a note instead of a water charge until invoices arrive and the factors
/// are recomputed. Recomputing is idempotent, the snapshot row is
/// overwritten in place.
#[instrument(skip(db))]
pub async fn recompute_water_factors(
    db: &DatabaseConnection,
    period_id: i32,
) -> Result<WaterFactorSnapshot> {
    let period = BillingPeriod::find_by_id(period_id)
        .one(db)
        .await?
        .ok_or(BillingError::PeriodNotFound { period_id })?;

    let invoices = MainMeterInvoice::find()
        .filter(main_meter_invoice::Column::PeriodId.eq(period_id))
        .all(db)
        .await?;

    let mut commercial = CategoryTotals::default();
    let mut residential = CategoryTotals::default();
    for invoice in &invoices {
        match invoice.category {
            WaterCategory::Commercial => commercial.add(invoice),
            WaterCategory::Residential => residential.add(invoice),
        }
    }

    debug!(
        invoices = invoices.len(),
        commercial_amount = commercial.amount,
        residential_amount = residential.amount,
        "aggregated main meter invoices"
    );

    let computed_at = Utc::now().naive_utc();
    let model = store_snapshot(db, period_id, commercial, residential, computed_at).await?;

    info!(
        factor_commercial = ?model.factor_commercial,
        factor_residential = ?model.factor_residential,
        "water factors recomputed"
    );

    Ok(to_snapshot(model, &period))
}

/// Returns the stored factor snapshot for a period, if one was computed.
#[instrument(skip(db))]
pub async fn water_factor_snapshot(
    db: &DatabaseConnection,
    period_id: i32,
) -> Result<Option<WaterFactorSnapshot>> {
    let period = BillingPeriod::find_by_id(period_id)
        .one(db)
        .await?
        .ok_or(BillingError::PeriodNotFound { period_id })?;

    Ok(find_snapshot(db, period_id)
        .await?
        .map(|model| to_snapshot(model, &period)))
}

/// Raw snapshot row lookup, shared with expense generation which reads it
/// inside its own transaction.
pub(crate) async fn find_snapshot<C: ConnectionTrait>(
    conn: &C,
    period_id: i32,
) -> Result<Option<water_factor::Model>> {
    Ok(WaterFactor::find()
        .filter(water_factor::Column::PeriodId.eq(period_id))
        .one(conn)
        .await?)
}

async fn store_snapshot(
    db: &DatabaseConnection,
    period_id: i32,
    commercial: CategoryTotals,
    residential: CategoryTotals,
    computed_at: NaiveDateTime,
) -> Result<water_factor::Model> {
    if let Some(existing) = find_snapshot(db, period_id).await? {
        let mut active: water_factor::ActiveModel = existing.into();
        apply_totals(&mut active, commercial, residential, computed_at);
        return Ok(active.update(db).await?);
    }

    let mut active = water_factor::ActiveModel {
        period_id: Set(period_id),
        ..Default::default()
    };
    apply_totals(&mut active, commercial, residential, computed_at);
    match active.insert(db).await {
        Ok(model) => Ok(model),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            // A concurrent recompute inserted the row first; the unique key
            // on period_id turns the race into an update.
            let existing = find_snapshot(db, period_id).await?.ok_or_else(|| {
                BillingError::Consistency(format!(
                    "water factor row for period {period_id} vanished during recompute"
                ))
            })?;
            let mut active: water_factor::ActiveModel = existing.into();
            apply_totals(&mut active, commercial, residential, computed_at);
            Ok(active.update(db).await?)
        }
        Err(err) => Err(err.into()),
    }
}

fn apply_totals(
    active: &mut water_factor::ActiveModel,
    commercial: CategoryTotals,
    residential: CategoryTotals,
    computed_at: NaiveDateTime,
) {
    active.factor_commercial = Set(commercial.factor());
    active.factor_residential = Set(residential.factor());
    active.commercial_amount = Set(commercial.amount);
    active.commercial_consumption = Set(commercial.consumption);
    active.residential_amount = Set(residential.amount);
    active.residential_consumption = Set(residential.consumption);
    active.computed_at = Set(computed_at);
}

fn to_snapshot(model: water_factor::Model, period: &billing_period::Model) -> WaterFactorSnapshot {
    WaterFactorSnapshot {
        period_id: period.id,
        period: PeriodRef::new(period.year, period.month),
        factor_commercial: model.factor_commercial,
        factor_residential: model.factor_residential,
        commercial_amount: model.commercial_amount,
        commercial_consumption: model.commercial_consumption,
        residential_amount: model.residential_amount,
        residential_consumption: model.residential_consumption,
        computed_at: DateTime::from_naive_utc_and_offset(model.computed_at, Utc),
    }
}
