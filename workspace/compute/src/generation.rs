use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use tracing::{debug, info, instrument, warn};

use common::{BaseRates, ExpensePreview, GenerationReport, PeriodRef};
use model::entities::billing_period::PeriodStatus;
use model::entities::consolidated_expense::ExpenseStatus;
use model::entities::prelude::{BillingPeriod, CategoryFactor, ConsolidatedExpense, Ownership, Property};
use model::entities::property::PropertyCategory;
use model::entities::{
    billing_period, category_factor, consolidated_expense, expense_detail, ownership, property,
    water_factor,
};

use crate::consumption::resolve_consumption;
use crate::error::{BillingError, Result};
use crate::rounding::round_money;
use crate::water;

/// Day of the month on which generated expenses fall due.
pub const EXPENSE_DUE_DAY: u32 = 25;

/// Configured base rate per category at one point in time, newest
/// `valid_from` wins.
#[derive(Debug, Default)]
struct RateTable {
    commercial: Option<Decimal>,
    residential: Option<Decimal>,
    other: Option<Decimal>,
}

impl RateTable {
    /// Configured rate for the category, falling back to the caller default.
    fn rate_for(&self, category: PropertyCategory, base_rates: &BaseRates) -> Option<Decimal> {
        let configured = match category {
            PropertyCategory::Commercial => self.commercial,
            PropertyCategory::Residential => self.residential,
            PropertyCategory::Other => self.other,
        };
        configured.or(match category {
            PropertyCategory::Commercial => base_rates.commercial,
            PropertyCategory::Residential => base_rates.residential,
            PropertyCategory::Other => base_rates.other,
        })
    }
}

/// Shared inputs of one generation run.
struct GenerationContext<'a> {
    period: &'a billing_period::Model,
    water: Option<&'a water_factor::Model>,
    rates: &'a RateTable,
    base_rates: &'a BaseRates,
    due_date: NaiveDate,
    actor: &'a str,
}

/// One property's computed contribution before persistence.
struct DetailDraft {
    property_id: i32,
    category: PropertyCategory,
    area_m2: Decimal,
    base_rate: Decimal,
    base_contribution: Decimal,
    water_factor: Option<Decimal>,
    consumption: Option<Decimal>,
    current_reading: Option<Decimal>,
    previous_reading: Option<Decimal>,
    water_contribution: Decimal,
    note: Option<String>,
}

/// Generates the consolidated expenses of an open billing period, one per
/// owner holding a current ownership.
///
/// Re-running only fills gaps: owners whose expense already exists are
/// skipped, backed by the unique constraint on (period, owner). Each owner
/// is processed in its own savepoint, so a failing owner lands in the
/// report's error list without aborting the rest of the run; only an
/// unexpected database failure rolls back the whole transaction.
#[instrument(skip(db, base_rates))]
pub async fn generate_expenses(
    db: &DatabaseConnection,
    period_id: i32,
    base_rates: &BaseRates,
    actor: &str,
) -> Result<GenerationReport> {
    let txn = db.begin().await?;

    let period = BillingPeriod::find_by_id(period_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(BillingError::PeriodNotFound { period_id })?;
    let period_ref = PeriodRef::new(period.year, period.month);
    if period.status != PeriodStatus::Open {
        return Err(BillingError::PeriodNotOpen {
            label: period_ref.label(),
            status: format!("{:?}", period.status),
        });
    }
    let period_start = period.first_day().ok_or_else(|| {
        BillingError::Consistency(format!("period {period_id} has an invalid month"))
    })?;
    let due_date = NaiveDate::from_ymd_opt(period.year, period.month as u32, EXPENSE_DUE_DAY)
        .ok_or_else(|| {
            BillingError::Consistency(format!("period {period_id} has an invalid month"))
        })?;

    let rates = load_rate_table(&txn, period_start).await?;
    let water_snapshot = water::find_snapshot(&txn, period_id).await?;

    let ownerships = Ownership::find()
        .filter(ownership::Column::ValidTo.is_null())
        .all(&txn)
        .await?;
    let property_ids: Vec<i32> = ownerships.iter().map(|o| o.property_id).collect();
    let properties: HashMap<i32, property::Model> = Property::find()
        .filter(property::Column::Id.is_in(property_ids))
        .filter(property::Column::Active.eq(true))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut owners: BTreeMap<i32, Vec<&ownership::Model>> = BTreeMap::new();
    for link in &ownerships {
        owners.entry(link.owner_id).or_default().push(link);
    }

    let already_generated: HashSet<i32> = ConsolidatedExpense::find()
        .filter(consolidated_expense::Column::PeriodId.eq(period_id))
        .all(&txn)
        .await?
        .iter()
        .map(|e| e.owner_id)
        .collect();

    let ctx = GenerationContext {
        period: &period,
        water: water_snapshot.as_ref(),
        rates: &rates,
        base_rates,
        due_date,
        actor,
    };

    let mut created = 0usize;
    let mut skipped = 0usize;
    let mut errors: Vec<String> = Vec::new();
    let mut amount_generated = 0i64;

    for (owner_id, owner_links) in &owners {
        if already_generated.contains(owner_id) {
            debug!(owner_id, "expense already exists, skipping");
            skipped += 1;
            continue;
        }

        let owner_properties: Vec<(&ownership::Model, &property::Model)> = owner_links
            .iter()
            .filter_map(|link| properties.get(&link.property_id).map(|p| (*link, p)))
            .collect();
        if owner_properties.is_empty() {
            debug!(owner_id, "no active properties, skipping");
            skipped += 1;
            continue;
        }

        let sp = txn.begin().await?;
        match build_owner_expense(&sp, &ctx, *owner_id, &owner_properties).await {
            Ok(total) => {
                sp.commit().await?;
                created += 1;
                amount_generated += total;
            }
            Err(err) => {
                sp.rollback().await?;
                if is_unique_violation(&err) {
                    // A concurrent run created this owner's expense between
                    // our existence check and the insert.
                    debug!(owner_id, "expense appeared concurrently, skipping");
                    skipped += 1;
                } else if let BillingError::Database(db_err) = err {
                    return Err(BillingError::Database(db_err));
                } else {
                    warn!(owner_id, error = %err, "owner failed, continuing with the rest");
                    errors.push(format!("owner {owner_id}: {err}"));
                }
            }
        }
    }

    if created > 0 {
        let new_total = period.total_generated + amount_generated;
        let mut active: billing_period::ActiveModel = period.into();
        active.total_generated = Set(new_total);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    info!(
        created,
        skipped,
        failed = errors.len(),
        amount_generated,
        "expense generation finished"
    );

    Ok(GenerationReport {
        period_id,
        period: period_ref,
        created,
        skipped,
        errors,
        amount_generated,
    })
}

/// Same math as one generation step for a single property, persisting
/// nothing. The carried debt is the property's principal owner's.
#[instrument(skip(db, base_rates))]
pub async fn preview_property_expense(
    db: &DatabaseConnection,
    property_id: i32,
    period_id: i32,
    base_rates: &BaseRates,
) -> Result<ExpensePreview> {
    let period = BillingPeriod::find_by_id(period_id)
        .one(db)
        .await?
        .ok_or(BillingError::PeriodNotFound { period_id })?;
    let property = Property::find_by_id(property_id)
        .one(db)
        .await?
        .ok_or(BillingError::PropertyNotFound { property_id })?;

    let period_ref = PeriodRef::new(period.year, period.month);
    let period_start = period.first_day().ok_or_else(|| {
        BillingError::Consistency(format!("period {period_id} has an invalid month"))
    })?;

    let rates = load_rate_table(db, period_start).await?;
    let rate = rates
        .rate_for(property.category, base_rates)
        .ok_or_else(|| {
            BillingError::Validation(format!(
                "no active rate for category {:?} and no default provided",
                property.category
            ))
        })?;
    let water_snapshot = water::find_snapshot(db, period_id).await?;

    let mut notes = Vec::new();
    let outcome = resolve_consumption(db, &property, &period).await?;
    if let Some(note) = outcome.note() {
        notes.push(note);
    }

    let factor = water_snapshot
        .as_ref()
        .and_then(|w| w.factor_for(property.category));
    let consumption = outcome.consumption();
    let (raw_water, factor_note) = water_contribution(consumption, factor, property.category);
    if let Some(note) = factor_note {
        notes.push(note);
    }
    let raw_base = rate * property.area_m2;

    let principal = Ownership::find()
        .filter(ownership::Column::PropertyId.eq(property.id))
        .filter(ownership::Column::ValidTo.is_null())
        .filter(ownership::Column::IsPrincipal.eq(true))
        .order_by_asc(ownership::Column::Id)
        .one(db)
        .await?;
    let previous_debt = match &principal {
        Some(link) => previous_debt_for_owner(db, link.owner_id, period_ref).await?,
        None => 0,
    };

    Ok(ExpensePreview {
        property_id: property.id,
        property_code: property.code.clone(),
        period: period_ref,
        category: format!("{:?}", property.category),
        area_m2: property.area_m2,
        base_rate: rate,
        base_amount: round_money(raw_base)?,
        water_factor: factor,
        consumption,
        water_amount: round_money(raw_water)?,
        previous_debt,
        total_amount: round_money(raw_base + raw_water + Decimal::from(previous_debt))?,
        notes,
    })
}

/// Unpaid balance carried from strictly earlier periods. Cancelled
/// documents are not collectible and never count.
pub(crate) async fn previous_debt_for_owner<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    current: PeriodRef,
) -> Result<i64> {
    let rows = ConsolidatedExpense::find()
        .filter(consolidated_expense::Column::OwnerId.eq(owner_id))
        .filter(
            consolidated_expense::Column::Status
                .is_not_in([ExpenseStatus::Paid, ExpenseStatus::Cancelled]),
        )
        .find_also_related(BillingPeriod)
        .all(conn)
        .await?;

    let mut debt = 0i64;
    for (expense, period) in rows {
        let Some(period) = period else { continue };
        if PeriodRef::new(period.year, period.month) < current {
            debt += expense.balance;
        }
    }
    Ok(debt)
}

async fn build_owner_expense(
    txn: &DatabaseTransaction,
    ctx: &GenerationContext<'_>,
    owner_id: i32,
    owner_properties: &[(&ownership::Model, &property::Model)],
) -> Result<i64> {
    let mut drafts: Vec<DetailDraft> = Vec::with_capacity(owner_properties.len());
    let mut raw_base = Decimal::ZERO;
    let mut raw_water = Decimal::ZERO;

    for (_, property) in owner_properties {
        let rate = ctx
            .rates
            .rate_for(property.category, ctx.base_rates)
            .ok_or_else(|| {
                BillingError::Validation(format!(
                    "no active rate for category {:?} and no default provided",
                    property.category
                ))
            })?;
        let base_contribution = rate * property.area_m2;

        let outcome = resolve_consumption(txn, property, ctx.period).await?;
        let factor = ctx.water.and_then(|w| w.factor_for(property.category));
        let consumption = outcome.consumption();
        let (current_reading, previous_reading) = outcome.readings();
        let mut note = outcome.note();
        let (water_contribution, factor_note) =
            water_contribution(consumption, factor, property.category);
        if let Some(extra) = factor_note {
            append_note(&mut note, extra);
        }

        raw_base += base_contribution;
        raw_water += water_contribution;
        drafts.push(DetailDraft {
            property_id: property.id,
            category: property.category,
            area_m2: property.area_m2,
            base_rate: rate,
            base_contribution,
            water_factor: factor,
            consumption,
            current_reading,
            previous_reading,
            water_contribution,
            note,
        });
    }

    let period_ref = PeriodRef::new(ctx.period.year, ctx.period.month);
    let previous_debt = previous_debt_for_owner(txn, owner_id, period_ref).await?;

    // Rounded independently; the total is rounded from the raw sums, not
    // from the already-rounded components.
    let base_amount = round_money(raw_base)?;
    let water_amount = round_money(raw_water)?;
    let total_amount = round_money(raw_base + raw_water + Decimal::from(previous_debt))?;

    let primary_property = owner_properties
        .iter()
        .filter(|(link, _)| link.is_principal)
        .map(|(_, p)| p.id)
        .min();

    let expense = consolidated_expense::ActiveModel {
        period_id: Set(ctx.period.id),
        owner_id: Set(owner_id),
        primary_property_id: Set(primary_property),
        base_amount: Set(base_amount),
        water_amount: Set(water_amount),
        other_amount: Set(0),
        previous_debt: Set(previous_debt),
        total_amount: Set(total_amount),
        paid_amount: Set(0),
        balance: Set(total_amount),
        status: Set(ExpenseStatus::Pending),
        due_date: Set(ctx.due_date),
        paid_at: Set(None),
        generated_by: Set(ctx.actor.to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    for draft in drafts {
        expense_detail::ActiveModel {
            expense_id: Set(expense.id),
            property_id: Set(draft.property_id),
            category: Set(draft.category),
            area_m2: Set(draft.area_m2),
            base_rate: Set(draft.base_rate),
            base_amount: Set(round_money(draft.base_contribution)?),
            water_factor: Set(draft.water_factor),
            consumption: Set(draft.consumption),
            current_reading: Set(draft.current_reading),
            previous_reading: Set(draft.previous_reading),
            water_amount: Set(round_money(draft.water_contribution)?),
            note: Set(draft.note),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    debug!(
        owner_id,
        expense_id = expense.id,
        total_amount,
        previous_debt,
        "consolidated expense created"
    );
    Ok(total_amount)
}

/// Water charge of one property, with a note instead when the category's
/// factor is undefined.
fn water_contribution(
    consumption: Option<Decimal>,
    factor: Option<Decimal>,
    category: PropertyCategory,
) -> (Decimal, Option<String>) {
    match (consumption, factor) {
        (Some(consumption), Some(factor)) => (consumption * factor, None),
        (Some(_), None) => (
            Decimal::ZERO,
            Some(format!(
                "no water factor for category {category:?}; water not billed"
            )),
        ),
        (None, _) => (Decimal::ZERO, None),
    }
}

fn append_note(existing: &mut Option<String>, extra: String) {
    match existing {
        Some(note) => {
            note.push_str("; ");
            note.push_str(&extra);
        }
        None => *existing = Some(extra),
    }
}

async fn load_rate_table<C: ConnectionTrait>(conn: &C, at: NaiveDate) -> Result<RateTable> {
    let factors = CategoryFactor::find()
        .filter(category_factor::Column::Active.eq(true))
        .filter(category_factor::Column::ValidFrom.lte(at))
        .filter(
            Condition::any()
                .add(category_factor::Column::ValidTo.is_null())
                .add(category_factor::Column::ValidTo.gte(at)),
        )
        .order_by_desc(category_factor::Column::ValidFrom)
        .order_by_desc(category_factor::Column::Id)
        .all(conn)
        .await?;

    let mut table = RateTable::default();
    for factor in factors {
        let slot = match factor.category {
            PropertyCategory::Commercial => &mut table.commercial,
            PropertyCategory::Residential => &mut table.residential,
            PropertyCategory::Other => &mut table.other,
        };
        if slot.is_none() {
            *slot = Some(factor.rate);
        }
    }
    Ok(table)
}

fn is_unique_violation(err: &BillingError) -> bool {
    match err {
        BillingError::Database(db_err) => {
            matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        }
        _ => false,
    }
}
