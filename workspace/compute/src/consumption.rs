use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{instrument, trace};

use model::entities::meter_group::ProrationMethod;
use model::entities::prelude::{
    BillingPeriod, Meter, MeterGroup, MeterGroupMember, MeterReading, Property,
};
use model::entities::{
    billing_period, meter, meter_group, meter_group_member, meter_reading, property,
};

use crate::error::{BillingError, Result};
use crate::rounding::round_consumption;

/// How one property's water consumption resolved for a period.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumptionOutcome {
    /// The property's category does not meter water.
    NotApplicable,
    /// The property should have a meter but none is attached.
    MissingMeter,
    /// The meter has no reading for the period.
    MissingReading { meter_id: i32 },
    /// The reading went backwards; nothing is billed.
    NegativeConsumption {
        meter_id: i32,
        current: Decimal,
        previous: Decimal,
    },
    /// A billable quantity was resolved.
    Metered {
        consumption: Decimal,
        current_reading: Option<Decimal>,
        previous_reading: Option<Decimal>,
        note: Option<String>,
    },
}

impl ConsumptionOutcome {
    /// Billable quantity, when one was resolved.
    pub fn consumption(&self) -> Option<Decimal> {
        match self {
            Self::Metered { consumption, .. } => Some(*consumption),
            _ => None,
        }
    }

    /// Data-quality note to carry onto the expense detail.
    pub fn note(&self) -> Option<String> {
        match self {
            Self::NotApplicable => None,
            Self::MissingMeter => Some("no active meter attached".to_string()),
            Self::MissingReading { meter_id } => {
                Some(format!("meter {meter_id} has no reading for the period"))
            }
            Self::NegativeConsumption {
                meter_id,
                current,
                previous,
            } => Some(format!(
                "meter {meter_id} reading went backwards ({previous} to {current}); water not billed"
            )),
            Self::Metered { note, .. } => note.clone(),
        }
    }

    /// Reading snapshot for the expense detail; only a directly metered
    /// property has one.
    pub fn readings(&self) -> (Option<Decimal>, Option<Decimal>) {
        match self {
            Self::Metered {
                current_reading,
                previous_reading,
                ..
            } => (*current_reading, *previous_reading),
            _ => (None, None),
        }
    }
}

/// Resolves the billable water consumption of a property for a period.
///
/// Checked in order: metering not applicable for the property, no active
/// meter attached, no reading captured for the period, then the difference
/// between the current and the previous period's reading. A missing
/// previous reading counts as zero and leaves a note on the outcome.
/// Properties fed through a shared meter group receive their prorated share
/// of the group's total instead.
#[instrument(skip(conn, property, period), fields(property_id = property.id, period_id = period.id))]
pub async fn resolve_consumption<C: ConnectionTrait>(
    conn: &C,
    property: &property::Model,
    period: &billing_period::Model,
) -> Result<ConsumptionOutcome> {
    if !property.requires_meter {
        return Ok(ConsumptionOutcome::NotApplicable);
    }

    // A directly attached meter wins over group membership.
    let direct = Meter::find()
        .filter(meter::Column::PropertyId.eq(property.id))
        .filter(meter::Column::Active.eq(true))
        .order_by_asc(meter::Column::Id)
        .one(conn)
        .await?;

    if let Some(meter) = direct {
        return resolve_direct(conn, &meter, period).await;
    }

    let membership = MeterGroupMember::find()
        .filter(meter_group_member::Column::PropertyId.eq(property.id))
        .one(conn)
        .await?;

    match membership {
        Some(member) => resolve_via_group(conn, property, &member, period).await,
        None => Ok(ConsumptionOutcome::MissingMeter),
    }
}

/// Checks that a custom-percent group's member percentages are all present
/// and sum to 100 within a 0.01 tolerance.
pub fn validate_percentages(
    group: &meter_group::Model,
    members: &[meter_group_member::Model],
) -> Result<()> {
    let mut sum = Decimal::ZERO;
    for member in members {
        let percentage = member.percentage.ok_or_else(|| {
            BillingError::Validation(format!(
                "property {} has no percentage in meter group \"{}\"",
                member.property_id, group.name
            ))
        })?;
        sum += percentage;
    }

    let tolerance = Decimal::new(1, 2);
    if (sum - Decimal::ONE_HUNDRED).abs() > tolerance {
        return Err(BillingError::Validation(format!(
            "meter group \"{}\" percentages sum to {sum}, expected 100",
            group.name
        )));
    }
    Ok(())
}

async fn resolve_direct<C: ConnectionTrait>(
    conn: &C,
    meter: &meter::Model,
    period: &billing_period::Model,
) -> Result<ConsumptionOutcome> {
    let Some(current) = reading_for(conn, meter.id, period.id).await? else {
        return Ok(ConsumptionOutcome::MissingReading { meter_id: meter.id });
    };

    let (previous, note) = previous_value(conn, meter.id, period).await?;
    let consumption = current.value - previous;
    if consumption < Decimal::ZERO {
        return Ok(ConsumptionOutcome::NegativeConsumption {
            meter_id: meter.id,
            current: current.value,
            previous,
        });
    }

    trace!(meter_id = meter.id, %consumption, "resolved direct meter consumption");
    Ok(ConsumptionOutcome::Metered {
        consumption,
        current_reading: Some(current.value),
        previous_reading: Some(previous),
        note,
    })
}

/// Previous reading value for a meter, taken from the immediately preceding
/// calendar period. Missing period or reading counts as zero.
async fn previous_value<C: ConnectionTrait>(
    conn: &C,
    meter_id: i32,
    period: &billing_period::Model,
) -> Result<(Decimal, Option<String>)> {
    let (prev_year, prev_month) = if period.month == 1 {
        (period.year - 1, 12)
    } else {
        (period.year, period.month - 1)
    };

    let previous_period = BillingPeriod::find()
        .filter(billing_period::Column::Year.eq(prev_year))
        .filter(billing_period::Column::Month.eq(prev_month))
        .one(conn)
        .await?;

    let reading = match previous_period {
        Some(prev) => reading_for(conn, meter_id, prev.id).await?,
        None => None,
    };

    match reading {
        Some(r) => Ok((r.value, None)),
        None => Ok((
            Decimal::ZERO,
            Some(format!(
                "meter {meter_id} has no previous reading; consumption counted from zero"
            )),
        )),
    }
}

async fn reading_for<C: ConnectionTrait>(
    conn: &C,
    meter_id: i32,
    period_id: i32,
) -> Result<Option<meter_reading::Model>> {
    Ok(MeterReading::find()
        .filter(meter_reading::Column::MeterId.eq(meter_id))
        .filter(meter_reading::Column::PeriodId.eq(period_id))
        .one(conn)
        .await?)
}

async fn resolve_via_group<C: ConnectionTrait>(
    conn: &C,
    property: &property::Model,
    member: &meter_group_member::Model,
    period: &billing_period::Model,
) -> Result<ConsumptionOutcome> {
    let group = MeterGroup::find_by_id(member.group_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            BillingError::Consistency(format!(
                "meter group {} referenced by property {} does not exist",
                member.group_id, property.id
            ))
        })?;

    let meters = Meter::find()
        .filter(meter::Column::GroupId.eq(group.id))
        .filter(meter::Column::Active.eq(true))
        .order_by_asc(meter::Column::Id)
        .all(conn)
        .await?;
    if meters.is_empty() {
        return Ok(ConsumptionOutcome::MissingMeter);
    }

    // Group total over all its meters. A meter without a usable reading
    // contributes nothing but is noted on the share.
    let mut total = Decimal::ZERO;
    let mut any_reading = false;
    let mut notes: Vec<String> = Vec::new();
    for group_meter in &meters {
        match resolve_direct(conn, group_meter, period).await? {
            ConsumptionOutcome::Metered {
                consumption, note, ..
            } => {
                any_reading = true;
                total += consumption;
                if let Some(note) = note {
                    notes.push(note);
                }
            }
            ConsumptionOutcome::MissingReading { meter_id } => {
                notes.push(format!("group meter {meter_id} has no reading for the period"));
            }
            ConsumptionOutcome::NegativeConsumption { meter_id, .. } => {
                notes.push(format!("group meter {meter_id} reading went backwards; ignored"));
            }
            ConsumptionOutcome::NotApplicable | ConsumptionOutcome::MissingMeter => {}
        }
    }
    if !any_reading {
        return Ok(ConsumptionOutcome::MissingReading {
            meter_id: meters[0].id,
        });
    }

    let members = MeterGroupMember::find()
        .filter(meter_group_member::Column::GroupId.eq(group.id))
        .all(conn)
        .await?;

    let share = prorated_share(conn, &group, &members, property, total).await?;
    notes.push(format!(
        "{share} m3 share of meter group \"{}\" ({total} m3 total)",
        group.name
    ));

    trace!(group_id = group.id, %share, "resolved group meter share");
    Ok(ConsumptionOutcome::Metered {
        consumption: share,
        current_reading: None,
        previous_reading: None,
        note: Some(notes.join("; ")),
    })
}

async fn prorated_share<C: ConnectionTrait>(
    conn: &C,
    group: &meter_group::Model,
    members: &[meter_group_member::Model],
    property: &property::Model,
    total: Decimal,
) -> Result<Decimal> {
    if members.is_empty() {
        return Err(BillingError::Validation(format!(
            "meter group \"{}\" has no members",
            group.name
        )));
    }

    let share = match group.method {
        ProrationMethod::EqualSplit => total / Decimal::from(members.len()),
        ProrationMethod::ByArea => {
            let ids: Vec<i32> = members.iter().map(|m| m.property_id).collect();
            let properties = Property::find()
                .filter(property::Column::Id.is_in(ids))
                .all(conn)
                .await?;
            let total_area: Decimal = properties.iter().map(|p| p.area_m2).sum();
            if total_area <= Decimal::ZERO {
                return Err(BillingError::Validation(format!(
                    "meter group \"{}\" prorates by area but its members have no area",
                    group.name
                )));
            }
            total * property.area_m2 / total_area
        }
        ProrationMethod::CustomPercent => {
            validate_percentages(group, members)?;
            let percentage = members
                .iter()
                .find(|m| m.property_id == property.id)
                .and_then(|m| m.percentage)
                .ok_or_else(|| {
                    BillingError::Validation(format!(
                        "property {} has no percentage in meter group \"{}\"",
                        property.id, group.name
                    ))
                })?;
            total * percentage / Decimal::ONE_HUNDRED
        }
    };

    Ok(round_consumption(share))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{helpers, setup_db};
    use model::entities::billing_period::PeriodStatus;
    use model::entities::property::PropertyCategory;

    async fn two_periods(
        db: &sea_orm::DatabaseConnection,
    ) -> (billing_period::Model, billing_period::Model) {
        let previous = helpers::new_period(db, 2026, 2, PeriodStatus::Closed)
            .await
            .unwrap();
        let current = helpers::new_period(db, 2026, 3, PeriodStatus::Open)
            .await
            .unwrap();
        (previous, current)
    }

    #[tokio::test]
    async fn test_unmetered_category_is_not_applicable() {
        let db = setup_db().await.unwrap();
        let (_, current) = two_periods(&db).await;
        let storage = helpers::new_property(
            &db,
            "S-001",
            PropertyCategory::Other,
            Decimal::new(1000, 2),
            false,
        )
        .await
        .unwrap();

        let outcome = resolve_consumption(&db, &storage, &current).await.unwrap();
        assert_eq!(outcome, ConsumptionOutcome::NotApplicable);
        assert_eq!(outcome.note(), None);
    }

    #[tokio::test]
    async fn test_missing_meter() {
        let db = setup_db().await.unwrap();
        let (_, current) = two_periods(&db).await;
        let unit = helpers::new_property(
            &db,
            "R-101",
            PropertyCategory::Residential,
            Decimal::new(8550, 2),
            true,
        )
        .await
        .unwrap();

        let outcome = resolve_consumption(&db, &unit, &current).await.unwrap();
        assert_eq!(outcome, ConsumptionOutcome::MissingMeter);
    }

    #[tokio::test]
    async fn test_missing_reading() {
        let db = setup_db().await.unwrap();
        let (_, current) = two_periods(&db).await;
        let unit = helpers::new_property(
            &db,
            "R-101",
            PropertyCategory::Residential,
            Decimal::new(8550, 2),
            true,
        )
        .await
        .unwrap();
        let meter = helpers::new_meter(&db, &unit, "M-R101").await.unwrap();

        let outcome = resolve_consumption(&db, &unit, &current).await.unwrap();
        assert_eq!(
            outcome,
            ConsumptionOutcome::MissingReading { meter_id: meter.id }
        );
    }

    #[tokio::test]
    async fn test_difference_of_consecutive_readings() {
        let db = setup_db().await.unwrap();
        let (previous, current) = two_periods(&db).await;
        let unit = helpers::new_property(
            &db,
            "R-101",
            PropertyCategory::Residential,
            Decimal::new(8550, 2),
            true,
        )
        .await
        .unwrap();
        let meter = helpers::new_meter(&db, &unit, "M-R101").await.unwrap();
        helpers::new_reading(&db, &meter, &previous, Decimal::new(80000, 3))
            .await
            .unwrap();
        helpers::new_reading(&db, &meter, &current, Decimal::new(92500, 3))
            .await
            .unwrap();

        let outcome = resolve_consumption(&db, &unit, &current).await.unwrap();
        assert_eq!(outcome.consumption(), Some(Decimal::new(12500, 3)));
        assert_eq!(outcome.note(), None);
        assert_eq!(
            outcome.readings(),
            (Some(Decimal::new(92500, 3)), Some(Decimal::new(80000, 3)))
        );
    }

    #[tokio::test]
    async fn test_missing_previous_reading_counts_from_zero() {
        let db = setup_db().await.unwrap();
        let (_, current) = two_periods(&db).await;
        let unit = helpers::new_property(
            &db,
            "R-101",
            PropertyCategory::Residential,
            Decimal::new(8550, 2),
            true,
        )
        .await
        .unwrap();
        let meter = helpers::new_meter(&db, &unit, "M-R101").await.unwrap();
        helpers::new_reading(&db, &meter, &current, Decimal::new(12500, 3))
            .await
            .unwrap();

        let outcome = resolve_consumption(&db, &unit, &current).await.unwrap();
        assert_eq!(outcome.consumption(), Some(Decimal::new(12500, 3)));
        assert!(outcome.note().unwrap().contains("no previous reading"));
    }

    #[tokio::test]
    async fn test_backwards_reading_is_never_billed() {
        let db = setup_db().await.unwrap();
        let (previous, current) = two_periods(&db).await;
        let unit = helpers::new_property(
            &db,
            "R-101",
            PropertyCategory::Residential,
            Decimal::new(8550, 2),
            true,
        )
        .await
        .unwrap();
        let meter = helpers::new_meter(&db, &unit, "M-R101").await.unwrap();
        helpers::new_reading(&db, &meter, &previous, Decimal::new(90000, 3))
            .await
            .unwrap();
        helpers::new_reading(&db, &meter, &current, Decimal::new(85000, 3))
            .await
            .unwrap();

        let outcome = resolve_consumption(&db, &unit, &current).await.unwrap();
        assert!(matches!(
            outcome,
            ConsumptionOutcome::NegativeConsumption { .. }
        ));
        assert_eq!(outcome.consumption(), None);
        assert!(outcome.note().unwrap().contains("went backwards"));
    }

    #[tokio::test]
    async fn test_group_equal_split() {
        let db = setup_db().await.unwrap();
        let (previous, current) = two_periods(&db).await;
        let group = helpers::new_meter_group(&db, "Block A", ProrationMethod::EqualSplit)
            .await
            .unwrap();
        let shared = helpers::new_group_meter(&db, &group, "M-BLOCK-A").await.unwrap();
        helpers::new_reading(&db, &shared, &previous, Decimal::new(100000, 3))
            .await
            .unwrap();
        helpers::new_reading(&db, &shared, &current, Decimal::new(130000, 3))
            .await
            .unwrap();

        let mut units = Vec::new();
        for code in ["R-201", "R-202"] {
            let unit = helpers::new_property(
                &db,
                code,
                PropertyCategory::Residential,
                Decimal::new(8550, 2),
                true,
            )
            .await
            .unwrap();
            helpers::new_group_member(&db, &group, &unit, None)
                .await
                .unwrap();
            units.push(unit);
        }

        for unit in &units {
            let outcome = resolve_consumption(&db, unit, &current).await.unwrap();
            assert_eq!(outcome.consumption(), Some(Decimal::new(15000, 3)));
            assert!(outcome.note().unwrap().contains("Block A"));
        }
    }

    #[tokio::test]
    async fn test_group_split_by_area() {
        let db = setup_db().await.unwrap();
        let (previous, current) = two_periods(&db).await;
        let group = helpers::new_meter_group(&db, "Block B", ProrationMethod::ByArea)
            .await
            .unwrap();
        let shared = helpers::new_group_meter(&db, &group, "M-BLOCK-B").await.unwrap();
        helpers::new_reading(&db, &shared, &previous, Decimal::ZERO)
            .await
            .unwrap();
        helpers::new_reading(&db, &shared, &current, Decimal::new(30000, 3))
            .await
            .unwrap();

        let big = helpers::new_property(
            &db,
            "R-301",
            PropertyCategory::Residential,
            Decimal::new(10000, 2),
            true,
        )
        .await
        .unwrap();
        let small = helpers::new_property(
            &db,
            "R-302",
            PropertyCategory::Residential,
            Decimal::new(5000, 2),
            true,
        )
        .await
        .unwrap();
        helpers::new_group_member(&db, &group, &big, None).await.unwrap();
        helpers::new_group_member(&db, &group, &small, None).await.unwrap();

        let outcome = resolve_consumption(&db, &big, &current).await.unwrap();
        assert_eq!(outcome.consumption(), Some(Decimal::new(20000, 3)));
        let outcome = resolve_consumption(&db, &small, &current).await.unwrap();
        assert_eq!(outcome.consumption(), Some(Decimal::new(10000, 3)));
    }

    #[tokio::test]
    async fn test_group_custom_percent() {
        let db = setup_db().await.unwrap();
        let (previous, current) = two_periods(&db).await;
        let group = helpers::new_meter_group(&db, "Block C", ProrationMethod::CustomPercent)
            .await
            .unwrap();
        let shared = helpers::new_group_meter(&db, &group, "M-BLOCK-C").await.unwrap();
        helpers::new_reading(&db, &shared, &previous, Decimal::ZERO)
            .await
            .unwrap();
        helpers::new_reading(&db, &shared, &current, Decimal::new(30000, 3))
            .await
            .unwrap();

        let first = helpers::new_property(
            &db,
            "C-401",
            PropertyCategory::Commercial,
            Decimal::new(12000, 2),
            true,
        )
        .await
        .unwrap();
        let second = helpers::new_property(
            &db,
            "C-402",
            PropertyCategory::Commercial,
            Decimal::new(12000, 2),
            true,
        )
        .await
        .unwrap();
        helpers::new_group_member(&db, &group, &first, Some(Decimal::new(600000, 4)))
            .await
            .unwrap();
        helpers::new_group_member(&db, &group, &second, Some(Decimal::new(400000, 4)))
            .await
            .unwrap();

        let outcome = resolve_consumption(&db, &first, &current).await.unwrap();
        assert_eq!(outcome.consumption(), Some(Decimal::new(18000, 3)));
        let outcome = resolve_consumption(&db, &second, &current).await.unwrap();
        assert_eq!(outcome.consumption(), Some(Decimal::new(12000, 3)));
    }

    #[tokio::test]
    async fn test_custom_percentages_must_sum_to_hundred() {
        let db = setup_db().await.unwrap();
        let (previous, current) = two_periods(&db).await;
        let group = helpers::new_meter_group(&db, "Block D", ProrationMethod::CustomPercent)
            .await
            .unwrap();
        let shared = helpers::new_group_meter(&db, &group, "M-BLOCK-D").await.unwrap();
        helpers::new_reading(&db, &shared, &previous, Decimal::ZERO)
            .await
            .unwrap();
        helpers::new_reading(&db, &shared, &current, Decimal::new(30000, 3))
            .await
            .unwrap();

        let first = helpers::new_property(
            &db,
            "C-501",
            PropertyCategory::Commercial,
            Decimal::new(12000, 2),
            true,
        )
        .await
        .unwrap();
        let second = helpers::new_property(
            &db,
            "C-502",
            PropertyCategory::Commercial,
            Decimal::new(12000, 2),
            true,
        )
        .await
        .unwrap();
        helpers::new_group_member(&db, &group, &first, Some(Decimal::new(600000, 4)))
            .await
            .unwrap();
        helpers::new_group_member(&db, &group, &second, Some(Decimal::new(300000, 4)))
            .await
            .unwrap();

        let err = resolve_consumption(&db, &first, &current).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
        assert!(err.to_string().contains("sum to 90"));
    }

    #[tokio::test]
    async fn test_equal_split_share_rounds_to_reading_scale() {
        let db = setup_db().await.unwrap();
        let (previous, current) = two_periods(&db).await;
        let group = helpers::new_meter_group(&db, "Block E", ProrationMethod::EqualSplit)
            .await
            .unwrap();
        let shared = helpers::new_group_meter(&db, &group, "M-BLOCK-E").await.unwrap();
        helpers::new_reading(&db, &shared, &previous, Decimal::ZERO)
            .await
            .unwrap();
        helpers::new_reading(&db, &shared, &current, Decimal::new(10000, 3))
            .await
            .unwrap();

        let mut first = None;
        for code in ["R-601", "R-602", "R-603"] {
            let unit = helpers::new_property(
                &db,
                code,
                PropertyCategory::Residential,
                Decimal::new(8550, 2),
                true,
            )
            .await
            .unwrap();
            helpers::new_group_member(&db, &group, &unit, None)
                .await
                .unwrap();
            first.get_or_insert(unit);
        }

        let outcome = resolve_consumption(&db, &first.unwrap(), &current)
            .await
            .unwrap();
        assert_eq!(outcome.consumption(), Some(Decimal::new(3333, 3)));
    }
}
