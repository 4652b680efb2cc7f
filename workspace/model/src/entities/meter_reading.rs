use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A meter reading for one period, unique per (meter, period). Written by
/// the reading-ingestion flow. `previous_value` and `consumption` are the
/// ingestion's own denormalized record; the consumption resolver always
/// derives consumption from the preceding period's `value`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meter_readings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub meter_id: i32,
    pub period_id: i32,
    /// Cumulative meter value in m³.
    #[sea_orm(column_type = "Decimal(Some((12, 3)))")]
    pub value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))", nullable)]
    pub previous_value: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))", nullable)]
    pub consumption: Option<Decimal>,
    pub submitted_by: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meter::Entity",
        from = "Column::MeterId",
        to = "super::meter::Column::Id",
        on_delete = "Cascade"
    )]
    Meter,
    #[sea_orm(
        belongs_to = "super::billing_period::Entity",
        from = "Column::PeriodId",
        to = "super::billing_period::Column::Id",
        on_delete = "Restrict"
    )]
    BillingPeriod,
}

impl Related<super::meter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meter.def()
    }
}

impl Related<super::billing_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingPeriod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
