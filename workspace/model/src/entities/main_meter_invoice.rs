use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Water category billed by the utility. Only the two metered categories
/// exist here; `Other` properties never carry water charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum WaterCategory {
    #[sea_orm(string_value = "Commercial")]
    Commercial,
    #[sea_orm(string_value = "Residential")]
    Residential,
}

/// A utility invoice for one of the building's main meters in one period.
/// Several invoices may exist per period and category; the water factor is
/// derived from their totals. Written by the invoice-ingestion flow, which
/// triggers a factor recompute after every mutation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "main_meter_invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub period_id: i32,
    /// Utility-side meter identifier, e.g. "MAIN-C1".
    pub meter_label: String,
    pub category: WaterCategory,
    /// Invoiced amount in whole currency units.
    pub amount: i64,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))")]
    pub consumption_m3: Decimal,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::billing_period::Entity",
        from = "Column::PeriodId",
        to = "super::billing_period::Column::Id",
        on_delete = "Restrict"
    )]
    BillingPeriod,
}

impl Related<super::billing_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingPeriod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
