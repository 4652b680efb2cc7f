use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;

/// Lifecycle state of a billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PeriodStatus {
    /// Accepting invoices, readings and expense generation.
    #[sea_orm(string_value = "Open")]
    Open,
    /// Locked for new expense generation; existing debt is still collectible.
    #[sea_orm(string_value = "Closed")]
    Closed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// One billing cycle, identified by calendar year and month.
/// Periods are opened and closed by an external lifecycle flow; the engine
/// reads the status and maintains the two running totals.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "billing_periods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub year: i32,
    /// Calendar month, 1-12. Unique together with `year`.
    pub month: i32,
    pub status: PeriodStatus,
    /// Sum of the total amounts of expenses generated for this period.
    #[sea_orm(default_value = "0")]
    pub total_generated: i64,
    /// Sum of payment amounts allocated against this period's expenses.
    #[sea_orm(default_value = "0")]
    pub total_collected: i64,
    pub closed_at: Option<NaiveDateTime>,
}

impl Model {
    /// First calendar day of the period. `None` if the stored month is out
    /// of range, which the engine reports as invalid reference data.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month as u32, 1)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::consolidated_expense::Entity")]
    ConsolidatedExpense,
    #[sea_orm(has_many = "super::meter_reading::Entity")]
    MeterReading,
    #[sea_orm(has_many = "super::main_meter_invoice::Entity")]
    MainMeterInvoice,
    #[sea_orm(has_many = "super::water_factor::Entity")]
    WaterFactor,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<super::consolidated_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsolidatedExpense.def()
    }
}

impl Related<super::meter_reading::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterReading.def()
    }
}

impl Related<super::main_meter_invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MainMeterInvoice.def()
    }
}

impl Related<super::water_factor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WaterFactor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
