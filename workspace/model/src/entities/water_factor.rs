use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Per-period snapshot of the derived water cost factors, one row per
/// period, overwritten on every recompute. A `None` factor means the
/// category's invoiced consumption was zero and water cannot be billed for
/// it. The source totals are kept alongside for audit.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "water_factors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub period_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 6)))", nullable)]
    pub factor_commercial: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 6)))", nullable)]
    pub factor_residential: Option<Decimal>,
    pub commercial_amount: i64,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))")]
    pub commercial_consumption: Decimal,
    pub residential_amount: i64,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))")]
    pub residential_consumption: Decimal,
    pub computed_at: NaiveDateTime,
}

impl Model {
    /// Factor applicable to a property category; metered categories only.
    pub fn factor_for(&self, category: super::property::PropertyCategory) -> Option<Decimal> {
        match category {
            super::property::PropertyCategory::Commercial => self.factor_commercial,
            super::property::PropertyCategory::Residential => self.factor_residential,
            super::property::PropertyCategory::Other => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::billing_period::Entity",
        from = "Column::PeriodId",
        to = "super::billing_period::Column::Id",
        on_delete = "Cascade"
    )]
    BillingPeriod,
}

impl Related<super::billing_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingPeriod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
