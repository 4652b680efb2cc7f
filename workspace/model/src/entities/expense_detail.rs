use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::property::PropertyCategory;

/// Audit breakdown of one property's contribution to a consolidated
/// expense: the rate and factor applied, the reading snapshot, and the
/// rounded sub-amounts. Owned by its expense and deleted with it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub expense_id: i32,
    pub property_id: i32,
    pub category: PropertyCategory,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub area_m2: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub base_rate: Decimal,
    pub base_amount: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 6)))", nullable)]
    pub water_factor: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))", nullable)]
    pub consumption: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))", nullable)]
    pub current_reading: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))", nullable)]
    pub previous_reading: Option<Decimal>,
    pub water_amount: i64,
    /// Data-quality notes from consumption resolution (missing meter,
    /// missing reading, undefined factor).
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::consolidated_expense::Entity",
        from = "Column::ExpenseId",
        to = "super::consolidated_expense::Column::Id",
        on_delete = "Cascade"
    )]
    ConsolidatedExpense,
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Restrict"
    )]
    Property,
}

impl Related<super::consolidated_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsolidatedExpense.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
