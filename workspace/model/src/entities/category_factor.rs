use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::property::PropertyCategory;

/// The configured base-expense rate (currency per m²) for a property
/// category, valid over a half-open date interval. The generator picks the
/// active row valid at the period's first day, latest `valid_from` first,
/// and falls back to a caller-supplied default when none matches.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "category_factors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category: PropertyCategory,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub rate: Decimal,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    #[sea_orm(default_value = "true")]
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
