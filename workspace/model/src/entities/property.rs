use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Billing category of a property. Commercial and residential units pay
/// category-specific base and water rates; `Other` covers storage rooms,
/// parking slots and similar units that are never water-metered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PropertyCategory {
    #[sea_orm(string_value = "Commercial")]
    Commercial,
    #[sea_orm(string_value = "Residential")]
    Residential,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// A billable unit of the building. Static reference data maintained by an
/// external CRUD flow.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Human-facing unit code, e.g. "A-101".
    #[sea_orm(unique)]
    pub code: String,
    pub category: PropertyCategory,
    /// Floor area in m², the base-expense proration weight.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub area_m2: Decimal,
    /// Whether this unit is expected to have a water meter. Categories that
    /// never meter water (storage, parking) set this false.
    pub requires_meter: bool,
    #[sea_orm(default_value = "true")]
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ownership::Entity")]
    Ownership,
    #[sea_orm(has_many = "super::meter::Entity")]
    Meter,
    #[sea_orm(has_many = "super::expense_detail::Entity")]
    ExpenseDetail,
    #[sea_orm(has_many = "super::meter_group_member::Entity")]
    MeterGroupMember,
}

impl Related<super::ownership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ownership.def()
    }
}

impl Related<super::meter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meter.def()
    }
}

impl Related<super::meter_group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterGroupMember.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
