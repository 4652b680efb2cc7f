use sea_orm::entity::prelude::*;

/// How a shared meter's consumption is distributed among the group's member
/// properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProrationMethod {
    #[sea_orm(string_value = "EqualSplit")]
    EqualSplit,
    /// Proportional to each member's floor area.
    #[sea_orm(string_value = "ByArea")]
    ByArea,
    /// Per-member percentages that must sum to 100 ± 0.01.
    #[sea_orm(string_value = "CustomPercent")]
    CustomPercent,
}

/// A group of properties billed from one shared water meter.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meter_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub method: ProrationMethod,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::meter::Entity")]
    Meter,
    #[sea_orm(has_many = "super::meter_group_member::Entity")]
    MeterGroupMember,
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
