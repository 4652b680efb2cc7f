use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Membership of a property in a shared-meter group.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meter_group_members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub group_id: i32,
    #[sea_orm(primary_key)]
    pub property_id: i32,
    /// Share of the group's consumption, required for CustomPercent groups.
    #[sea_orm(column_type = "Decimal(Some((7, 4)))", nullable)]
    pub percentage: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meter_group::Entity",
        from = "Column::GroupId",
        to = "super::meter_group::Column::Id",
        on_delete = "Cascade"
    )]
    MeterGroup,
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
}

impl Related<super::meter_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterGroup.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
