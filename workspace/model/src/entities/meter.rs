use sea_orm::entity::prelude::*;

/// A water meter. Attached either to exactly one property or to a meter
/// group shared by several properties, never both.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub serial: String,
    pub property_id: Option<i32>,
    pub group_id: Option<i32>,
    #[sea_orm(default_value = "true")]
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
    #[sea_orm(
        belongs_to = "super::meter_group::Entity",
        from = "Column::GroupId",
        to = "super::meter_group::Column::Id",
        on_delete = "SetNull"
    )]
    MeterGroup,
    #[sea_orm(has_many = "super::meter_reading::Entity")]
    MeterReading,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::meter_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterGroup.def()
    }
}

impl Related<super::meter_reading::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterReading.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
