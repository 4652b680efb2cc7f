use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

/// Links an owner to a property over a half-open validity interval.
/// `valid_to = None` means the ownership is currently active. A property has
/// at most one principal row with an open interval at any time; the
/// ingestion flow enforces that invariant at write time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ownerships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    pub property_id: i32,
    pub valid_from: NaiveDate,
    /// Exclusive end of the interval; open-ended while `None`.
    pub valid_to: Option<NaiveDate>,
    /// The principal holder receives the consolidated expense for the
    /// property and its carried debt.
    #[sea_orm(default_value = "true")]
    pub is_principal: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::owner::Entity",
        from = "Column::OwnerId",
        to = "super::owner::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
}

impl Related<super::owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
