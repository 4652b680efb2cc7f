use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{meter_group, meter_group_member, property};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create meter_groups table
        manager
            .create_table(
                Table::create()
                    .table(MeterGroup::table())
                    .if_not_exists()
                    .col(pk_auto(MeterGroup::column(meter_group::Column::Id)))
                    .col(string(MeterGroup::column(meter_group::Column::Name)))
                    .col(string(MeterGroup::column(meter_group::Column::Method)).string_len(20))
                    .to_owned(),
            )
            .await?;

        // Create meter_group_members table (join table)
        manager
            .create_table(
                Table::create()
                    .table(MeterGroupMember::table())
                    .if_not_exists()
                    .col(integer(MeterGroupMember::column(
                        meter_group_member::Column::GroupId,
                    )))
                    .col(integer(MeterGroupMember::column(
                        meter_group_member::Column::PropertyId,
                    )))
                    .col(
                        decimal_null(MeterGroupMember::column(
                            meter_group_member::Column::Percentage,
                        ))
                        .decimal_len(7, 4),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_meter_group_members")
                            .col(MeterGroupMember::column(meter_group_member::Column::GroupId))
                            .col(MeterGroupMember::column(
                                meter_group_member::Column::PropertyId,
                            )),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meter_group_members_group")
                            .from(
                                MeterGroupMember::table(),
                                MeterGroupMember::column(meter_group_member::Column::GroupId),
                            )
                            .to(
                                MeterGroup::table(),
                                MeterGroup::column(meter_group::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meter_group_members_property")
                            .from(
                                MeterGroupMember::table(),
                                MeterGroupMember::column(meter_group_member::Column::PropertyId),
                            )
                            .to(
                                Property::table(),
                                Property::column(property::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Shared meters hang off the group instead of a single property.
        // Plain column without a constraint so the alter also works on SQLite.
        manager
            .alter_table(
                Table::alter()
                    .table(Alias::new("meters"))
                    .add_column(ColumnDef::new(Alias::new("group_id")).integer().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Alias::new("meters"))
                    .drop_column(Alias::new("group_id"))
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(MeterGroupMember::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MeterGroup::table()).to_owned())
            .await
    }
}
