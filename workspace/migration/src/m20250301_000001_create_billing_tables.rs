use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create billing_periods table
        manager
            .create_table(
                Table::create()
                    .table(BillingPeriods::Table)
                    .if_not_exists()
                    .col(pk_auto(BillingPeriods::Id))
                    .col(integer(BillingPeriods::Year))
                    .col(integer(BillingPeriods::Month))
                    .col(string(BillingPeriods::Status).string_len(20))
                    .col(big_integer(BillingPeriods::TotalGenerated).default(0))
                    .col(big_integer(BillingPeriods::TotalCollected).default(0))
                    .col(timestamp_null(BillingPeriods::ClosedAt))
                    .to_owned(),
            )
            .await?;

        // One period per calendar month
        manager
            .create_index(
                Index::create()
                    .name("idx_billing_periods_year_month")
                    .table(BillingPeriods::Table)
                    .col(BillingPeriods::Year)
                    .col(BillingPeriods::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create owners table
        manager
            .create_table(
                Table::create()
                    .table(Owners::Table)
                    .if_not_exists()
                    .col(pk_auto(Owners::Id))
                    .col(string(Owners::FullName))
                    .col(string_null(Owners::Email))
                    .col(string_null(Owners::Phone))
                    .col(boolean(Owners::Active).default(true))
                    .to_owned(),
            )
            .await?;

        // Create properties table
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(pk_auto(Properties::Id))
                    .col(string(Properties::Code).unique_key())
                    .col(string(Properties::Category).string_len(20))
                    .col(decimal(Properties::AreaM2).decimal_len(10, 2))
                    .col(boolean(Properties::RequiresMeter))
                    .col(boolean(Properties::Active).default(true))
                    .to_owned(),
            )
            .await?;

        // Create category_factors table
        manager
            .create_table(
                Table::create()
                    .table(CategoryFactors::Table)
                    .if_not_exists()
                    .col(pk_auto(CategoryFactors::Id))
                    .col(string(CategoryFactors::Category).string_len(20))
                    .col(decimal(CategoryFactors::Rate).decimal_len(16, 4))
                    .col(date(CategoryFactors::ValidFrom))
                    .col(date_null(CategoryFactors::ValidTo))
                    .col(boolean(CategoryFactors::Active).default(true))
                    .to_owned(),
            )
            .await?;

        // Create ownerships table
        manager
            .create_table(
                Table::create()
                    .table(Ownerships::Table)
                    .if_not_exists()
                    .col(pk_auto(Ownerships::Id))
                    .col(integer(Ownerships::OwnerId))
                    .col(integer(Ownerships::PropertyId))
                    .col(date(Ownerships::ValidFrom))
                    .col(date_null(Ownerships::ValidTo))
                    .col(boolean(Ownerships::IsPrincipal).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ownerships_owner")
                            .from(Ownerships::Table, Ownerships::OwnerId)
                            .to(Owners::Table, Owners::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ownerships_property")
                            .from(Ownerships::Table, Ownerships::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create meters table
        manager
            .create_table(
                Table::create()
                    .table(Meters::Table)
                    .if_not_exists()
                    .col(pk_auto(Meters::Id))
                    .col(string(Meters::Serial).unique_key())
                    .col(integer_null(Meters::PropertyId))
                    .col(boolean(Meters::Active).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meters_property")
                            .from(Meters::Table, Meters::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create meter_readings table
        manager
            .create_table(
                Table::create()
                    .table(MeterReadings::Table)
                    .if_not_exists()
                    .col(pk_auto(MeterReadings::Id))
                    .col(integer(MeterReadings::MeterId))
                    .col(integer(MeterReadings::PeriodId))
                    .col(decimal(MeterReadings::Value).decimal_len(12, 3))
                    .col(decimal_null(MeterReadings::PreviousValue).decimal_len(12, 3))
                    .col(decimal_null(MeterReadings::Consumption).decimal_len(12, 3))
                    .col(string_null(MeterReadings::SubmittedBy))
                    .col(timestamp(MeterReadings::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meter_readings_meter")
                            .from(MeterReadings::Table, MeterReadings::MeterId)
                            .to(Meters::Table, Meters::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meter_readings_period")
                            .from(MeterReadings::Table, MeterReadings::PeriodId)
                            .to(BillingPeriods::Table, BillingPeriods::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One reading per meter per period
        manager
            .create_index(
                Index::create()
                    .name("idx_meter_readings_meter_period")
                    .table(MeterReadings::Table)
                    .col(MeterReadings::MeterId)
                    .col(MeterReadings::PeriodId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create main_meter_invoices table
        manager
            .create_table(
                Table::create()
                    .table(MainMeterInvoices::Table)
                    .if_not_exists()
                    .col(pk_auto(MainMeterInvoices::Id))
                    .col(integer(MainMeterInvoices::PeriodId))
                    .col(string(MainMeterInvoices::MeterLabel))
                    .col(string(MainMeterInvoices::Category).string_len(20))
                    .col(big_integer(MainMeterInvoices::Amount))
                    .col(decimal(MainMeterInvoices::ConsumptionM3).decimal_len(12, 3))
                    .col(timestamp(MainMeterInvoices::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_main_meter_invoices_period")
                            .from(MainMeterInvoices::Table, MainMeterInvoices::PeriodId)
                            .to(BillingPeriods::Table, BillingPeriods::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create water_factors table
        manager
            .create_table(
                Table::create()
                    .table(WaterFactors::Table)
                    .if_not_exists()
                    .col(pk_auto(WaterFactors::Id))
                    .col(integer(WaterFactors::PeriodId).unique_key())
                    .col(decimal_null(WaterFactors::FactorCommercial).decimal_len(16, 6))
                    .col(decimal_null(WaterFactors::FactorResidential).decimal_len(16, 6))
                    .col(big_integer(WaterFactors::CommercialAmount))
                    .col(decimal(WaterFactors::CommercialConsumption).decimal_len(12, 3))
                    .col(big_integer(WaterFactors::ResidentialAmount))
                    .col(decimal(WaterFactors::ResidentialConsumption).decimal_len(12, 3))
                    .col(timestamp(WaterFactors::ComputedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_water_factors_period")
                            .from(WaterFactors::Table, WaterFactors::PeriodId)
                            .to(BillingPeriods::Table, BillingPeriods::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create consolidated_expenses table
        manager
            .create_table(
                Table::create()
                    .table(ConsolidatedExpenses::Table)
                    .if_not_exists()
                    .col(pk_auto(ConsolidatedExpenses::Id))
                    .col(integer(ConsolidatedExpenses::PeriodId))
                    .col(integer(ConsolidatedExpenses::OwnerId))
                    .col(integer_null(ConsolidatedExpenses::PrimaryPropertyId))
                    .col(big_integer(ConsolidatedExpenses::BaseAmount))
                    .col(big_integer(ConsolidatedExpenses::WaterAmount))
                    .col(big_integer(ConsolidatedExpenses::OtherAmount).default(0))
                    .col(big_integer(ConsolidatedExpenses::PreviousDebt))
                    .col(big_integer(ConsolidatedExpenses::TotalAmount))
                    .col(big_integer(ConsolidatedExpenses::PaidAmount).default(0))
                    .col(big_integer(ConsolidatedExpenses::Balance))
                    .col(string(ConsolidatedExpenses::Status).string_len(20))
                    .col(date(ConsolidatedExpenses::DueDate))
                    .col(timestamp_null(ConsolidatedExpenses::PaidAt))
                    .col(string(ConsolidatedExpenses::GeneratedBy))
                    .col(
                        timestamp(ConsolidatedExpenses::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consolidated_expenses_period")
                            .from(ConsolidatedExpenses::Table, ConsolidatedExpenses::PeriodId)
                            .to(BillingPeriods::Table, BillingPeriods::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consolidated_expenses_owner")
                            .from(ConsolidatedExpenses::Table, ConsolidatedExpenses::OwnerId)
                            .to(Owners::Table, Owners::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consolidated_expenses_primary_property")
                            .from(
                                ConsolidatedExpenses::Table,
                                ConsolidatedExpenses::PrimaryPropertyId,
                            )
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Exactly one consolidated expense per (period, owner); generation
        // relies on this as its idempotency backstop.
        manager
            .create_index(
                Index::create()
                    .name("idx_consolidated_expenses_period_owner")
                    .table(ConsolidatedExpenses::Table)
                    .col(ConsolidatedExpenses::PeriodId)
                    .col(ConsolidatedExpenses::OwnerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create expense_details table
        manager
            .create_table(
                Table::create()
                    .table(ExpenseDetails::Table)
                    .if_not_exists()
                    .col(pk_auto(ExpenseDetails::Id))
                    .col(integer(ExpenseDetails::ExpenseId))
                    .col(integer(ExpenseDetails::PropertyId))
                    .col(string(ExpenseDetails::Category).string_len(20))
                    .col(decimal(ExpenseDetails::AreaM2).decimal_len(10, 2))
                    .col(decimal(ExpenseDetails::BaseRate).decimal_len(16, 4))
                    .col(big_integer(ExpenseDetails::BaseAmount))
                    .col(decimal_null(ExpenseDetails::WaterFactor).decimal_len(16, 6))
                    .col(decimal_null(ExpenseDetails::Consumption).decimal_len(12, 3))
                    .col(decimal_null(ExpenseDetails::CurrentReading).decimal_len(12, 3))
                    .col(decimal_null(ExpenseDetails::PreviousReading).decimal_len(12, 3))
                    .col(big_integer(ExpenseDetails::WaterAmount))
                    .col(string_null(ExpenseDetails::Note))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_details_expense")
                            .from(ExpenseDetails::Table, ExpenseDetails::ExpenseId)
                            .to(ConsolidatedExpenses::Table, ConsolidatedExpenses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_details_property")
                            .from(ExpenseDetails::Table, ExpenseDetails::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order of creation
        manager
            .drop_table(Table::drop().table(ExpenseDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ConsolidatedExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WaterFactors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MainMeterInvoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MeterReadings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Meters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ownerships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CategoryFactors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Owners::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillingPeriods::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum BillingPeriods {
    Table,
    Id,
    Year,
    Month,
    Status,
    TotalGenerated,
    TotalCollected,
    ClosedAt,
}

#[derive(DeriveIden)]
enum Owners {
    Table,
    Id,
    FullName,
    Email,
    Phone,
    Active,
}

#[derive(DeriveIden)]
enum Properties {
    Table,
    Id,
    Code,
    Category,
    AreaM2,
    RequiresMeter,
    Active,
}

#[derive(DeriveIden)]
enum CategoryFactors {
    Table,
    Id,
    Category,
    Rate,
    ValidFrom,
    ValidTo,
    Active,
}

#[derive(DeriveIden)]
enum Ownerships {
    Table,
    Id,
    OwnerId,
    PropertyId,
    ValidFrom,
    ValidTo,
    IsPrincipal,
}

#[derive(DeriveIden)]
enum Meters {
    Table,
    Id,
    Serial,
    PropertyId,
    Active,
}

#[derive(DeriveIden)]
enum MeterReadings {
    Table,
    Id,
    MeterId,
    PeriodId,
    Value,
    PreviousValue,
    Consumption,
    SubmittedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MainMeterInvoices {
    Table,
    Id,
    PeriodId,
    MeterLabel,
    Category,
    Amount,
    ConsumptionM3,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WaterFactors {
    Table,
    Id,
    PeriodId,
    FactorCommercial,
    FactorResidential,
    CommercialAmount,
    CommercialConsumption,
    ResidentialAmount,
    ResidentialConsumption,
    ComputedAt,
}

#[derive(DeriveIden)]
enum ConsolidatedExpenses {
    Table,
    Id,
    PeriodId,
    OwnerId,
    PrimaryPropertyId,
    BaseAmount,
    WaterAmount,
    OtherAmount,
    PreviousDebt,
    TotalAmount,
    PaidAmount,
    Balance,
    Status,
    DueDate,
    PaidAt,
    GeneratedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ExpenseDetails {
    Table,
    Id,
    ExpenseId,
    PropertyId,
    Category,
    AreaM2,
    BaseRate,
    BaseAmount,
    WaterFactor,
    Consumption,
    CurrentReading,
    PreviousReading,
    WaterAmount,
    Note,
}
