use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{billing_period, cash_transaction, consolidated_expense, owner, payment, payment_allocation};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payment::table())
                    .if_not_exists()
                    .col(pk_auto(Payment::column(payment::Column::Id)))
                    .col(
                        big_integer(Payment::column(payment::Column::ReceiptNumber)).unique_key(),
                    )
                    .col(integer(Payment::column(payment::Column::OwnerId)))
                    .col(big_integer(Payment::column(payment::Column::Amount)))
                    .col(date(Payment::column(payment::Column::PaymentDate)))
                    .col(integer_null(Payment::column(payment::Column::PeriodId)))
                    .col(string_null(Payment::column(payment::Column::Reference)))
                    .col(string(Payment::column(payment::Column::Status)).string_len(20))
                    .col(string_null(Payment::column(payment::Column::CancellationReason)))
                    .col(string_null(Payment::column(payment::Column::CancelledBy)))
                    .col(timestamp_null(Payment::column(payment::Column::CancelledAt)))
                    .col(string(Payment::column(payment::Column::CreatedBy)))
                    .col(
                        timestamp(Payment::column(payment::Column::CreatedAt))
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_owner")
                            .from(Payment::table(), Payment::column(payment::Column::OwnerId))
                            .to(Owner::table(), Owner::column(owner::Column::Id))
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_period")
                            .from(Payment::table(), Payment::column(payment::Column::PeriodId))
                            .to(
                                BillingPeriod::table(),
                                BillingPeriod::column(billing_period::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payment_allocations table
        manager
            .create_table(
                Table::create()
                    .table(PaymentAllocation::table())
                    .if_not_exists()
                    .col(pk_auto(PaymentAllocation::column(
                        payment_allocation::Column::Id,
                    )))
                    .col(integer(PaymentAllocation::column(
                        payment_allocation::Column::PaymentId,
                    )))
                    .col(integer(PaymentAllocation::column(
                        payment_allocation::Column::ExpenseId,
                    )))
                    .col(big_integer(PaymentAllocation::column(
                        payment_allocation::Column::Amount,
                    )))
                    .col(
                        timestamp(PaymentAllocation::column(
                            payment_allocation::Column::CreatedAt,
                        ))
                        .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_allocations_payment")
                            .from(
                                PaymentAllocation::table(),
                                PaymentAllocation::column(payment_allocation::Column::PaymentId),
                            )
                            .to(Payment::table(), Payment::column(payment::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_allocations_expense")
                            .from(
                                PaymentAllocation::table(),
                                PaymentAllocation::column(payment_allocation::Column::ExpenseId),
                            )
                            .to(
                                ConsolidatedExpense::table(),
                                ConsolidatedExpense::column(consolidated_expense::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create cash_transactions table (append-only ledger)
        manager
            .create_table(
                Table::create()
                    .table(CashTransaction::table())
                    .if_not_exists()
                    .col(pk_auto(CashTransaction::column(
                        cash_transaction::Column::Id,
                    )))
                    .col(
                        string(CashTransaction::column(cash_transaction::Column::Kind))
                            .string_len(20),
                    )
                    .col(big_integer(CashTransaction::column(
                        cash_transaction::Column::Amount,
                    )))
                    .col(date(CashTransaction::column(cash_transaction::Column::Date)))
                    .col(string(CashTransaction::column(
                        cash_transaction::Column::Description,
                    )))
                    .col(integer_null(CashTransaction::column(
                        cash_transaction::Column::PaymentId,
                    )))
                    .col(string(CashTransaction::column(
                        cash_transaction::Column::CreatedBy,
                    )))
                    .col(
                        timestamp(CashTransaction::column(cash_transaction::Column::CreatedAt))
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cash_transactions_payment")
                            .from(
                                CashTransaction::table(),
                                CashTransaction::column(cash_transaction::Column::PaymentId),
                            )
                            .to(Payment::table(), Payment::column(payment::Column::Id))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CashTransaction::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentAllocation::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payment::table()).to_owned())
            .await?;

        Ok(())
    }
}
