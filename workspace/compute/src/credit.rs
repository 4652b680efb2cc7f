use chrono::Datelike;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::instrument;

use common::{CreditSummary, ExpenseSummary, OwnerDebtSummary, PeriodRef};
use model::entities::consolidated_expense::ExpenseStatus;
use model::entities::payment::PaymentStatus;
use model::entities::prelude::{BillingPeriod, ConsolidatedExpense, Owner, Payment};
use model::entities::{consolidated_expense, payment};

use crate::error::{BillingError, Result};

/// Net credit position of an owner strictly before a reference period.
///
/// Credit is never stored; it is the excess of active payments linked to
/// earlier periods over the amounts billed for those periods, floored at
/// zero. A payment without an explicit period link counts under its
/// payment date.
#[instrument(skip(db))]
pub async fn available_credit(
    db: &DatabaseConnection,
    owner_id: i32,
    reference: PeriodRef,
) -> Result<CreditSummary> {
    Owner::find_by_id(owner_id)
        .one(db)
        .await?
        .ok_or(BillingError::OwnerNotFound { owner_id })?;

    let payments = Payment::find()
        .find_also_related(BillingPeriod)
        .filter(payment::Column::OwnerId.eq(owner_id))
        .filter(payment::Column::Status.eq(PaymentStatus::Active))
        .all(db)
        .await?;
    let paid_before: i64 = payments
        .iter()
        .filter(|(p, period)| linked_period(p, period.as_ref()) < reference)
        .map(|(p, _)| p.amount)
        .sum();

    let expenses = ConsolidatedExpense::find()
        .find_also_related(BillingPeriod)
        .filter(consolidated_expense::Column::OwnerId.eq(owner_id))
        .filter(consolidated_expense::Column::Status.ne(ExpenseStatus::Cancelled))
        .all(db)
        .await?;
    let mut billed_before = 0i64;
    for (expense, period) in &expenses {
        let period = period.as_ref().ok_or_else(|| {
            BillingError::Consistency(format!(
                "expense {} references missing period {}",
                expense.id, expense.period_id
            ))
        })?;
        if PeriodRef::new(period.year, period.month) < reference {
            billed_before += expense.total_amount;
        }
    }

    Ok(CreditSummary {
        owner_id,
        reference,
        paid_before,
        billed_before,
        available_credit: (paid_before - billed_before).max(0),
    })
}

/// All outstanding expenses of an owner, oldest first, plus their sum.
#[instrument(skip(db))]
pub async fn owner_debt_summary(
    db: &DatabaseConnection,
    owner_id: i32,
) -> Result<OwnerDebtSummary> {
    Owner::find_by_id(owner_id)
        .one(db)
        .await?
        .ok_or(BillingError::OwnerNotFound { owner_id })?;

    let rows = ConsolidatedExpense::find()
        .find_also_related(BillingPeriod)
        .filter(consolidated_expense::Column::OwnerId.eq(owner_id))
        .filter(consolidated_expense::Column::Balance.gt(0))
        .filter(
            consolidated_expense::Column::Status
                .is_not_in([ExpenseStatus::Paid, ExpenseStatus::Cancelled]),
        )
        .order_by_asc(consolidated_expense::Column::CreatedAt)
        .order_by_asc(consolidated_expense::Column::Id)
        .all(db)
        .await?;

    let mut expenses = Vec::with_capacity(rows.len());
    let mut total_debt = 0i64;
    for (expense, period) in rows {
        let period = period.ok_or_else(|| {
            BillingError::Consistency(format!(
                "expense {} references missing period {}",
                expense.id, expense.period_id
            ))
        })?;
        total_debt += expense.balance;
        expenses.push(ExpenseSummary {
            expense_id: expense.id,
            period: PeriodRef::new(period.year, period.month),
            due_date: expense.due_date,
            total_amount: expense.total_amount,
            paid_amount: expense.paid_amount,
            balance: expense.balance,
            status: format!("{:?}", expense.status),
        });
    }

    Ok(OwnerDebtSummary {
        owner_id,
        total_debt,
        expenses,
    })
}

/// The period a payment counts under: its explicit link when present,
/// otherwise the calendar month of the payment date.
fn linked_period(
    payment: &payment::Model,
    period: Option<&model::entities::billing_period::Model>,
) -> PeriodRef {
    match period {
        Some(p) => PeriodRef::new(p.year, p.month),
        None => PeriodRef::new(
            payment.payment_date.year(),
            payment.payment_date.month() as i32,
        ),
    }
}
