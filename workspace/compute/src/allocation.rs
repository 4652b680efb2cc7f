use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, instrument};

use common::{
    AllocationLine, AllocationPreview, AllocationResult, PeriodCollectionTotal, PeriodRef,
    ReversalLine, ReversalResult,
};
use model::entities::cash_transaction::CashTransactionKind;
use model::entities::consolidated_expense::ExpenseStatus;
use model::entities::payment::PaymentStatus;
use model::entities::prelude::{
    BillingPeriod, ConsolidatedExpense, Owner, Payment, PaymentAllocation,
};
use model::entities::{
    billing_period, cash_transaction, consolidated_expense, payment, payment_allocation,
};

use crate::error::{BillingError, Result};

/// Applies a payment to the owner's outstanding expenses, oldest debt
/// first, until the payment is exhausted or nothing is left to settle.
///
/// Everything runs in one transaction with the payment and the candidate
/// expenses locked for update; a failure mid-loop leaves no partial state.
/// Exactly one income ledger entry records the amount actually applied.
/// A remainder beyond the owner's total debt is reported as credit and
/// never persisted.
#[instrument(skip(db))]
pub async fn allocate_payment(
    db: &DatabaseConnection,
    payment_id: i32,
    actor: &str,
) -> Result<AllocationResult> {
    let txn = db.begin().await?;
    let result = allocate_in_txn(&txn, payment_id, None, actor).await?;
    txn.commit().await?;
    info!(payment_id, allocated = result.allocated, "payment allocated");
    Ok(result)
}

/// Like [`allocate_payment`] but restricted to the owner's expense in one
/// period, for counters that settle a specific month's document.
#[instrument(skip(db))]
pub async fn allocate_payment_to_period(
    db: &DatabaseConnection,
    payment_id: i32,
    period_id: i32,
    actor: &str,
) -> Result<AllocationResult> {
    let txn = db.begin().await?;
    let result = allocate_in_txn(&txn, payment_id, Some(period_id), actor).await?;
    txn.commit().await?;
    info!(
        payment_id,
        period_id,
        allocated = result.allocated,
        "payment allocated to period"
    );
    Ok(result)
}

/// Reverses an active payment: every allocated amount is returned to its
/// expense, the allocation rows are deleted, the payment is cancelled and
/// one offsetting expense-kind ledger entry records the returned total.
/// A payment that is already cancelled cannot be reversed again.
#[instrument(skip(db, reason))]
pub async fn reverse_payment(
    db: &DatabaseConnection,
    payment_id: i32,
    reason: &str,
    actor: &str,
) -> Result<ReversalResult> {
    let txn = db.begin().await?;

    let payment = Payment::find_by_id(payment_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(BillingError::PaymentNotFound { payment_id })?;
    if payment.status == PaymentStatus::Cancelled {
        return Err(BillingError::PaymentAlreadyCancelled { payment_id });
    }

    let allocations = PaymentAllocation::find()
        .filter(payment_allocation::Column::PaymentId.eq(payment_id))
        .order_by_asc(payment_allocation::Column::Id)
        .all(&txn)
        .await?;

    let expense_ids: Vec<i32> = allocations.iter().map(|a| a.expense_id).collect();
    let mut expenses: BTreeMap<i32, consolidated_expense::Model> = ConsolidatedExpense::find()
        .filter(consolidated_expense::Column::Id.is_in(expense_ids))
        .order_by_asc(consolidated_expense::Column::Id)
        .lock_exclusive()
        .all(&txn)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();
    let periods = load_periods_for_update(
        &txn,
        expenses.values().map(|e| e.period_id).collect(),
    )
    .await?;

    let now = Utc::now().naive_utc();
    let mut lines = Vec::new();
    let mut touched: BTreeMap<i32, i64> = BTreeMap::new();
    let mut reversed = 0i64;

    for allocation in &allocations {
        let expense = expenses.get_mut(&allocation.expense_id).ok_or_else(|| {
            BillingError::Consistency(format!(
                "allocation {} references missing expense {}",
                allocation.id, allocation.expense_id
            ))
        })?;
        let new_paid = expense.paid_amount - allocation.amount;
        if new_paid < 0 {
            return Err(BillingError::Consistency(format!(
                "reversal would drive expense {} paid amount below zero",
                expense.id
            )));
        }
        let new_balance = expense.total_amount - new_paid;
        let status = derived_status(new_paid, new_balance);

        let mut active: consolidated_expense::ActiveModel = expense.clone().into();
        active.paid_amount = Set(new_paid);
        active.balance = Set(new_balance);
        active.status = Set(status);
        if status != ExpenseStatus::Paid {
            active.paid_at = Set(None);
        }
        active.update(&txn).await?;

        // Keep the in-memory copy current; a payment allocated to the same
        // expense in two calls carries two rows for it.
        expense.paid_amount = new_paid;
        expense.balance = new_balance;
        expense.status = status;

        lines.push(ReversalLine {
            expense_id: expense.id,
            period: period_ref_of(&periods, expense.period_id)?,
            amount_returned: allocation.amount,
            new_balance,
            status: format!("{status:?}"),
        });
        *touched.entry(expense.period_id).or_default() += allocation.amount;
        reversed += allocation.amount;
        debug!(expense_id = expense.id, returned = allocation.amount, "allocation reversed");
    }

    PaymentAllocation::delete_many()
        .filter(payment_allocation::Column::PaymentId.eq(payment_id))
        .exec(&txn)
        .await?;

    let mut active: payment::ActiveModel = payment.clone().into();
    active.status = Set(PaymentStatus::Cancelled);
    active.cancellation_reason = Set(Some(reason.to_string()));
    active.cancelled_by = Set(Some(actor.to_string()));
    active.cancelled_at = Set(Some(now));
    active.update(&txn).await?;

    let period_totals = bump_collected(&txn, &periods, &touched, -1).await?;

    let cash_transaction_id = if reversed > 0 {
        let cash = cash_transaction::ActiveModel {
            kind: Set(CashTransactionKind::Expense),
            amount: Set(reversed),
            date: Set(Utc::now().date_naive()),
            description: Set(format!(
                "Reversal of payment {} (receipt {}): {reason}",
                payment.id, payment.receipt_number
            )),
            payment_id: Set(Some(payment.id)),
            created_by: Set(actor.to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        Some(cash.id)
    } else {
        None
    };

    txn.commit().await?;
    info!(payment_id, reversed, "payment reversed");

    Ok(ReversalResult {
        payment_id: payment.id,
        owner_id: payment.owner_id,
        reversed,
        lines,
        period_totals,
        cash_transaction_id,
    })
}

/// Simulates the FIFO application of an amount against the owner's
/// outstanding expenses. Nothing is locked or persisted; the answer is a
/// snapshot of what [`allocate_payment`] would do right now.
#[instrument(skip(db))]
pub async fn preview_allocation(
    db: &DatabaseConnection,
    owner_id: i32,
    amount: i64,
) -> Result<AllocationPreview> {
    if amount <= 0 {
        return Err(BillingError::Validation(
            "amount must be positive".to_string(),
        ));
    }
    Owner::find_by_id(owner_id)
        .one(db)
        .await?
        .ok_or(BillingError::OwnerNotFound { owner_id })?;

    let candidates = ConsolidatedExpense::find()
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

    let period_ids: Vec<i32> = candidates.iter().map(|e| e.period_id).collect();
    let periods: BTreeMap<i32, billing_period::Model> = BillingPeriod::find()
        .filter(billing_period::Column::Id.is_in(period_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut remaining = amount;
    let mut lines = Vec::new();
    for expense in &candidates {
        if remaining == 0 {
            break;
        }
        let applied = remaining.min(expense.balance);
        let new_paid = expense.paid_amount + applied;
        let new_balance = expense.total_amount - new_paid;
        lines.push(AllocationLine {
            expense_id: expense.id,
            period: period_ref_of(&periods, expense.period_id)?,
            previous_balance: expense.balance,
            applied,
            new_balance,
            status: format!("{:?}", derived_status(new_paid, new_balance)),
        });
        remaining -= applied;
    }

    Ok(AllocationPreview {
        owner_id,
        amount,
        allocatable: amount - remaining,
        credit_remaining: remaining,
        lines,
    })
}

async fn allocate_in_txn(
    txn: &DatabaseTransaction,
    payment_id: i32,
    period_id: Option<i32>,
    actor: &str,
) -> Result<AllocationResult> {
    let payment = Payment::find_by_id(payment_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(BillingError::PaymentNotFound { payment_id })?;
    if payment.status != PaymentStatus::Active {
        return Err(BillingError::PaymentNotActive { payment_id });
    }

    // Amount still unallocated after earlier calls against this payment.
    let prior_allocated: i64 = PaymentAllocation::find()
        .filter(payment_allocation::Column::PaymentId.eq(payment_id))
        .all(txn)
        .await?
        .iter()
        .map(|a| a.amount)
        .sum();
    let mut remaining = payment.amount - prior_allocated;
    if remaining <= 0 {
        return Err(BillingError::PaymentFullyAllocated { payment_id });
    }

    let mut query = ConsolidatedExpense::find()
        .filter(consolidated_expense::Column::OwnerId.eq(payment.owner_id))
        .filter(consolidated_expense::Column::Balance.gt(0))
        .filter(
            consolidated_expense::Column::Status
                .is_not_in([ExpenseStatus::Paid, ExpenseStatus::Cancelled]),
        );
    if let Some(period_id) = period_id {
        query = query.filter(consolidated_expense::Column::PeriodId.eq(period_id));
    }
    // Oldest debt first; the id breaks ties between equal timestamps.
    let candidates = query
        .order_by_asc(consolidated_expense::Column::CreatedAt)
        .order_by_asc(consolidated_expense::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await?;
    if candidates.is_empty() {
        return Err(BillingError::NoOutstandingExpenses {
            owner_id: payment.owner_id,
        });
    }

    let periods =
        load_periods_for_update(txn, candidates.iter().map(|e| e.period_id).collect()).await?;

    let now = Utc::now().naive_utc();
    let mut lines = Vec::new();
    let mut touched: BTreeMap<i32, i64> = BTreeMap::new();

    for expense in candidates {
        if remaining == 0 {
            break;
        }
        let applied = remaining.min(expense.balance);
        let new_paid = expense.paid_amount + applied;
        let new_balance = expense.total_amount - new_paid;
        if new_balance < 0 {
            return Err(BillingError::Consistency(format!(
                "allocation would drive expense {} balance below zero",
                expense.id
            )));
        }
        let status = derived_status(new_paid, new_balance);

        payment_allocation::ActiveModel {
            payment_id: Set(payment.id),
            expense_id: Set(expense.id),
            amount: Set(applied),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        lines.push(AllocationLine {
            expense_id: expense.id,
            period: period_ref_of(&periods, expense.period_id)?,
            previous_balance: expense.balance,
            applied,
            new_balance,
            status: format!("{status:?}"),
        });
        *touched.entry(expense.period_id).or_default() += applied;
        remaining -= applied;

        let expense_id = expense.id;
        let mut active: consolidated_expense::ActiveModel = expense.into();
        active.paid_amount = Set(new_paid);
        active.balance = Set(new_balance);
        active.status = Set(status);
        if status == ExpenseStatus::Paid {
            active.paid_at = Set(Some(now));
        }
        active.update(txn).await?;
        debug!(expense_id, applied, new_balance, "allocation applied");
    }

    let allocated: i64 = lines.iter().map(|l| l.applied).sum();
    let period_totals = bump_collected(txn, &periods, &touched, 1).await?;

    let cash = cash_transaction::ActiveModel {
        kind: Set(CashTransactionKind::Income),
        amount: Set(allocated),
        date: Set(payment.payment_date),
        description: Set(format!(
            "Allocation of payment {} (receipt {})",
            payment.id, payment.receipt_number
        )),
        payment_id: Set(Some(payment.id)),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(AllocationResult {
        payment_id: payment.id,
        owner_id: payment.owner_id,
        payment_amount: payment.amount,
        allocated,
        credit_remaining: remaining,
        lines,
        period_totals,
        cash_transaction_id: cash.id,
    })
}

/// Status from the money fields alone: settled, partially paid or untouched.
fn derived_status(paid: i64, balance: i64) -> ExpenseStatus {
    if balance <= 0 {
        ExpenseStatus::Paid
    } else if paid > 0 {
        ExpenseStatus::Partial
    } else {
        ExpenseStatus::Pending
    }
}

/// Period rows the calculation will update, locked for the transaction.
async fn load_periods_for_update(
    txn: &DatabaseTransaction,
    period_ids: Vec<i32>,
) -> Result<BTreeMap<i32, billing_period::Model>> {
    let rows = BillingPeriod::find()
        .filter(billing_period::Column::Id.is_in(period_ids))
        .order_by_asc(billing_period::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

fn period_ref_of(
    periods: &BTreeMap<i32, billing_period::Model>,
    period_id: i32,
) -> Result<PeriodRef> {
    periods
        .get(&period_id)
        .map(|p| PeriodRef::new(p.year, p.month))
        .ok_or_else(|| {
            BillingError::Consistency(format!("billing period {period_id} missing"))
        })
}

async fn bump_collected(
    txn: &DatabaseTransaction,
    periods: &BTreeMap<i32, billing_period::Model>,
    touched: &BTreeMap<i32, i64>,
    sign: i64,
) -> Result<Vec<PeriodCollectionTotal>> {
    let mut totals = Vec::with_capacity(touched.len());
    for (period_id, delta) in touched {
        let period = periods.get(period_id).ok_or_else(|| {
            BillingError::Consistency(format!("billing period {period_id} missing"))
        })?;
        let new_total = period.total_collected + sign * delta;
        if new_total < 0 {
            return Err(BillingError::Consistency(format!(
                "period {period_id} collected total would go negative"
            )));
        }
        let mut active: billing_period::ActiveModel = period.clone().into();
        active.total_collected = Set(new_total);
        active.update(txn).await?;
        totals.push(PeriodCollectionTotal {
            period_id: *period_id,
            period: PeriodRef::new(period.year, period.month),
            total_collected: new_total,
        });
    }
    Ok(totals)
}
