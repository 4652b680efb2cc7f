use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A billing period identified by calendar year and month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord)]
pub struct PeriodRef {
    pub year: i32,
    pub month: i32,
}

impl PeriodRef {
    pub fn new(year: i32, month: i32) -> Self {
        Self { year, month }
    }

    /// "YYYY-MM" label for messages and logs.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

// ===================== Water factors =====================

/// Per-period snapshot of the derived water cost factors, including the
/// invoice totals they were computed from. A `None` factor means the
/// category had zero invoiced consumption and cannot be billed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WaterFactorSnapshot {
    pub period_id: i32,
    pub period: PeriodRef,
    /// Currency per m³ for commercial properties, 6 decimal places.
    pub factor_commercial: Option<Decimal>,
    /// Currency per m³ for residential properties, 6 decimal places.
    pub factor_residential: Option<Decimal>,
    pub commercial_amount: i64,
    pub commercial_consumption: Decimal,
    pub residential_amount: i64,
    pub residential_consumption: Decimal,
    pub computed_at: DateTime<Utc>,
}

// ===================== Expense generation =====================

/// Outcome of one expense-generation run over a period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GenerationReport {
    pub period_id: i32,
    pub period: PeriodRef,
    /// Owners for whom a consolidated expense was created in this run.
    pub created: usize,
    /// Owners skipped because their expense already existed (or they had no
    /// billable properties).
    pub skipped: usize,
    /// Human-readable failure description per failed owner; failures never
    /// abort the rest of the run.
    pub errors: Vec<String>,
    /// Sum of the created expenses' total amounts.
    pub amount_generated: i64,
}

/// What-if computation for a single property, same math as generation but
/// nothing persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ExpensePreview {
    pub property_id: i32,
    pub property_code: String,
    pub period: PeriodRef,
    pub category: String,
    pub area_m2: Decimal,
    /// Base rate applied (configured factor or caller default).
    pub base_rate: Decimal,
    pub base_amount: i64,
    pub water_factor: Option<Decimal>,
    pub consumption: Option<Decimal>,
    pub water_amount: i64,
    /// Carried debt of the property's principal owner, when one exists.
    pub previous_debt: i64,
    pub total_amount: i64,
    /// Data-quality notes collected while resolving consumption.
    pub notes: Vec<String>,
}

// ===================== Payment allocation =====================

/// One expense touched by an allocation, oldest debt first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AllocationLine {
    pub expense_id: i32,
    pub period: PeriodRef,
    pub previous_balance: i64,
    pub applied: i64,
    pub new_balance: i64,
    /// Expense status after the application.
    pub status: String,
}

/// Collection total of one period after an allocation or reversal touched
/// expenses belonging to it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PeriodCollectionTotal {
    pub period_id: i32,
    pub period: PeriodRef,
    pub total_collected: i64,
}

/// Result of applying one payment against an owner's outstanding expenses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AllocationResult {
    pub payment_id: i32,
    pub owner_id: i32,
    pub payment_amount: i64,
    /// Amount actually applied to expenses in this call.
    pub allocated: i64,
    /// Payment remainder exceeding all outstanding debt. Reported only;
    /// the credit ledger recomputes it on demand.
    pub credit_remaining: i64,
    pub lines: Vec<AllocationLine>,
    /// Updated collection totals for every period touched.
    pub period_totals: Vec<PeriodCollectionTotal>,
    /// Ledger entry recorded for the allocated amount.
    pub cash_transaction_id: i32,
}

/// FIFO simulation of an allocation, computed against current balances
/// without persisting anything.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AllocationPreview {
    pub owner_id: i32,
    pub amount: i64,
    /// Portion of `amount` that current outstanding expenses would absorb.
    pub allocatable: i64,
    pub credit_remaining: i64,
    pub lines: Vec<AllocationLine>,
}

/// One expense restored by a payment reversal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReversalLine {
    pub expense_id: i32,
    pub period: PeriodRef,
    pub amount_returned: i64,
    pub new_balance: i64,
    pub status: String,
}

/// Result of reversing a payment's allocations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReversalResult {
    pub payment_id: i32,
    pub owner_id: i32,
    /// Total amount returned to expense balances.
    pub reversed: i64,
    pub lines: Vec<ReversalLine>,
    pub period_totals: Vec<PeriodCollectionTotal>,
    /// Offsetting expense-kind ledger entry; absent when the payment had
    /// no allocations to reverse.
    pub cash_transaction_id: Option<i32>,
}

// ===================== Owner position =====================

/// One outstanding expense in an owner's debt summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ExpenseSummary {
    pub expense_id: i32,
    pub period: PeriodRef,
    pub due_date: NaiveDate,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub balance: i64,
    pub status: String,
}

/// An owner's outstanding expenses in FIFO order plus their sum.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OwnerDebtSummary {
    pub owner_id: i32,
    pub total_debt: i64,
    pub expenses: Vec<ExpenseSummary>,
}

/// Point-in-time net credit position strictly before a reference period.
/// Never persisted; recomputed on every call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CreditSummary {
    pub owner_id: i32,
    pub reference: PeriodRef,
    /// Active payments linked to periods before the reference.
    pub paid_before: i64,
    /// Total billed in periods before the reference.
    pub billed_before: i64,
    /// max(paid - billed, 0).
    pub available_credit: i64,
}
