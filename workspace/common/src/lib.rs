//! Transport-layer types shared between the billing engine and the HTTP
//! backend. The compute crate builds these reports and the handlers
//! serialize them, so the shapes live here without any database dependency.

mod rates;
mod reports;

pub use rates::BaseRates;
pub use reports::{
    AllocationLine, AllocationPreview, AllocationResult, CreditSummary, ExpensePreview,
    ExpenseSummary, GenerationReport, OwnerDebtSummary, PeriodCollectionTotal, PeriodRef,
    ReversalLine, ReversalResult, WaterFactorSnapshot,
};
