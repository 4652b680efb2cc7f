use thiserror::Error;

/// Error types for the billing engine
#[derive(Error, Debug)]
pub enum BillingError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Input or configuration rejected before any computation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced billing period does not exist
    #[error("Billing period {period_id} not found")]
    PeriodNotFound { period_id: i32 },

    /// Expense generation requires the target period to be open
    #[error("Billing period {label} is {status}; expenses can only be generated while it is open")]
    PeriodNotOpen { label: String, status: String },

    /// Referenced owner does not exist
    #[error("Owner {owner_id} not found")]
    OwnerNotFound { owner_id: i32 },

    /// Referenced property does not exist
    #[error("Property {property_id} not found")]
    PropertyNotFound { property_id: i32 },

    /// Referenced payment does not exist
    #[error("Payment {payment_id} not found")]
    PaymentNotFound { payment_id: i32 },

    /// Referenced expense does not exist
    #[error("Expense {expense_id} not found")]
    ExpenseNotFound { expense_id: i32 },

    /// Allocation requires an active payment
    #[error("Payment {payment_id} is cancelled and cannot be allocated")]
    PaymentNotActive { payment_id: i32 },

    /// Reversal of a payment that was already cancelled
    #[error("Payment {payment_id} is already cancelled")]
    PaymentAlreadyCancelled { payment_id: i32 },

    /// The payment amount has already been allocated in full
    #[error("Payment {payment_id} has no unallocated amount left")]
    PaymentFullyAllocated { payment_id: i32 },

    /// Allocation found nothing to apply the payment to
    #[error("Owner {owner_id} has no outstanding expenses matching the request")]
    NoOutstandingExpenses { owner_id: i32 },

    /// Stored data violates an invariant the engine relies on
    #[error("Consistency error: {0}")]
    Consistency(String),
}

/// Type alias for Result with BillingError
pub type Result<T> = std::result::Result<T, BillingError>;
