use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Caller-supplied default base rates (currency per m²), used when no active
/// calculation factor is configured for a property category. All fields are
/// optional; a category with neither a configured factor nor a default here
/// cannot be billed and fails that owner's generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BaseRates {
    /// Default rate for commercial properties.
    pub commercial: Option<Decimal>,
    /// Default rate for residential properties.
    pub residential: Option<Decimal>,
    /// Default rate for properties outside the two main categories.
    pub other: Option<Decimal>,
}
