use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{BillingError, Result};

/// Scale used for water factors (currency units per m3).
pub const FACTOR_SCALE: u32 = 6;

/// Scale used for resolved consumption quantities (m3).
pub const CONSUMPTION_SCALE: u32 = 3;

/// Rounds a monetary amount to whole currency units.
///
/// Fractions of 0.50 and above round away from zero, everything
/// below rounds towards it. Billed amounts are stored as integers,
/// so this is the single place where fractional money leaves the
/// engine.
pub fn round_money(amount: Decimal) -> Result<i64> {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().ok_or_else(|| {
        BillingError::Consistency(format!("amount {rounded} exceeds the representable money range"))
    })
}

/// Rounds a water factor to its storage scale of six decimal places.
pub fn round_factor(factor: Decimal) -> Decimal {
    factor.round_dp_with_strategy(FACTOR_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a consumption quantity to its storage scale of three decimal places.
pub fn round_consumption(quantity: Decimal) -> Decimal {
    quantity.round_dp_with_strategy(CONSUMPTION_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
