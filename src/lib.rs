// Library module for testable functions

pub mod ingestion;

use rust_decimal::{Decimal, RoundingStrategy};

/// Convert a USD amount with `rate`, rounded to 2 decimal places
/// Formula: round(base × rate, 2), midpoints to the even digit
/// Returns None when the product overflows `Decimal`
pub fn convert_currency(base: Decimal, rate: Decimal) -> Option<Decimal> {
    base.checked_mul(rate)
        .map(|product| product.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
}
