/// Round to three decimals, the precision every score is reported with.
///
/// Halves are rounded away from zero on the scaled value, so an input whose third
/// decimal is followed by a binary 5 (e.g. `0.0055`, stored as `0.00549999...`) rounds
/// up. Sums of two-decimal odds never sit on such a boundary.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Decimal odds must be a finite payout multiplier above zero.
pub fn is_valid_odd(odd: f64) -> bool {
    odd.is_finite() && odd > 0.0
}
