//! Slippage tolerance validation

use crate::error::SlippageViolation;

/// Fraction used when the caller gives no (or a zero) slippage
pub const DEFAULT_SLIPPAGE: f64 = 0.02;
/// Fractions at or below this are rejected
pub const MIN_SLIPPAGE: f64 = 0.001;
/// Fractions above this are rejected
pub const MAX_SLIPPAGE: f64 = 1.0;

/// Convert a percentage (2 = 2%) into an accepted fraction in `(0.001, 1]`
pub fn accepted_slippage(percent: Option<f64>) -> Result<f64, SlippageViolation> {
    let fraction = match percent.map(|p| p / 100.0) {
        Some(f) if f != 0.0 && !f.is_nan() => f,
        _ => DEFAULT_SLIPPAGE,
    };

    if fraction <= MIN_SLIPPAGE {
        Err(SlippageViolation::TooSmall)
    } else if fraction > MAX_SLIPPAGE {
        Err(SlippageViolation::TooBig)
    } else {
        Ok(fraction)
    }
}
