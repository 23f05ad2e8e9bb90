//! Human-readable amounts to token base units

use crate::error::{ZapError, ZapResult};

use ethers::types::U256;

/// Convert a decimal string into base units (`value * 10^decimals`).
///
/// Digits past `decimals` are truncated, never rounded. Works on the string
/// so the result is exact for any representable amount.
pub fn to_base_units(value: &str, decimals: u32) -> ZapResult<U256> {
    let invalid = |reason: &str| ZapError::InvalidAmount {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = value.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("empty amount"));
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("not a non-negative decimal number"));
    }

    let decimals = decimals as usize;
    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    if fraction.len() >= decimals {
        digits.push_str(&fraction[..decimals]);
    } else {
        digits.push_str(fraction);
        digits.extend(std::iter::repeat('0').take(decimals - fraction.len()));
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(digits).map_err(|_| invalid("amount overflows 256 bits"))
}
