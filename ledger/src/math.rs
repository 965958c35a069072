//! # Fixed-Point Arithmetic
//!
//! All rates in the ledger -- fee rates, slippage bounds, exit ratios, and
//! strategy value-per-share rates -- are integers scaled by one constant,
//! [`SCALE`]. No floating point anywhere: wrapping arithmetic and money do
//! not mix, and neither do rounding modes you can't reproduce.
//!
//! The two helpers widen through `u128` and multiply **before** dividing.
//! That order is deliberate: reordering shifts rounding by up to one unit,
//! and downstream fee accounting asserts exact values.

use thiserror::Error;

/// The fixed-point base. A rate of `SCALE` means 100% (or a value-per-share
/// of exactly 1.0). 1e9 gives 9 decimal places of rate precision while
/// keeping `u64` rates comfortably away from overflow.
pub const SCALE: u64 = 1_000_000_000;

/// Errors from fixed-point arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    /// The widened result does not fit back into `u64`.
    #[error("amount overflow: {a} * {b} / {denom} exceeds u64")]
    Overflow {
        /// Left operand.
        a: u64,
        /// Right operand.
        b: u64,
        /// Divisor applied after the multiplication.
        denom: u64,
    },

    /// An additive balance update does not fit into `u64`.
    #[error("amount overflow: {current} + {credit} exceeds u64")]
    AddOverflow {
        /// The balance before the failed credit.
        current: u64,
        /// The amount that caused the overflow.
        credit: u64,
    },

    /// Division by a zero rate.
    #[error("division by zero rate")]
    DivisionByZero,
}

/// Computes `amount * rate / SCALE`, rounding down.
///
/// This is the canonical "apply a rate" operation: fees, ratios, slippage
/// bounds, and share valuation all go through here.
pub fn mul_down(amount: u64, rate: u64) -> Result<u64, MathError> {
    let wide = (amount as u128) * (rate as u128) / (SCALE as u128);
    u64::try_from(wide).map_err(|_| MathError::Overflow {
        a: amount,
        b: rate,
        denom: SCALE,
    })
}

/// Computes `amount * SCALE / rate`, rounding down.
///
/// The inverse of [`mul_down`]: converts an asset amount into shares at a
/// given value-per-share rate.
pub fn div_down(amount: u64, rate: u64) -> Result<u64, MathError> {
    if rate == 0 {
        return Err(MathError::DivisionByZero);
    }
    let wide = (amount as u128) * (SCALE as u128) / (rate as u128);
    u64::try_from(wide).map_err(|_| MathError::Overflow {
        a: amount,
        b: SCALE,
        denom: rate,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
