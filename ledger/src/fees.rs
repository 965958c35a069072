//! # Fee Schedules
//!
//! A [`FeeSchedule`] is the fee surface an account policy can declare:
//! deposit and withdraw fees on the account's own flows, a performance fee on
//! realized strategy gains, and the collector address the fees accrue to.
//!
//! The ledger-level protocol fee is deliberately *not* here -- it lives on
//! the vault and is non-bypassable regardless of what a policy declares.
//!
//! Rates are fixed-point against [`SCALE`](crate::math::SCALE); 100% is the
//! hard cap for every rate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::math::SCALE;

/// Errors from fee schedule validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeeError {
    /// A fee rate exceeds 100% of scale.
    #[error("{name} fee rate {rate} exceeds cap {cap}")]
    RateAboveCap {
        /// Which rate was rejected ("deposit", "withdraw", "performance").
        name: &'static str,
        /// The offending rate.
        rate: u64,
        /// The maximum allowed rate.
        cap: u64,
    },

    /// The collector is the zero address.
    #[error("fee collector must not be the zero address")]
    ZeroCollector,
}

/// Fee rates and the collector they accrue to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee rate applied to deposits, scaled by `SCALE`.
    pub deposit_fee_rate: u64,

    /// Fee rate applied to the ledger-sourced portion of withdrawals.
    /// The portion pulled straight from the account's wallet is fee-exempt.
    pub withdraw_fee_rate: u64,

    /// Fee rate applied to realized gains on exit, after the protocol fee
    /// has been taken.
    pub performance_fee_rate: u64,

    /// Address the fees are credited to (inside the ledger).
    pub collector: Address,
}

impl FeeSchedule {
    /// A schedule with every rate at zero, accruing to `collector`.
    pub fn free(collector: Address) -> Self {
        Self {
            deposit_fee_rate: 0,
            withdraw_fee_rate: 0,
            performance_fee_rate: 0,
            collector,
        }
    }

    /// Validates every rate against its cap and rejects a zero collector.
    ///
    /// All-or-nothing: callers embedding a schedule in a larger object must
    /// run this before constructing that object.
    pub fn validate(&self) -> Result<(), FeeError> {
        if self.collector.is_zero() {
            return Err(FeeError::ZeroCollector);
        }
        for (name, rate) in [
            ("deposit", self.deposit_fee_rate),
            ("withdraw", self.withdraw_fee_rate),
            ("performance", self.performance_fee_rate),
        ] {
            if rate > SCALE {
                return Err(FeeError::RateAboveCap {
                    name,
                    rate,
                    cap: SCALE,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
