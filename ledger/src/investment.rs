//! # Strategy Investments
//!
//! An [`Investment`] tracks one account's position in one strategy: the
//! shares held and the value invested to acquire them. The two fields change
//! only together -- a join adds to both, an exit removes the same ratio from
//! both -- which is what makes the gains calculation on exit exact.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::math::MathError;

/// One account's position in one strategy.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Investment {
    /// Strategy shares held.
    pub shares: u64,

    /// Value paid in to acquire those shares, in the strategy's underlying
    /// asset. The cost basis for the gains calculation on exit.
    pub invested_value: u64,

    /// Timestamp of the last position-modifying operation.
    pub last_updated: DateTime<Utc>,
}

/// All strategy positions: `account -> strategy -> investment`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InvestmentTable {
    accounts: HashMap<Address, HashMap<Address, Investment>>,
}

impl InvestmentTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the position of `account` in `strategy`, if any.
    pub fn position(&self, account: Address, strategy: Address) -> Option<&Investment> {
        self.accounts
            .get(&account)
            .and_then(|strategies| strategies.get(&strategy))
    }

    /// Returns the shares `account` holds in `strategy` (zero if no entry).
    pub fn shares(&self, account: Address, strategy: Address) -> u64 {
        self.position(account, strategy).map(|i| i.shares).unwrap_or(0)
    }

    /// Records a join: adds `shares` and `invested_value` to the position,
    /// creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::AddOverflow`] if either field would overflow.
    pub fn join(
        &mut self,
        account: Address,
        strategy: Address,
        shares: u64,
        invested_value: u64,
    ) -> Result<(), MathError> {
        let entry = self
            .accounts
            .entry(account)
            .or_default()
            .entry(strategy)
            .or_default();

        let new_shares = entry
            .shares
            .checked_add(shares)
            .ok_or(MathError::AddOverflow {
                current: entry.shares,
                credit: shares,
            })?;
        let new_value =
            entry
                .invested_value
                .checked_add(invested_value)
                .ok_or(MathError::AddOverflow {
                    current: entry.invested_value,
                    credit: invested_value,
                })?;

        entry.shares = new_shares;
        entry.invested_value = new_value;
        entry.last_updated = Utc::now();
        Ok(())
    }

    /// Records an exit: removes `shares` and `invested_value` from the
    /// position.
    ///
    /// Callers compute both removals as a ratio (<= scale) of the current
    /// position, so the subtraction cannot underflow; saturation here is an
    /// invariant backstop, not a rounding mechanism.
    pub fn exit(&mut self, account: Address, strategy: Address, shares: u64, invested_value: u64) {
        if let Some(entry) = self
            .accounts
            .get_mut(&account)
            .and_then(|strategies| strategies.get_mut(&strategy))
        {
            entry.shares = entry.shares.saturating_sub(shares);
            entry.invested_value = entry.invested_value.saturating_sub(invested_value);
            entry.last_updated = Utc::now();
        }
    }

    /// Returns all non-empty positions of `account` as
    /// `(strategy, shares, invested_value)` triples.
    pub fn positions(&self, account: Address) -> Vec<(Address, u64, u64)> {
        self.accounts
            .get(&account)
            .map(|strategies| {
                strategies
                    .iter()
                    .filter(|(_, i)| i.shares > 0)
                    .map(|(strategy, i)| (*strategy, i.shares, i.invested_value))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
