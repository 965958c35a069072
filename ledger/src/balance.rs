//! # Asset Balances
//!
//! The [`BalanceTable`] is the ledger's primary book: every unit of every
//! asset held in custody is attributed to exactly one `(account, asset)`
//! entry. Entries are created lazily at zero on first credit and are never
//! deleted -- a zero balance is a perfectly good balance.
//!
//! Balances can never go negative. The table is owned exclusively by the
//! vault and mutates only through its operations; nothing outside the vault
//! holds a mutable reference to it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::LedgerError;
use crate::math::MathError;

/// A single `(account, asset)` balance entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Balance {
    /// Amount held, in the asset's smallest units.
    pub amount: u64,

    /// Timestamp of the last balance-modifying operation.
    pub last_updated: DateTime<Utc>,
}

impl Balance {
    fn zero() -> Self {
        Self {
            amount: 0,
            last_updated: Utc::now(),
        }
    }
}

/// The complete custody book: `account -> asset -> balance`.
///
/// Nested maps (rather than a tuple key) so the table serializes as plain
/// JSON objects with hex-address keys.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BalanceTable {
    accounts: HashMap<Address, HashMap<Address, Balance>>,
}

impl BalanceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the amount held by `account` in `asset` (zero if no entry).
    pub fn amount(&self, account: Address, asset: Address) -> u64 {
        self.accounts
            .get(&account)
            .and_then(|assets| assets.get(&asset))
            .map(|b| b.amount)
            .unwrap_or(0)
    }

    /// Credits `amount` to `(account, asset)`, creating the entry if needed.
    ///
    /// Zero-amount credits are accepted and leave the entry untouched, so
    /// callers don't have to special-case empty fee legs.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::AddOverflow`] if the credit would exceed `u64::MAX`.
    pub fn credit(
        &mut self,
        account: Address,
        asset: Address,
        amount: u64,
    ) -> Result<u64, MathError> {
        if amount == 0 {
            return Ok(self.amount(account, asset));
        }

        let entry = self
            .accounts
            .entry(account)
            .or_default()
            .entry(asset)
            .or_insert_with(Balance::zero);

        let new_amount = entry
            .amount
            .checked_add(amount)
            .ok_or(MathError::AddOverflow {
                current: entry.amount,
                credit: amount,
            })?;

        entry.amount = new_amount;
        entry.last_updated = Utc::now();
        Ok(new_amount)
    }

    /// Debits `amount` from `(account, asset)`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if the entry (or a
    /// missing entry, which counts as zero) cannot cover the debit.
    pub fn debit(
        &mut self,
        account: Address,
        asset: Address,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        let available = self.amount(account, asset);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                asset,
                available,
                requested: amount,
            });
        }
        if amount == 0 {
            return Ok(available);
        }

        // The entry exists: available >= amount > 0.
        let entry = self
            .accounts
            .entry(account)
            .or_default()
            .entry(asset)
            .or_insert_with(Balance::zero);
        entry.amount -= amount;
        entry.last_updated = Utc::now();
        Ok(entry.amount)
    }

    /// Returns all non-zero holdings of `account` as `(asset, amount)` pairs.
    pub fn holdings(&self, account: Address) -> Vec<(Address, u64)> {
        self.accounts
            .get(&account)
            .map(|assets| {
                assets
                    .iter()
                    .filter(|(_, b)| b.amount > 0)
                    .map(|(asset, b)| (*asset, b.amount))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
