//! # In-Memory Reference Collaborators
//!
//! Shared-handle implementations of the connector traits, used by the test
//! suites and by embedders who don't wire real venues. Each one wraps its
//! state in `Arc<RwLock<…>>` so a test can keep a handle (to mint funds,
//! move a strategy's rate, or reconfigure the swap venue) while the vault
//! owns another.
//!
//! Token movements are real: strategies and the swap venue move balances
//! through the same [`SharedAssetBook`] the vault uses, so conservation can
//! be asserted end to end.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{AssetTransfer, Checkpoint, ConnectorError, PriceOracle, StrategyAdapter, SwapConnector};
use crate::address::Address;
use crate::math::{div_down, mul_down, SCALE};

// ---------------------------------------------------------------------------
// SharedAssetBook
// ---------------------------------------------------------------------------

/// Wallet balances and allowances for every asset: the in-memory rendition
/// of the external asset-transfer system.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct BookState {
    /// `asset -> owner -> balance`.
    balances: HashMap<Address, HashMap<Address, u64>>,
    /// `asset -> owner -> spender -> allowance`.
    allowances: HashMap<Address, HashMap<Address, HashMap<Address, u64>>>,
}

/// A cloneable handle to a shared in-memory asset book.
#[derive(Clone, Debug, Default)]
pub struct SharedAssetBook {
    state: Arc<RwLock<BookState>>,
}

impl SharedAssetBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/setup helper: conjures `amount` of `asset` into `to`'s wallet.
    pub fn mint(&self, asset: Address, to: Address, amount: u64) {
        let mut state = self.state.write();
        let balance = state
            .balances
            .entry(asset)
            .or_default()
            .entry(to)
            .or_insert(0);
        *balance = balance.saturating_add(amount);
    }
}

impl Checkpoint for SharedAssetBook {
    fn checkpoint(&self) -> serde_json::Value {
        serde_json::to_value(&*self.state.read()).unwrap_or(serde_json::Value::Null)
    }

    fn restore(&mut self, snapshot: serde_json::Value) -> Result<(), serde_json::Error> {
        *self.state.write() = serde_json::from_value(snapshot)?;
        Ok(())
    }
}

impl AssetTransfer for SharedAssetBook {
    fn balance_of(&self, asset: Address, owner: Address) -> u64 {
        self.state
            .read()
            .balances
            .get(&asset)
            .and_then(|owners| owners.get(&owner))
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, asset: Address, owner: Address, spender: Address) -> u64 {
        self.state
            .read()
            .allowances
            .get(&asset)
            .and_then(|owners| owners.get(&owner))
            .and_then(|spenders| spenders.get(&spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&mut self, asset: Address, owner: Address, spender: Address, amount: u64) {
        self.state
            .write()
            .allowances
            .entry(asset)
            .or_default()
            .entry(owner)
            .or_default()
            .insert(spender, amount);
    }

    fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), ConnectorError> {
        if amount == 0 {
            return Ok(());
        }
        let mut state = self.state.write();

        let from_balance = state
            .balances
            .entry(asset)
            .or_default()
            .entry(from)
            .or_insert(0);
        if *from_balance < amount {
            return Err(ConnectorError::InsufficientFunds {
                asset,
                owner: from,
                available: *from_balance,
                requested: amount,
            });
        }
        *from_balance -= amount;

        let to_balance = state
            .balances
            .entry(asset)
            .or_default()
            .entry(to)
            .or_insert(0);
        *to_balance = to_balance.checked_add(amount).ok_or(ConnectorError::Overflow)?;
        Ok(())
    }

    fn transfer_from(
        &mut self,
        asset: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), ConnectorError> {
        if amount == 0 {
            return Ok(());
        }

        // Consume allowance first; an unlimited (u64::MAX) allowance is
        // never decremented, matching the usual token convention.
        {
            let mut state = self.state.write();
            let allowance = state
                .allowances
                .entry(asset)
                .or_default()
                .entry(from)
                .or_default()
                .entry(spender)
                .or_insert(0);
            if *allowance < amount {
                return Err(ConnectorError::InsufficientAllowance {
                    asset,
                    owner: from,
                    spender,
                    available: *allowance,
                    requested: amount,
                });
            }
            if *allowance != u64::MAX {
                *allowance -= amount;
            }
        }

        self.transfer(asset, from, to, amount)
    }
}

// ---------------------------------------------------------------------------
// FixedRateStrategy
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StrategyState {
    rate: u64,
    total_shares: u64,
}

/// A strategy whose value per share is whatever the test says it is.
///
/// Mints `amount / rate` shares on deposit and pays back `shares * rate` on
/// redeem, moving real tokens through the shared book. Move the rate between
/// join and exit to manufacture gains.
#[derive(Clone, Debug)]
pub struct FixedRateStrategy {
    address: Address,
    asset: Address,
    ledger: Address,
    book: SharedAssetBook,
    state: Arc<RwLock<StrategyState>>,
}

impl FixedRateStrategy {
    /// Creates a strategy at a value-per-share of exactly 1.0.
    ///
    /// `ledger` is where redemptions are paid back to.
    pub fn new(address: Address, asset: Address, ledger: Address, book: SharedAssetBook) -> Self {
        Self {
            address,
            asset,
            ledger,
            book,
            state: Arc::new(RwLock::new(StrategyState {
                rate: SCALE,
                total_shares: 0,
            })),
        }
    }

    /// This strategy's own address (where joined funds accumulate).
    pub fn address(&self) -> Address {
        self.address
    }

    /// Moves the value per share. Existing shares revalue instantly.
    pub fn set_rate(&self, rate: u64) {
        self.state.write().rate = rate;
    }
}

impl Checkpoint for FixedRateStrategy {
    // Own counters only; the shared book is checkpointed by its own handle.
    fn checkpoint(&self) -> serde_json::Value {
        serde_json::to_value(&*self.state.read()).unwrap_or(serde_json::Value::Null)
    }

    fn restore(&mut self, snapshot: serde_json::Value) -> Result<(), serde_json::Error> {
        *self.state.write() = serde_json::from_value(snapshot)?;
        Ok(())
    }
}

impl StrategyAdapter for FixedRateStrategy {
    fn asset(&self) -> Address {
        self.asset
    }

    fn rate(&self) -> u64 {
        self.state.read().rate
    }

    fn deposit(&mut self, amount: u64, _data: &[u8]) -> Result<u64, ConnectorError> {
        let mut state = self.state.write();
        let shares = div_down(amount, state.rate)
            .map_err(|e| ConnectorError::Failed(e.to_string()))?;
        state.total_shares = state
            .total_shares
            .checked_add(shares)
            .ok_or(ConnectorError::Overflow)?;
        Ok(shares)
    }

    fn redeem(
        &mut self,
        shares: u64,
        _emergency: bool,
        _data: &[u8],
    ) -> Result<u64, ConnectorError> {
        let amount = {
            let mut state = self.state.write();
            if state.total_shares < shares {
                return Err(ConnectorError::Failed(format!(
                    "strategy holds {} shares, redeem asked for {}",
                    state.total_shares, shares
                )));
            }
            let amount = mul_down(shares, state.rate)
                .map_err(|e| ConnectorError::Failed(e.to_string()))?;
            state.total_shares -= shares;
            amount
        };

        // Pay the redemption back into ledger custody. In a gain scenario
        // the strategy's wallet must hold the yield; tests mint it there.
        self.book
            .transfer(self.asset, self.address, self.ledger, amount)?;
        Ok(amount)
    }
}

// ---------------------------------------------------------------------------
// TableOracle
// ---------------------------------------------------------------------------

/// A reference-rate table: `(asset_in, asset_out) -> rate`.
#[derive(Clone, Debug, Default)]
pub struct TableOracle {
    rates: Arc<RwLock<HashMap<Address, HashMap<Address, u64>>>>,
}

impl TableOracle {
    /// Creates an empty oracle (every pair unavailable).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reference rate for a pair.
    pub fn set_rate(&self, asset_in: Address, asset_out: Address, rate: u64) {
        self.rates
            .write()
            .entry(asset_in)
            .or_default()
            .insert(asset_out, rate);
    }
}

impl PriceOracle for TableOracle {
    fn reference_rate(
        &self,
        asset_in: Address,
        asset_out: Address,
    ) -> Result<u64, ConnectorError> {
        self.rates
            .read()
            .get(&asset_in)
            .and_then(|outs| outs.get(&asset_out))
            .copied()
            .ok_or(ConnectorError::RateUnavailable {
                asset_in,
                asset_out,
            })
    }
}

// ---------------------------------------------------------------------------
// RateSwapConnector
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SwapState {
    /// Execution rate per pair, scaled.
    rates: HashMap<Address, HashMap<Address, u64>>,
    /// Fraction of the offered input the venue consumes, scaled. Anything
    /// below `SCALE` leaves a `remaining_in` for the ledger to reclaim.
    fill_ratio: u64,
}

/// A swap venue that executes at a configured rate.
///
/// Deliberately does *not* enforce `min_amount_out` -- it delivers whatever
/// its rate produces, so the ledger's own minimum-output backstop is the
/// thing that fires when the execution rate is worse than the oracle bound.
#[derive(Clone, Debug)]
pub struct RateSwapConnector {
    address: Address,
    ledger: Address,
    book: SharedAssetBook,
    state: Arc<RwLock<SwapState>>,
}

impl RateSwapConnector {
    /// Creates a venue with no pairs configured and full fill.
    ///
    /// The venue's output-side inventory lives in `address`'s wallet; tests
    /// mint it there.
    pub fn new(address: Address, ledger: Address, book: SharedAssetBook) -> Self {
        Self {
            address,
            ledger,
            book,
            state: Arc::new(RwLock::new(SwapState {
                rates: HashMap::new(),
                fill_ratio: SCALE,
            })),
        }
    }

    /// This venue's inventory address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sets the execution rate for a pair.
    pub fn set_rate(&self, asset_in: Address, asset_out: Address, rate: u64) {
        self.state
            .write()
            .rates
            .entry(asset_in)
            .or_default()
            .insert(asset_out, rate);
    }

    /// Sets the fraction of offered input the venue consumes.
    pub fn set_fill_ratio(&self, fill_ratio: u64) {
        self.state.write().fill_ratio = fill_ratio;
    }
}

impl Checkpoint for RateSwapConnector {
    fn checkpoint(&self) -> serde_json::Value {
        serde_json::to_value(&*self.state.read()).unwrap_or(serde_json::Value::Null)
    }

    fn restore(&mut self, snapshot: serde_json::Value) -> Result<(), serde_json::Error> {
        *self.state.write() = serde_json::from_value(snapshot)?;
        Ok(())
    }
}

impl SwapConnector for RateSwapConnector {
    fn swap(
        &mut self,
        asset_in: Address,
        asset_out: Address,
        amount_in: u64,
        _min_amount_out: u64,
        _data: &[u8],
    ) -> Result<(u64, u64), ConnectorError> {
        let (rate, fill_ratio) = {
            let state = self.state.read();
            let rate = state
                .rates
                .get(&asset_in)
                .and_then(|outs| outs.get(&asset_out))
                .copied()
                .ok_or(ConnectorError::RateUnavailable {
                    asset_in,
                    asset_out,
                })?;
            (rate, state.fill_ratio)
        };

        let consumed = mul_down(amount_in, fill_ratio)
            .map_err(|e| ConnectorError::Failed(e.to_string()))?;
        let remaining_in = amount_in - consumed;
        let amount_out =
            mul_down(consumed, rate).map_err(|e| ConnectorError::Failed(e.to_string()))?;

        self.book
            .transfer(asset_in, self.ledger, self.address, consumed)?;
        self.book
            .transfer(asset_out, self.address, self.ledger, amount_out)?;

        Ok((amount_out, remaining_in))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
