//! # External Collaborators
//!
//! The vault consumes four external systems through these traits: the
//! fungible-asset move/allowance primitive, yield strategies, the swap
//! execution venue, and the price oracle. The traits describe the *seam*,
//! not the systems -- real yield mechanics, AMM pricing, and oracle
//! computation are out of scope.
//!
//! Mutating collaborators also implement [`Checkpoint`]: a serde snapshot of
//! their state that the vault captures before every operation and re-applies
//! on abort (and unconditionally after a `query`). That is what makes "any
//! failure is a full abort with zero state change" hold across the seam, not
//! just inside the vault's own tables.
//!
//! [`memory`] provides in-memory reference implementations used by the test
//! suites and by anyone embedding the ledger without real venues.

pub mod memory;

use thiserror::Error;

use crate::address::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by external collaborators.
///
/// These propagate verbatim through the vault as dependency failures; the
/// vault never retries.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The owner's wallet cannot cover the transfer.
    #[error("insufficient funds: {owner} holds {available} of {asset}, requested {requested}")]
    InsufficientFunds {
        /// Asset being moved.
        asset: Address,
        /// Wallet being debited.
        owner: Address,
        /// Amount available.
        available: u64,
        /// Amount requested.
        requested: u64,
    },

    /// The spender's allowance over the owner's wallet is too small.
    #[error(
        "insufficient allowance: {spender} may spend {available} of {asset} \
         from {owner}, requested {requested}"
    )]
    InsufficientAllowance {
        /// Asset being moved.
        asset: Address,
        /// Wallet being debited.
        owner: Address,
        /// Party doing the spending.
        spender: Address,
        /// Allowance remaining.
        available: u64,
        /// Amount requested.
        requested: u64,
    },

    /// The oracle has no reference rate for this pair.
    #[error("no reference rate for {asset_in} -> {asset_out}")]
    RateUnavailable {
        /// Asset sold.
        asset_in: Address,
        /// Asset bought.
        asset_out: Address,
    },

    /// A balance update overflowed.
    #[error("connector balance overflow")]
    Overflow,

    /// Any other abort from the collaborator, with its own message.
    #[error("{0}")]
    Failed(String),
}

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

/// Snapshot/restore of a collaborator's state, as a serde value.
///
/// Implementations serialize their own fields only; shared sub-state (such
/// as the asset book a strategy moves tokens through) is checkpointed by its
/// own handle.
pub trait Checkpoint {
    /// Captures the current state.
    fn checkpoint(&self) -> serde_json::Value;

    /// Re-applies a previously captured state.
    ///
    /// # Errors
    ///
    /// Fails only if `snapshot` was not produced by this implementation's
    /// [`checkpoint`](Checkpoint::checkpoint).
    fn restore(&mut self, snapshot: serde_json::Value) -> Result<(), serde_json::Error>;
}

// ---------------------------------------------------------------------------
// Consumed interfaces
// ---------------------------------------------------------------------------

/// The fungible-asset move/allowance primitive.
///
/// `from` is always explicit: the vault acts as the spender when pulling
/// from external wallets and as the owner when paying out of custody.
pub trait AssetTransfer: Checkpoint + Send + Sync {
    /// Returns `owner`'s wallet balance of `asset`.
    fn balance_of(&self, asset: Address, owner: Address) -> u64;

    /// Returns how much `spender` may currently pull from `owner`.
    fn allowance(&self, asset: Address, owner: Address, spender: Address) -> u64;

    /// Sets `spender`'s allowance over `owner`'s wallet to exactly `amount`.
    fn approve(&mut self, asset: Address, owner: Address, spender: Address, amount: u64);

    /// Moves `amount` of `asset` from `from` to `to`.
    fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), ConnectorError>;

    /// Moves `amount` of `asset` from `from` to `to` on behalf of `spender`,
    /// consuming `spender`'s allowance over `from`.
    fn transfer_from(
        &mut self,
        asset: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), ConnectorError>;
}

/// A pluggable yield destination.
///
/// Shares are minted against deposits at a time-varying value-per-share rate
/// (fixed-point against [`SCALE`](crate::math::SCALE)); the strategy's
/// internal yield mechanism is its own business.
pub trait StrategyAdapter: Checkpoint + Send + Sync {
    /// The underlying asset this strategy accepts.
    fn asset(&self) -> Address;

    /// Current value per share, scaled.
    fn rate(&self) -> u64;

    /// Accepts `amount` of the underlying (already transferred to the
    /// strategy) and returns the shares minted.
    fn deposit(&mut self, amount: u64, data: &[u8]) -> Result<u64, ConnectorError>;

    /// Redeems `shares` at the current rate and returns the amount paid back
    /// to the ledger. `emergency` redemptions skip whatever the strategy
    /// considers skippable.
    fn redeem(&mut self, shares: u64, emergency: bool, data: &[u8])
        -> Result<u64, ConnectorError>;
}

/// The swap execution venue.
pub trait SwapConnector: Checkpoint + Send + Sync {
    /// Executes a swap of up to `amount_in` for at least `min_amount_out`
    /// (advisory -- the ledger enforces its own bound on the result).
    ///
    /// Returns `(amount_out, remaining_in)`: the output delivered and any
    /// unconsumed input the ledger should reclaim.
    fn swap(
        &mut self,
        asset_in: Address,
        asset_out: Address,
        amount_in: u64,
        min_amount_out: u64,
        data: &[u8],
    ) -> Result<(u64, u64), ConnectorError>;
}

/// The reference-rate source used to bound swap slippage.
///
/// Never the executed price -- only the yardstick the executed price is
/// measured against.
pub trait PriceOracle: Send + Sync {
    /// Reference rate for the pair, scaled: one unit of `asset_in` is worth
    /// `rate / SCALE` units of `asset_out`.
    fn reference_rate(&self, asset_in: Address, asset_out: Address)
        -> Result<u64, ConnectorError>;
}
