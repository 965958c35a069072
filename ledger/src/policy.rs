//! # Account Policies
//!
//! An account on the ledger is just an address -- but an address can bind an
//! [`AccountPolicy`] that decides, per call and per argument, whether some
//! *other* caller may act on the account's behalf, and that receives
//! lifecycle callbacks around the operations it approves.
//!
//! Policies are heterogeneous: a plain owner has none (only self-service is
//! possible), a multi-party agreement has a full evaluator, and anything in
//! between implements whatever subset it needs. The trait therefore defaults
//! every capability to "not supported": no callbacks, no fee schedule, no
//! slippage cap.
//!
//! Requests cross the seam as typed [`OpRequest`] values rather than encoded
//! byte blobs, so a policy can dispatch on the operation and inspect each
//! argument without a decoding step.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::connectors::{AssetTransfer, ConnectorError};
use crate::fees::FeeSchedule;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by policy lifecycle hooks.
///
/// A hook failure aborts the whole top-level operation; the vault's
/// transactional frame unwinds any state the hook (or the operation so far)
/// touched.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The hook rejected the operation outright.
    #[error("hook rejected: {0}")]
    Rejected(String),

    /// The hook's own collaborator call failed.
    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Discriminant for the six ledger operations a policy can gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpSelector {
    /// Credit funds into the account's ledger balance.
    Deposit,
    /// Pay funds out of the account's ledger balance (and wallet).
    Withdraw,
    /// Trade one ledger-held asset for another.
    Swap,
    /// Invest ledger-held funds into a strategy.
    Join,
    /// Divest a ratio of a strategy position.
    Exit,
}

impl fmt::Display for OpSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpSelector::Deposit => "deposit",
            OpSelector::Withdraw => "withdraw",
            OpSelector::Swap => "swap",
            OpSelector::Join => "join",
            OpSelector::Exit => "exit",
        };
        write!(f, "{}", name)
    }
}

/// A fully-typed ledger operation request: the "how" a policy evaluates.
///
/// Each variant declares exactly one *chainable* numeric input -- the field
/// a batch step overwrites with the previous step's output (see
/// [`OpRequest::with_input`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpRequest {
    /// Deposit `amount` of `asset`, pulled from the caller's wallet.
    Deposit {
        /// The asset being deposited.
        asset: Address,
        /// Amount to deposit. Chainable.
        amount: u64,
    },

    /// Withdraw `amount` of `asset` to `recipient`.
    Withdraw {
        /// The asset being withdrawn.
        asset: Address,
        /// Amount to withdraw. Chainable.
        amount: u64,
        /// Where the funds go.
        recipient: Address,
    },

    /// Swap `amount_in` of `asset_in` for `asset_out`.
    Swap {
        /// Asset sold.
        asset_in: Address,
        /// Asset bought.
        asset_out: Address,
        /// Amount of `asset_in` offered. Chainable.
        amount_in: u64,
        /// Caller's slippage tolerance, scaled. The effective bound is
        /// `min(max_slippage, policy cap)`.
        max_slippage: u64,
        /// Opaque payload forwarded to the swap connector.
        data: Vec<u8>,
    },

    /// Invest `amount` of the strategy's underlying asset.
    Join {
        /// The strategy to invest into.
        strategy: Address,
        /// Amount to invest. Chainable.
        amount: u64,
        /// Opaque payload forwarded to the strategy.
        data: Vec<u8>,
    },

    /// Divest `ratio` (scaled, <= 100%) of the strategy position.
    Exit {
        /// The strategy to divest from.
        strategy: Address,
        /// Portion of the position to redeem, scaled. Chainable.
        ratio: u64,
        /// Emergency exits are forwarded to the strategy as such.
        emergency: bool,
        /// Opaque payload forwarded to the strategy.
        data: Vec<u8>,
    },
}

impl OpRequest {
    /// Returns the operation discriminant for this request.
    pub fn selector(&self) -> OpSelector {
        match self {
            OpRequest::Deposit { .. } => OpSelector::Deposit,
            OpRequest::Withdraw { .. } => OpSelector::Withdraw,
            OpRequest::Swap { .. } => OpSelector::Swap,
            OpRequest::Join { .. } => OpSelector::Join,
            OpRequest::Exit { .. } => OpSelector::Exit,
        }
    }

    /// Overwrites the chainable numeric input with `value`.
    ///
    /// Used by the batch pipeline when a step's consume-prior-output flag is
    /// set. The unit of the incoming value is the producing step's concern;
    /// a mismatch (e.g. chaining shares into an exit ratio) surfaces as the
    /// normal domain error for the overwritten field.
    pub fn with_input(mut self, value: u64) -> Self {
        match &mut self {
            OpRequest::Deposit { amount, .. } => *amount = value,
            OpRequest::Withdraw { amount, .. } => *amount = value,
            OpRequest::Swap { amount_in, .. } => *amount_in = value,
            OpRequest::Join { amount, .. } => *amount = value,
            OpRequest::Exit { ratio, .. } => *ratio = value,
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Callback mask
// ---------------------------------------------------------------------------

/// Bitmask of lifecycle callbacks a policy wants to receive.
///
/// One before-bit and one after-bit per operation. The bit positions are a
/// compatibility surface -- append new bits, never renumber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackMask(u16);

impl CallbackMask {
    /// No callbacks at all (the trait default).
    pub const NONE: CallbackMask = CallbackMask(0);

    pub const BEFORE_DEPOSIT: CallbackMask = CallbackMask(1 << 0);
    pub const AFTER_DEPOSIT: CallbackMask = CallbackMask(1 << 1);
    pub const BEFORE_WITHDRAW: CallbackMask = CallbackMask(1 << 2);
    pub const AFTER_WITHDRAW: CallbackMask = CallbackMask(1 << 3);
    pub const BEFORE_SWAP: CallbackMask = CallbackMask(1 << 4);
    pub const AFTER_SWAP: CallbackMask = CallbackMask(1 << 5);
    pub const BEFORE_JOIN: CallbackMask = CallbackMask(1 << 6);
    pub const AFTER_JOIN: CallbackMask = CallbackMask(1 << 7);
    pub const BEFORE_EXIT: CallbackMask = CallbackMask(1 << 8);
    pub const AFTER_EXIT: CallbackMask = CallbackMask(1 << 9);

    /// Returns the before-bit for `op`.
    pub fn before(op: OpSelector) -> CallbackMask {
        match op {
            OpSelector::Deposit => Self::BEFORE_DEPOSIT,
            OpSelector::Withdraw => Self::BEFORE_WITHDRAW,
            OpSelector::Swap => Self::BEFORE_SWAP,
            OpSelector::Join => Self::BEFORE_JOIN,
            OpSelector::Exit => Self::BEFORE_EXIT,
        }
    }

    /// Returns the after-bit for `op`.
    pub fn after(op: OpSelector) -> CallbackMask {
        match op {
            OpSelector::Deposit => Self::AFTER_DEPOSIT,
            OpSelector::Withdraw => Self::AFTER_WITHDRAW,
            OpSelector::Swap => Self::AFTER_SWAP,
            OpSelector::Join => Self::AFTER_JOIN,
            OpSelector::Exit => Self::AFTER_EXIT,
        }
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub fn contains(&self, other: CallbackMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CallbackMask {
    type Output = CallbackMask;

    fn bitor(self, rhs: CallbackMask) -> CallbackMask {
        CallbackMask(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Hook context
// ---------------------------------------------------------------------------

/// Everything a lifecycle hook gets to see and touch.
///
/// Hooks run inside the vault's transactional frame: anything they mutate
/// through `assets` is unwound if the operation later aborts.
pub struct HookContext<'a> {
    /// The invoker the gateway authorized.
    pub caller: Address,

    /// The account the operation runs on behalf of (the policy's own
    /// identity).
    pub account: Address,

    /// The ledger instance performing the operation.
    pub ledger: Address,

    /// The typed request being performed.
    pub request: &'a OpRequest,

    /// The asset-transfer collaborator, for hooks that manage allowances.
    pub assets: &'a mut dyn AssetTransfer,
}

// ---------------------------------------------------------------------------
// AccountPolicy
// ---------------------------------------------------------------------------

/// The delegated-authorization capability set.
///
/// Self-service (caller == account) bypasses the policy entirely; everything
/// else is mediated through `can_perform` and the optional hooks.
pub trait AccountPolicy: Send + Sync {
    /// Decides whether `who` may perform `what` (with arguments `how`) on
    /// ledger `where_`, on this account's behalf.
    fn can_perform(
        &self,
        who: Address,
        where_: Address,
        what: OpSelector,
        how: &OpRequest,
    ) -> bool;

    /// Which lifecycle callbacks this policy wants. Defaults to none.
    fn supported_callbacks(&self) -> CallbackMask {
        CallbackMask::NONE
    }

    /// The fee schedule this account declares, if any. Accounts without one
    /// pay no deposit/withdraw/performance fees (the ledger-level protocol
    /// fee still applies).
    fn fee_schedule(&self) -> Option<FeeSchedule> {
        None
    }

    /// A cap on swap slippage tolerances, if the policy declares one.
    fn swap_slippage_cap(&self) -> Option<u64> {
        None
    }

    /// Invoked before the ledger mutates, when the before-bit for the
    /// operation is set. An error aborts the operation.
    fn before_op(&self, _ctx: &mut HookContext<'_>) -> Result<(), PolicyError> {
        Ok(())
    }

    /// Invoked after the ledger mutates, when the after-bit is set. An error
    /// aborts (and unwinds) the operation.
    fn after_op(&self, _ctx: &mut HookContext<'_>) -> Result<(), PolicyError> {
        Ok(())
    }
}

impl fmt::Debug for dyn AccountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn AccountPolicy")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
