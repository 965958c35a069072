//! # Ledger Errors
//!
//! Every failure in the ledger surfaces synchronously as a full abort with
//! zero state change -- there are no retries and no partial effects. Callers
//! distinguish failure causes through a fixed vocabulary of reason
//! identifiers exposed by [`LedgerError::reason`]; that vocabulary is a
//! compatibility surface and must not change.

use thiserror::Error;

use crate::address::Address;
use crate::connectors::ConnectorError;
use crate::fees::FeeError;
use crate::math::MathError;
use crate::policy::{OpSelector, PolicyError};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The caller is not the account and the account's policy declined (or
    /// no policy is registered for the account, or an admin guard failed).
    #[error("action not allowed: {caller} may not {op} on behalf of {account}")]
    NotAllowed {
        /// The invoker that was rejected.
        caller: Address,
        /// The account the invoker tried to act for.
        account: Address,
        /// The operation that was attempted.
        op: OpSelector,
    },

    /// The account cannot cover the requested amount from its ledger balance
    /// (plus, for withdrawals, the wallet allowance granted to the ledger).
    #[error(
        "insufficient balance: account {account} has {available} of asset {asset}, \
         requested {requested}"
    )]
    InsufficientBalance {
        /// The account being debited.
        account: Address,
        /// The asset being debited.
        asset: Address,
        /// Total amount available to the operation.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// An exit would redeem zero shares (empty position or a ratio that
    /// rounds to nothing).
    #[error("exit redeems zero shares: account {account}, strategy {strategy}")]
    ExitSharesZero {
        /// The exiting account.
        account: Address,
        /// The strategy being exited.
        strategy: Address,
    },

    /// The exit ratio exceeds the fixed-point scale (more than 100%).
    #[error("invalid exit ratio {ratio}: must be <= scale")]
    InvalidExitRatio {
        /// The rejected ratio.
        ratio: u64,
    },

    /// The swap produced less output than the oracle-derived minimum.
    #[error("swap output {amount_out} below minimum {min_amount_out}")]
    SwapMinAmount {
        /// The realized output amount.
        amount_out: u64,
        /// The minimum acceptable output.
        min_amount_out: u64,
    },

    /// The caller is not the vault admin. Admin-surface calls only.
    #[error("action not allowed: {caller} is not the vault admin")]
    AdminOnly {
        /// The rejected caller.
        caller: Address,
    },

    /// A fee rate or collector failed validation.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// A requested slippage bound exceeds 100% of scale.
    #[error("invalid slippage {slippage}: must be <= scale")]
    InvalidSlippage {
        /// The rejected slippage bound.
        slippage: u64,
    },

    /// The strategy address is not registered with this ledger.
    #[error("strategy not registered: {0}")]
    UnknownStrategy(Address),

    /// The first step of a batch cannot consume a prior output.
    #[error("invalid batch chaining: step {step} has no prior output to consume")]
    InvalidChain {
        /// Index of the offending step.
        step: usize,
    },

    /// Fixed-point arithmetic failed (overflow or zero divisor).
    #[error(transparent)]
    Math(#[from] MathError),

    /// An external collaborator (asset transfer, strategy, swap connector,
    /// price oracle) aborted. Propagated verbatim.
    #[error("dependency failed: {0}")]
    Connector(#[from] ConnectorError),

    /// An account policy hook aborted. Propagated verbatim.
    #[error("policy hook failed: {0}")]
    Policy(#[from] PolicyError),

    /// The transactional frame could not be restored. This indicates a bug
    /// in a connector's snapshot implementation, not a caller mistake.
    #[error("snapshot restore failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl LedgerError {
    /// Returns the stable reason identifier for this error.
    ///
    /// Callers pattern-match on these strings; the mapping is part of the
    /// ledger's compatibility contract.
    pub fn reason(&self) -> &'static str {
        match self {
            LedgerError::NotAllowed { .. } | LedgerError::AdminOnly { .. } => {
                "ACTION_NOT_ALLOWED"
            }
            LedgerError::Fee(_) => "INVALID_FEE",
            LedgerError::InsufficientBalance { .. } => "ACCOUNTING_INSUFFICIENT_BALANCE",
            LedgerError::ExitSharesZero { .. } => "EXIT_SHARES_ZERO",
            LedgerError::InvalidExitRatio { .. } => "INVALID_EXIT_RATIO",
            LedgerError::SwapMinAmount { .. } => "SWAP_MIN_AMOUNT",
            LedgerError::InvalidSlippage { .. } => "SWAP_INVALID_SLIPPAGE",
            LedgerError::UnknownStrategy(_) => "STRATEGY_NOT_REGISTERED",
            LedgerError::InvalidChain { .. } => "BATCH_INVALID_CHAIN",
            LedgerError::Math(MathError::Overflow { .. })
            | LedgerError::Math(MathError::AddOverflow { .. }) => "AMOUNT_OVERFLOW",
            LedgerError::Math(MathError::DivisionByZero) => "DIVISION_BY_ZERO",
            LedgerError::Connector(_) => "DEPENDENCY_FAILED",
            LedgerError::Policy(_) => "DEPENDENCY_FAILED",
            LedgerError::Snapshot(_) => "SNAPSHOT_RESTORE_FAILED",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_vocabulary_is_stable() {
        let account = Address::from_label("account");
        let asset = Address::from_label("asset");

        let cases: Vec<(LedgerError, &str)> = vec![
            (
                LedgerError::NotAllowed {
                    caller: Address::from_label("mallory"),
                    account,
                    op: OpSelector::Deposit,
                },
                "ACTION_NOT_ALLOWED",
            ),
            (
                LedgerError::InsufficientBalance {
                    account,
                    asset,
                    available: 1,
                    requested: 2,
                },
                "ACCOUNTING_INSUFFICIENT_BALANCE",
            ),
            (
                LedgerError::ExitSharesZero {
                    account,
                    strategy: asset,
                },
                "EXIT_SHARES_ZERO",
            ),
            (
                LedgerError::InvalidExitRatio { ratio: u64::MAX },
                "INVALID_EXIT_RATIO",
            ),
            (
                LedgerError::SwapMinAmount {
                    amount_out: 1,
                    min_amount_out: 2,
                },
                "SWAP_MIN_AMOUNT",
            ),
        ];

        for (err, reason) in cases {
            assert_eq!(err.reason(), reason);
        }
    }

    #[test]
    fn math_errors_map_to_distinct_reasons() {
        let overflow: LedgerError = MathError::Overflow {
            a: u64::MAX,
            b: u64::MAX,
            denom: 1,
        }
        .into();
        assert_eq!(overflow.reason(), "AMOUNT_OVERFLOW");

        let div: LedgerError = MathError::DivisionByZero.into();
        assert_eq!(div.reason(), "DIVISION_BY_ZERO");
    }
}
