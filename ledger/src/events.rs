//! # Operation Receipts
//!
//! Every committed ledger operation produces a [`Receipt`]: a unique id, a
//! timestamp, who invoked it and for whom, and the full per-operation
//! breakdown (amounts, fees, counterparts). Receipts are the audit surface;
//! the batch pipeline also reads each receipt's numeric
//! [`output`](Receipt::output) to feed chained steps.
//!
//! Receipts serialize to JSON and are safe to persist or ship to an indexer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;

/// The per-operation breakdown of a committed receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpReceipt {
    /// Funds credited into the account's ledger balance.
    Deposit {
        /// Asset deposited.
        asset: Address,
        /// Amount pulled from the caller's wallet.
        gross: u64,
        /// Deposit fee taken, credited to the account's fee collector.
        fee: u64,
        /// Amount credited to the account. The operation's output.
        net: u64,
    },

    /// Funds paid out of the account's holdings.
    Withdraw {
        /// Asset withdrawn.
        asset: Address,
        /// Total amount requested.
        requested: u64,
        /// Portion sourced from the ledger balance (fee applies here).
        from_ledger: u64,
        /// Portion pulled straight from the account's wallet, fee-exempt.
        from_wallet: u64,
        /// Withdraw fee taken on the ledger-sourced portion.
        fee: u64,
        /// Amount the recipient received. The operation's output.
        paid: u64,
        /// Where the funds went.
        recipient: Address,
    },

    /// One ledger-held asset traded for another.
    Swap {
        /// Asset sold.
        asset_in: Address,
        /// Asset bought.
        asset_out: Address,
        /// Amount of `asset_in` offered to the venue.
        amount_in: u64,
        /// Unconsumed input refunded to the account's ledger balance.
        remaining_in: u64,
        /// Output delivered and credited. The operation's output.
        amount_out: u64,
        /// The oracle-derived minimum the output was checked against.
        min_amount_out: u64,
    },

    /// Ledger-held funds invested into a strategy.
    Join {
        /// The strategy invested into.
        strategy: Address,
        /// The strategy's underlying asset, debited from the account.
        asset: Address,
        /// Amount invested.
        amount: u64,
        /// Shares minted by the strategy. The operation's output.
        shares: u64,
    },

    /// A portion of a strategy position divested.
    Exit {
        /// The strategy divested from.
        strategy: Address,
        /// The strategy's underlying asset, credited to the account.
        asset: Address,
        /// Shares redeemed.
        shares: u64,
        /// Amount the strategy paid back at its current rate.
        redeemed: u64,
        /// Realized gain over the proportional invested value.
        gains: u64,
        /// Protocol's cut of the gains.
        protocol_fee: u64,
        /// Account fee collector's cut of the gains, after the protocol fee.
        performance_fee: u64,
        /// Amount credited to the account. The operation's output.
        net: u64,
    },
}

/// The audit record of one committed ledger operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Receipt {
    /// Unique receipt identifier.
    pub id: Uuid,

    /// When the operation committed.
    pub timestamp: DateTime<Utc>,

    /// The invoker the gateway authorized.
    pub caller: Address,

    /// The account the operation ran on behalf of.
    pub account: Address,

    /// The per-operation breakdown.
    pub op: OpReceipt,
}

impl Receipt {
    /// Stamps a fresh receipt for `op`, invoked by `caller` for `account`.
    pub fn new(caller: Address, account: Address, op: OpReceipt) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            caller,
            account,
            op,
        }
    }

    /// The operation's numeric output, as fed to a chained batch step.
    pub fn output(&self) -> u64 {
        match self.op {
            OpReceipt::Deposit { net, .. } => net,
            OpReceipt::Withdraw { paid, .. } => paid,
            OpReceipt::Swap { amount_out, .. } => amount_out,
            OpReceipt::Join { shares, .. } => shares,
            OpReceipt::Exit { net, .. } => net,
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
    fn output_picks_the_chainable_field() {
        let a = Address::from_label("a");
        let receipt = Receipt::new(
            a,
            a,
            OpReceipt::Swap {
                asset_in: a,
                asset_out: a,
                amount_in: 100,
                remaining_in: 10,
                amount_out: 45,
                min_amount_out: 40,
            },
        );
        assert_eq!(receipt.output(), 45);

        let receipt = Receipt::new(
            a,
            a,
            OpReceipt::Join {
                strategy: a,
                asset: a,
                amount: 500,
                shares: 480,
            },
        );
        assert_eq!(receipt.output(), 480);
    }

    #[test]
    fn receipts_serialize_round_trip() {
        let caller = Address::from_label("manager");
        let account = Address::from_label("agreement");
        let receipt = Receipt::new(
            caller,
            account,
            OpReceipt::Deposit {
                asset: Address::from_label("usdc"),
                gross: 1000,
                fee: 10,
                net: 990,
            },
        );

        let json = serde_json::to_string(&receipt).unwrap();
        let back: Receipt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, receipt.id);
        assert_eq!(back.op, receipt.op);
    }
}
