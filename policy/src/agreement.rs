//! # Multi-Party Agreements
//!
//! An [`Agreement`] is the concrete account policy for custodial mandates:
//! a set of *managers* who may operate the account, a set of *withdrawers*
//! who may receive funds (recipients, never senders), fee terms, a swap
//! slippage cap, and allow-lists over tokens and strategies.
//!
//! Agreements are immutable after construction. [`AgreementBuilder`]
//! validates everything atomically, so a failed build yields no partial
//! object and a built agreement never needs re-checking.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use strongbox_ledger::policy::{
    AccountPolicy, CallbackMask, HookContext, OpRequest, OpSelector, PolicyError,
};
use strongbox_ledger::{Address, FeeError, FeeSchedule, WhitelistRegistry, SCALE};

use crate::allowlist::AllowList;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from agreement construction.
#[derive(Debug, Error)]
pub enum AgreementError {
    /// An agreement needs at least one manager.
    #[error("agreement has no managers")]
    NoManagers,

    /// An agreement needs at least one withdrawer.
    #[error("agreement has no withdrawers")]
    NoWithdrawers,

    /// A manager or withdrawer is the zero address.
    #[error("{role} must not be the zero address")]
    ZeroAddress {
        /// Which role held the zero address ("manager", "withdrawer").
        role: &'static str,
    },

    /// The fee schedule failed validation.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// The slippage cap exceeds 100% of scale.
    #[error("max swap slippage {slippage} exceeds scale")]
    SlippageAboveScale {
        /// The rejected cap.
        slippage: u64,
    },
}

// ---------------------------------------------------------------------------
// Agreement
// ---------------------------------------------------------------------------

/// An immutable delegated-custody mandate bound to one ledger.
#[derive(Debug)]
pub struct Agreement {
    /// The account this agreement speaks for (its wallet identity).
    account: Address,

    /// The only ledger this agreement authorizes operations on.
    ledger: Address,

    managers: HashSet<Address>,
    withdrawers: HashSet<Address>,

    fees: FeeSchedule,
    max_swap_slippage: u64,

    tokens: AllowList,
    strategies: AllowList,

    /// Live registry handle for `CustomAndWhitelisted` lists.
    whitelist: Arc<WhitelistRegistry>,
}

impl Agreement {
    /// Starts a builder for an agreement over `account` on `ledger`,
    /// reading live whitelists from `whitelist`.
    pub fn builder(
        account: Address,
        ledger: Address,
        whitelist: Arc<WhitelistRegistry>,
    ) -> AgreementBuilder {
        AgreementBuilder {
            account,
            ledger,
            whitelist,
            managers: HashSet::new(),
            withdrawers: HashSet::new(),
            fees: None,
            max_swap_slippage: SCALE,
            tokens: AllowList::any(),
            strategies: AllowList::any(),
        }
    }

    /// The account this agreement speaks for.
    pub fn account(&self) -> Address {
        self.account
    }

    /// Returns `true` if `who` is a manager.
    pub fn is_manager(&self, who: Address) -> bool {
        self.managers.contains(&who)
    }

    /// Returns `true` if `who` may receive withdrawals.
    pub fn is_withdrawer(&self, who: Address) -> bool {
        self.withdrawers.contains(&who)
    }

    fn token_permitted(&self, token: Address) -> bool {
        self.tokens
            .permits(token, |t| self.whitelist.is_asset_whitelisted(t))
    }

    fn strategy_permitted(&self, strategy: Address) -> bool {
        self.strategies
            .permits(strategy, |s| self.whitelist.is_strategy_whitelisted(s))
    }
}

impl AccountPolicy for Agreement {
    fn can_perform(
        &self,
        who: Address,
        where_: Address,
        _what: OpSelector,
        how: &OpRequest,
    ) -> bool {
        if where_ != self.ledger {
            debug!(%where_, "agreement bound to a different ledger");
            return false;
        }
        // Only managers act. Withdrawers are recipients, never senders.
        if !self.managers.contains(&who) {
            return false;
        }

        match how {
            OpRequest::Deposit { .. } => true,
            OpRequest::Withdraw { recipient, .. } => self.withdrawers.contains(recipient),
            OpRequest::Swap {
                asset_in,
                asset_out,
                max_slippage,
                ..
            } => {
                *max_slippage <= self.max_swap_slippage
                    && self.token_permitted(*asset_in)
                    && self.token_permitted(*asset_out)
            }
            OpRequest::Join { strategy, .. } | OpRequest::Exit { strategy, .. } => {
                self.strategy_permitted(*strategy)
            }
        }
    }

    fn supported_callbacks(&self) -> CallbackMask {
        CallbackMask::BEFORE_DEPOSIT | CallbackMask::BEFORE_WITHDRAW
    }

    fn fee_schedule(&self) -> Option<FeeSchedule> {
        Some(self.fees)
    }

    fn swap_slippage_cap(&self) -> Option<u64> {
        Some(self.max_swap_slippage)
    }

    /// Grants the ledger an unlimited transfer allowance over the
    /// agreement's wallet the first time a deposit or withdrawal runs, so
    /// wallet-sourced legs never stall on a missing approval.
    fn before_op(&self, ctx: &mut HookContext<'_>) -> Result<(), PolicyError> {
        let asset = match ctx.request {
            OpRequest::Deposit { asset, .. } | OpRequest::Withdraw { asset, .. } => *asset,
            _ => return Ok(()),
        };
        if ctx.assets.allowance(asset, self.account, ctx.ledger) != u64::MAX {
            debug!(account = %self.account, %asset, "granting unlimited ledger allowance");
            ctx.assets.approve(asset, self.account, ctx.ledger, u64::MAX);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects agreement terms, then validates them all at once in
/// [`build`](AgreementBuilder::build).
pub struct AgreementBuilder {
    account: Address,
    ledger: Address,
    whitelist: Arc<WhitelistRegistry>,
    managers: HashSet<Address>,
    withdrawers: HashSet<Address>,
    fees: Option<FeeSchedule>,
    max_swap_slippage: u64,
    tokens: AllowList,
    strategies: AllowList,
}

impl AgreementBuilder {
    /// Adds a manager.
    pub fn manager(mut self, manager: Address) -> Self {
        self.managers.insert(manager);
        self
    }

    /// Adds a withdrawal recipient.
    pub fn withdrawer(mut self, withdrawer: Address) -> Self {
        self.withdrawers.insert(withdrawer);
        self
    }

    /// Sets the fee terms. Defaults to a free schedule collected by the
    /// agreement's own account.
    pub fn fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = Some(fees);
        self
    }

    /// Sets the swap slippage cap (scaled). Defaults to the full scale.
    pub fn max_swap_slippage(mut self, slippage: u64) -> Self {
        self.max_swap_slippage = slippage;
        self
    }

    /// Sets the token allow-list. Defaults to `Any`.
    pub fn tokens(mut self, tokens: AllowList) -> Self {
        self.tokens = tokens;
        self
    }

    /// Sets the strategy allow-list. Defaults to `Any`.
    pub fn strategies(mut self, strategies: AllowList) -> Self {
        self.strategies = strategies;
        self
    }

    /// Validates every term and constructs the agreement.
    ///
    /// # Errors
    ///
    /// All-or-nothing: any invalid term fails the whole build and no
    /// agreement exists.
    pub fn build(self) -> Result<Agreement, AgreementError> {
        if self.managers.is_empty() {
            return Err(AgreementError::NoManagers);
        }
        if self.withdrawers.is_empty() {
            return Err(AgreementError::NoWithdrawers);
        }
        if self.managers.contains(&Address::ZERO) {
            return Err(AgreementError::ZeroAddress { role: "manager" });
        }
        if self.withdrawers.contains(&Address::ZERO) {
            return Err(AgreementError::ZeroAddress { role: "withdrawer" });
        }
        if self.max_swap_slippage > SCALE {
            return Err(AgreementError::SlippageAboveScale {
                slippage: self.max_swap_slippage,
            });
        }

        let fees = self.fees.unwrap_or_else(|| FeeSchedule::free(self.account));
        fees.validate()?;

        Ok(Agreement {
            account: self.account,
            ledger: self.ledger,
            managers: self.managers,
            withdrawers: self.withdrawers,
            fees,
            max_swap_slippage: self.max_swap_slippage,
            tokens: self.tokens,
            strategies: self.strategies,
            whitelist: self.whitelist,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn builder() -> AgreementBuilder {
        Agreement::builder(
            addr("agreement"),
            addr("ledger"),
            Arc::new(WhitelistRegistry::new()),
        )
        .manager(addr("manager"))
        .withdrawer(addr("beneficiary"))
    }

    #[test]
    fn build_requires_managers_and_withdrawers() {
        let whitelist = Arc::new(WhitelistRegistry::new());

        let err = Agreement::builder(addr("a"), addr("l"), Arc::clone(&whitelist))
            .withdrawer(addr("w"))
            .build()
            .unwrap_err();
        assert!(matches!(err, AgreementError::NoManagers));

        let err = Agreement::builder(addr("a"), addr("l"), whitelist)
            .manager(addr("m"))
            .build()
            .unwrap_err();
        assert!(matches!(err, AgreementError::NoWithdrawers));
    }

    #[test]
    fn build_rejects_zero_addresses() {
        let err = builder().manager(Address::ZERO).build().unwrap_err();
        assert!(matches!(
            err,
            AgreementError::ZeroAddress { role: "manager" }
        ));

        let err = builder().withdrawer(Address::ZERO).build().unwrap_err();
        assert!(matches!(
            err,
            AgreementError::ZeroAddress { role: "withdrawer" }
        ));
    }

    #[test]
    fn build_rejects_bad_fees_and_slippage() {
        let bad_fees = FeeSchedule {
            deposit_fee_rate: SCALE + 1,
            ..FeeSchedule::free(addr("collector"))
        };
        assert!(matches!(
            builder().fees(bad_fees).build(),
            Err(AgreementError::Fee(FeeError::RateAboveCap { .. }))
        ));

        assert!(matches!(
            builder().max_swap_slippage(SCALE + 1).build(),
            Err(AgreementError::SlippageAboveScale { .. })
        ));
    }

    #[test]
    fn default_fees_are_free_and_collected_by_the_account() {
        let agreement = builder().build().unwrap();
        let fees = agreement.fee_schedule().unwrap();
        assert_eq!(fees.deposit_fee_rate, 0);
        assert_eq!(fees.collector, addr("agreement"));
    }

    #[test]
    fn only_managers_act_and_only_on_the_bound_ledger() {
        let agreement = builder().build().unwrap();
        let request = OpRequest::Deposit {
            asset: addr("usdc"),
            amount: 100,
        };

        assert!(agreement.can_perform(
            addr("manager"),
            addr("ledger"),
            OpSelector::Deposit,
            &request
        ));
        // Withdrawers are recipients, not senders.
        assert!(!agreement.can_perform(
            addr("beneficiary"),
            addr("ledger"),
            OpSelector::Deposit,
            &request
        ));
        assert!(!agreement.can_perform(
            addr("manager"),
            addr("other-ledger"),
            OpSelector::Deposit,
            &request
        ));
    }

    #[test]
    fn withdraw_gated_on_the_recipient() {
        let agreement = builder().build().unwrap();
        let manager = addr("manager");

        let ok = OpRequest::Withdraw {
            asset: addr("usdc"),
            amount: 100,
            recipient: addr("beneficiary"),
        };
        assert!(agreement.can_perform(manager, addr("ledger"), OpSelector::Withdraw, &ok));

        let bad = OpRequest::Withdraw {
            asset: addr("usdc"),
            amount: 100,
            recipient: addr("mallory"),
        };
        assert!(!agreement.can_perform(manager, addr("ledger"), OpSelector::Withdraw, &bad));
    }

    #[test]
    fn swap_gated_on_slippage_and_token_lists() {
        let agreement = builder()
            .max_swap_slippage(SCALE / 100)
            .tokens(AllowList::custom([addr("usdc"), addr("weth")]))
            .build()
            .unwrap();
        let manager = addr("manager");

        let ok = OpRequest::Swap {
            asset_in: addr("usdc"),
            asset_out: addr("weth"),
            amount_in: 100,
            max_slippage: SCALE / 100,
            data: vec![],
        };
        assert!(agreement.can_perform(manager, addr("ledger"), OpSelector::Swap, &ok));

        let too_loose = OpRequest::Swap {
            asset_in: addr("usdc"),
            asset_out: addr("weth"),
            amount_in: 100,
            max_slippage: SCALE / 50,
            data: vec![],
        };
        assert!(!agreement.can_perform(manager, addr("ledger"), OpSelector::Swap, &too_loose));

        let bad_token = OpRequest::Swap {
            asset_in: addr("usdc"),
            asset_out: addr("shitcoin"),
            amount_in: 100,
            max_slippage: SCALE / 100,
            data: vec![],
        };
        assert!(!agreement.can_perform(manager, addr("ledger"), OpSelector::Swap, &bad_token));
    }

    #[test]
    fn strategy_list_consults_the_live_whitelist() {
        let whitelist = Arc::new(WhitelistRegistry::new());
        let agreement = Agreement::builder(
            addr("agreement"),
            addr("ledger"),
            Arc::clone(&whitelist),
        )
        .manager(addr("manager"))
        .withdrawer(addr("beneficiary"))
        .strategies(AllowList::custom_and_whitelisted([addr("own-strat")]))
        .build()
        .unwrap();

        let request = |strategy| OpRequest::Join {
            strategy,
            amount: 100,
            data: vec![],
        };
        let manager = addr("manager");
        let ledger = addr("ledger");

        assert!(agreement.can_perform(manager, ledger, OpSelector::Join, &request(addr("own-strat"))));
        assert!(!agreement.can_perform(manager, ledger, OpSelector::Join, &request(addr("aave"))));
        // Flipped after construction; the agreement sees it immediately.
        whitelist.set_strategy(addr("aave"), true);
        assert!(agreement.can_perform(manager, ledger, OpSelector::Join, &request(addr("aave"))));
        whitelist.set_strategy(addr("aave"), false);
        assert!(!agreement.can_perform(manager, ledger, OpSelector::Join, &request(addr("aave"))));
    }

    #[test]
    fn declared_capabilities() {
        let agreement = builder().max_swap_slippage(SCALE / 10).build().unwrap();
        let callbacks = agreement.supported_callbacks();
        assert!(callbacks.contains(CallbackMask::BEFORE_DEPOSIT));
        assert!(callbacks.contains(CallbackMask::BEFORE_WITHDRAW));
        assert!(!callbacks.contains(CallbackMask::AFTER_DEPOSIT));
        assert_eq!(agreement.swap_slippage_cap(), Some(SCALE / 10));
    }
}
