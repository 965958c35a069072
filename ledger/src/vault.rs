//! # The Custody Vault
//!
//! The [`Vault`] is the system: it holds every account's asset balances and
//! strategy positions, performs the six account-scoped operations, runs the
//! batch/query pipeline, and owns the authorization gateway, the whitelist
//! registry and the external collaborators.
//!
//! ## Transactional frame
//!
//! Every public operation runs inside a frame: the internal tables are
//! cloned and each mutating collaborator is checkpointed before the body
//! runs, and any error re-applies the whole capture. That one mechanism
//! gives single-op atomicity, all-or-nothing batches, and `query`'s
//! unconditional discard.
//!
//! ## Fees
//!
//! Two independent fee surfaces meet here. The account's own
//! [`FeeSchedule`] (declared by its policy, absent for plain accounts)
//! drives deposit, withdraw and performance fees, all credited to the
//! schedule's collector inside the ledger. The vault-level protocol fee is
//! non-bypassable and takes its cut of realized exit gains before the
//! performance fee does.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::address::Address;
use crate::balance::BalanceTable;
use crate::connectors::{AssetTransfer, PriceOracle, StrategyAdapter, SwapConnector};
use crate::error::LedgerError;
use crate::events::{OpReceipt, Receipt};
use crate::fees::{FeeError, FeeSchedule};
use crate::gateway::AuthorizationGateway;
use crate::investment::InvestmentTable;
use crate::math::{mul_down, SCALE};
use crate::pipeline::{Batch, StepOutcome};
use crate::policy::{AccountPolicy, CallbackMask, HookContext, OpRequest};
use crate::whitelist::WhitelistRegistry;

// ---------------------------------------------------------------------------
// Transactional frame
// ---------------------------------------------------------------------------

/// A full capture of everything an operation can mutate.
struct Frame {
    balances: BalanceTable,
    investments: InvestmentTable,
    assets: serde_json::Value,
    strategies: HashMap<Address, serde_json::Value>,
    swap_connector: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// The custody ledger.
pub struct Vault {
    /// The vault's own address: custody wallet, allowance spender, and the
    /// venue identity policies check `can_perform` against.
    id: Address,

    /// The only caller the admin surface accepts.
    admin: Address,

    protocol_fee_rate: u64,
    protocol_fee_collector: Address,

    balances: BalanceTable,
    investments: InvestmentTable,

    whitelist: Arc<WhitelistRegistry>,
    gateway: AuthorizationGateway,

    assets: Box<dyn AssetTransfer>,
    strategies: HashMap<Address, Box<dyn StrategyAdapter>>,
    swap_connector: Box<dyn SwapConnector>,
    oracle: Box<dyn PriceOracle>,
}

impl Vault {
    /// Creates a vault with empty books, no registered strategies or
    /// policies, and a zero protocol fee.
    pub fn new(
        id: Address,
        admin: Address,
        assets: Box<dyn AssetTransfer>,
        swap_connector: Box<dyn SwapConnector>,
        oracle: Box<dyn PriceOracle>,
    ) -> Self {
        Self {
            id,
            admin,
            protocol_fee_rate: 0,
            protocol_fee_collector: Address::ZERO,
            balances: BalanceTable::new(),
            investments: InvestmentTable::new(),
            whitelist: Arc::new(WhitelistRegistry::new()),
            gateway: AuthorizationGateway::new(id),
            assets,
            strategies: HashMap::new(),
            swap_connector,
            oracle,
        }
    }

    /// The vault's address.
    pub fn id(&self) -> Address {
        self.id
    }

    /// The ledger balance of `(account, asset)`.
    pub fn balance_of(&self, account: Address, asset: Address) -> u64 {
        self.balances.amount(account, asset)
    }

    /// The shares `account` holds in `strategy`.
    pub fn shares_of(&self, account: Address, strategy: Address) -> u64 {
        self.investments.shares(account, strategy)
    }

    /// The position of `account` in `strategy` as `(shares, invested_value)`.
    pub fn position_of(&self, account: Address, strategy: Address) -> (u64, u64) {
        self.investments
            .position(account, strategy)
            .map(|i| (i.shares, i.invested_value))
            .unwrap_or((0, 0))
    }

    /// All non-zero holdings of `account`.
    pub fn holdings(&self, account: Address) -> Vec<(Address, u64)> {
        self.balances.holdings(account)
    }

    /// A read handle to the live whitelist registry, for policies that
    /// consult it.
    pub fn whitelist(&self) -> Arc<WhitelistRegistry> {
        Arc::clone(&self.whitelist)
    }

    /// The account's declared fee schedule, if its policy exposes one.
    ///
    /// Policies are external code, so the declared schedule is validated
    /// here at the seam. An over-cap rate or zero collector aborts the
    /// operation instead of corrupting a fee leg.
    fn fee_schedule_of(&self, account: Address) -> Result<Option<FeeSchedule>, LedgerError> {
        match self
            .gateway
            .policy_of(account)
            .and_then(|policy| policy.fee_schedule())
        {
            Some(schedule) => {
                schedule.validate()?;
                Ok(Some(schedule))
            }
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Admin surface
    // -----------------------------------------------------------------------

    fn require_admin(&self, caller: Address) -> Result<(), LedgerError> {
        if caller != self.admin {
            return Err(LedgerError::AdminOnly { caller });
        }
        Ok(())
    }

    /// Adds or removes `asset` from the global asset whitelist.
    pub fn set_asset_whitelisted(
        &mut self,
        caller: Address,
        asset: Address,
        whitelisted: bool,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        self.whitelist.set_asset(asset, whitelisted);
        info!(%asset, whitelisted, "asset whitelist updated");
        Ok(())
    }

    /// Adds or removes `strategy` from the global strategy whitelist.
    pub fn set_strategy_whitelisted(
        &mut self,
        caller: Address,
        strategy: Address,
        whitelisted: bool,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        self.whitelist.set_strategy(strategy, whitelisted);
        info!(%strategy, whitelisted, "strategy whitelist updated");
        Ok(())
    }

    /// Sets the protocol fee rate (<= scale) and its collector.
    pub fn set_protocol_fee(
        &mut self,
        caller: Address,
        rate: u64,
        collector: Address,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        if rate > SCALE {
            return Err(LedgerError::Fee(FeeError::RateAboveCap {
                name: "protocol",
                rate,
                cap: SCALE,
            }));
        }
        if collector.is_zero() {
            return Err(LedgerError::Fee(FeeError::ZeroCollector));
        }
        self.protocol_fee_rate = rate;
        self.protocol_fee_collector = collector;
        info!(rate, %collector, "protocol fee updated");
        Ok(())
    }

    /// Registers `adapter` as the strategy at `strategy`.
    pub fn register_strategy(
        &mut self,
        caller: Address,
        strategy: Address,
        adapter: Box<dyn StrategyAdapter>,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        self.strategies.insert(strategy, adapter);
        info!(%strategy, "strategy registered");
        Ok(())
    }

    /// Replaces the swap execution venue.
    pub fn set_swap_connector(
        &mut self,
        caller: Address,
        connector: Box<dyn SwapConnector>,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        self.swap_connector = connector;
        Ok(())
    }

    /// Replaces the price oracle.
    pub fn set_oracle(
        &mut self,
        caller: Address,
        oracle: Box<dyn PriceOracle>,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        self.oracle = oracle;
        Ok(())
    }

    /// Binds `account` to `policy`. Open: an account (or whoever deploys on
    /// its behalf) declares its own authorization surface.
    pub fn register_policy(&mut self, account: Address, policy: Arc<dyn AccountPolicy>) {
        self.gateway.register(account, policy);
        info!(%account, "policy registered");
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Credits `amount` of `asset` into `account`'s ledger balance, pulled
    /// from the caller's external wallet. Output: net credited.
    pub fn deposit(
        &mut self,
        caller: Address,
        account: Address,
        asset: Address,
        amount: u64,
    ) -> Result<Receipt, LedgerError> {
        debug!(%caller, %account, %asset, amount, "deposit");
        self.transact(|vault| {
            vault.execute(caller, account, OpRequest::Deposit { asset, amount })
        })
    }

    /// Pays `amount` of `asset` out of `account`'s holdings to `recipient`.
    /// Output: amount received.
    pub fn withdraw(
        &mut self,
        caller: Address,
        account: Address,
        asset: Address,
        amount: u64,
        recipient: Address,
    ) -> Result<Receipt, LedgerError> {
        debug!(%caller, %account, %asset, amount, %recipient, "withdraw");
        self.transact(|vault| {
            vault.execute(
                caller,
                account,
                OpRequest::Withdraw {
                    asset,
                    amount,
                    recipient,
                },
            )
        })
    }

    /// Trades `amount_in` of `asset_in` for `asset_out` inside the account's
    /// ledger holdings. Output: amount bought.
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        &mut self,
        caller: Address,
        account: Address,
        asset_in: Address,
        asset_out: Address,
        amount_in: u64,
        max_slippage: u64,
        data: Vec<u8>,
    ) -> Result<Receipt, LedgerError> {
        debug!(%caller, %account, %asset_in, %asset_out, amount_in, "swap");
        self.transact(|vault| {
            vault.execute(
                caller,
                account,
                OpRequest::Swap {
                    asset_in,
                    asset_out,
                    amount_in,
                    max_slippage,
                    data,
                },
            )
        })
    }

    /// Invests `amount` of the strategy's underlying asset. Output: shares
    /// minted.
    pub fn join(
        &mut self,
        caller: Address,
        account: Address,
        strategy: Address,
        amount: u64,
        data: Vec<u8>,
    ) -> Result<Receipt, LedgerError> {
        debug!(%caller, %account, %strategy, amount, "join");
        self.transact(|vault| {
            vault.execute(
                caller,
                account,
                OpRequest::Join {
                    strategy,
                    amount,
                    data,
                },
            )
        })
    }

    /// Divests `ratio` (scaled, <= 100%) of the strategy position. Output:
    /// net credited.
    pub fn exit(
        &mut self,
        caller: Address,
        account: Address,
        strategy: Address,
        ratio: u64,
        emergency: bool,
        data: Vec<u8>,
    ) -> Result<Receipt, LedgerError> {
        debug!(%caller, %account, %strategy, ratio, emergency, "exit");
        self.transact(|vault| {
            vault.execute(
                caller,
                account,
                OpRequest::Exit {
                    strategy,
                    ratio,
                    emergency,
                    data,
                },
            )
        })
    }

    /// Executes a batch all-or-nothing: any failing step unwinds every
    /// committed step. Per-step authorization is identical to standalone
    /// invocation; one receipt per step.
    pub fn batch(
        &mut self,
        caller: Address,
        account: Address,
        batch: &Batch,
    ) -> Result<Vec<StepOutcome>, LedgerError> {
        debug!(%caller, %account, steps = batch.len(), "batch");
        self.transact(|vault| vault.run_batch(caller, account, batch))
    }

    /// Simulates a batch: runs the identical pipeline, then unconditionally
    /// restores all state, returning the per-step outcomes.
    pub fn query(
        &mut self,
        caller: Address,
        account: Address,
        batch: &Batch,
    ) -> Result<Vec<StepOutcome>, LedgerError> {
        debug!(%caller, %account, steps = batch.len(), "query");
        let frame = self.checkpoint();
        let result = self.run_batch(caller, account, batch);
        self.restore(frame)?;
        result
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    fn run_batch(
        &mut self,
        caller: Address,
        account: Address,
        batch: &Batch,
    ) -> Result<Vec<StepOutcome>, LedgerError> {
        let mut outcomes = Vec::with_capacity(batch.len());
        let mut prior: Option<u64> = None;

        for (index, step) in batch.steps().iter().enumerate() {
            let request = if step.consume_prior {
                // Batch::new rejects a flagged first step, so prior is set.
                let value = prior.ok_or(LedgerError::InvalidChain { step: index })?;
                step.request.clone().with_input(value)
            } else {
                step.request.clone()
            };

            let receipt = self.execute(caller, account, request)?;
            let output = receipt.output();
            prior = Some(output);
            outcomes.push(StepOutcome { receipt, output });
        }

        Ok(outcomes)
    }

    /// Authorizes and performs one request, with lifecycle hooks. Runs
    /// inside a caller-provided frame; commits nothing on its own.
    fn execute(
        &mut self,
        caller: Address,
        account: Address,
        request: OpRequest,
    ) -> Result<Receipt, LedgerError> {
        let mediator = self.gateway.authorize(caller, account, &request)?;
        let op = request.selector();

        if let Some(policy) = &mediator {
            if policy.supported_callbacks().contains(CallbackMask::before(op)) {
                let mut ctx = HookContext {
                    caller,
                    account,
                    ledger: self.id,
                    request: &request,
                    assets: self.assets.as_mut(),
                };
                policy.before_op(&mut ctx)?;
            }
        }

        let op_receipt = match request.clone() {
            OpRequest::Deposit { asset, amount } => {
                self.do_deposit(caller, account, asset, amount)?
            }
            OpRequest::Withdraw {
                asset,
                amount,
                recipient,
            } => self.do_withdraw(account, asset, amount, recipient)?,
            OpRequest::Swap {
                asset_in,
                asset_out,
                amount_in,
                max_slippage,
                data,
            } => self.do_swap(account, asset_in, asset_out, amount_in, max_slippage, &data)?,
            OpRequest::Join {
                strategy,
                amount,
                data,
            } => self.do_join(account, strategy, amount, &data)?,
            OpRequest::Exit {
                strategy,
                ratio,
                emergency,
                data,
            } => self.do_exit(account, strategy, ratio, emergency, &data)?,
        };

        if let Some(policy) = &mediator {
            if policy.supported_callbacks().contains(CallbackMask::after(op)) {
                let mut ctx = HookContext {
                    caller,
                    account,
                    ledger: self.id,
                    request: &request,
                    assets: self.assets.as_mut(),
                };
                policy.after_op(&mut ctx)?;
            }
        }

        let receipt = Receipt::new(caller, account, op_receipt);
        info!(
            %caller,
            %account,
            %op,
            output = receipt.output(),
            receipt_id = %receipt.id,
            "operation committed"
        );
        Ok(receipt)
    }

    // -----------------------------------------------------------------------
    // Operation bodies
    // -----------------------------------------------------------------------

    fn do_deposit(
        &mut self,
        caller: Address,
        account: Address,
        asset: Address,
        amount: u64,
    ) -> Result<OpReceipt, LedgerError> {
        // Funds come from the invoker's wallet, not the account's.
        self.assets
            .transfer_from(asset, self.id, caller, self.id, amount)?;

        let schedule = self.fee_schedule_of(account)?;
        let fee = match &schedule {
            Some(s) => mul_down(amount, s.deposit_fee_rate)?,
            None => 0,
        };
        if let Some(s) = &schedule {
            self.balances.credit(s.collector, asset, fee)?;
        }

        let net = amount - fee;
        self.balances.credit(account, asset, net)?;

        Ok(OpReceipt::Deposit {
            asset,
            gross: amount,
            fee,
            net,
        })
    }

    fn do_withdraw(
        &mut self,
        account: Address,
        asset: Address,
        amount: u64,
        recipient: Address,
    ) -> Result<OpReceipt, LedgerError> {
        let ledger_balance = self.balances.amount(account, asset);
        let allowance = self.assets.allowance(asset, account, self.id);
        let available = ledger_balance.saturating_add(allowance);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                asset,
                available,
                requested: amount,
            });
        }

        // Ledger custody first; the shortfall comes straight out of the
        // account's wallet, fee-exempt.
        let from_ledger = amount.min(ledger_balance);
        let from_wallet = amount - from_ledger;

        let schedule = self.fee_schedule_of(account)?;
        let fee = match &schedule {
            Some(s) => mul_down(from_ledger, s.withdraw_fee_rate)?,
            None => 0,
        };

        self.balances.debit(account, asset, from_ledger)?;
        if let Some(s) = &schedule {
            self.balances.credit(s.collector, asset, fee)?;
        }
        self.assets
            .transfer(asset, self.id, recipient, from_ledger - fee)?;
        if from_wallet > 0 {
            self.assets
                .transfer_from(asset, self.id, account, recipient, from_wallet)?;
        }

        Ok(OpReceipt::Withdraw {
            asset,
            requested: amount,
            from_ledger,
            from_wallet,
            fee,
            paid: amount - fee,
            recipient,
        })
    }

    fn do_swap(
        &mut self,
        account: Address,
        asset_in: Address,
        asset_out: Address,
        amount_in: u64,
        max_slippage: u64,
        data: &[u8],
    ) -> Result<OpReceipt, LedgerError> {
        if max_slippage > SCALE {
            return Err(LedgerError::InvalidSlippage {
                slippage: max_slippage,
            });
        }
        let cap = self
            .gateway
            .policy_of(account)
            .and_then(|policy| policy.swap_slippage_cap());
        let slippage = cap.map_or(max_slippage, |c| max_slippage.min(c));

        self.balances.debit(account, asset_in, amount_in)?;

        let reference = self.oracle.reference_rate(asset_in, asset_out)?;
        let min_out = mul_down(mul_down(amount_in, reference)?, SCALE - slippage)?;

        let (amount_out, remaining_in) =
            self.swap_connector
                .swap(asset_in, asset_out, amount_in, min_out, data)?;

        // Refund unconsumed input before judging the output, so a partial
        // fill that still clears the bound leaves the books exact.
        self.balances.credit(account, asset_in, remaining_in)?;

        if amount_out < min_out {
            return Err(LedgerError::SwapMinAmount {
                amount_out,
                min_amount_out: min_out,
            });
        }
        self.balances.credit(account, asset_out, amount_out)?;

        Ok(OpReceipt::Swap {
            asset_in,
            asset_out,
            amount_in,
            remaining_in,
            amount_out,
            min_amount_out: min_out,
        })
    }

    fn do_join(
        &mut self,
        account: Address,
        strategy: Address,
        amount: u64,
        data: &[u8],
    ) -> Result<OpReceipt, LedgerError> {
        let asset = self
            .strategies
            .get(&strategy)
            .ok_or(LedgerError::UnknownStrategy(strategy))?
            .asset();

        self.balances.debit(account, asset, amount)?;
        self.assets.transfer(asset, self.id, strategy, amount)?;

        let adapter = self
            .strategies
            .get_mut(&strategy)
            .ok_or(LedgerError::UnknownStrategy(strategy))?;
        let shares = adapter.deposit(amount, data)?;

        self.investments.join(account, strategy, shares, amount)?;

        Ok(OpReceipt::Join {
            strategy,
            asset,
            amount,
            shares,
        })
    }

    fn do_exit(
        &mut self,
        account: Address,
        strategy: Address,
        ratio: u64,
        emergency: bool,
        data: &[u8],
    ) -> Result<OpReceipt, LedgerError> {
        if ratio > SCALE {
            return Err(LedgerError::InvalidExitRatio { ratio });
        }

        let (shares, invested_value) = self.position_of(account, strategy);
        let shares_to_redeem = mul_down(shares, ratio)?;
        if shares_to_redeem == 0 {
            return Err(LedgerError::ExitSharesZero { account, strategy });
        }

        let adapter = self
            .strategies
            .get_mut(&strategy)
            .ok_or(LedgerError::UnknownStrategy(strategy))?;
        let asset = adapter.asset();
        let redeemed = adapter.redeem(shares_to_redeem, emergency, data)?;

        // Gains first, then the protocol's cut, then the performance cut of
        // what the protocol left. The order is part of the contract.
        let invested_portion = mul_down(invested_value, ratio)?;
        let gains = redeemed.saturating_sub(invested_portion);
        let protocol_fee = mul_down(gains, self.protocol_fee_rate)?;
        let schedule = self.fee_schedule_of(account)?;
        let performance_fee = match &schedule {
            Some(s) => mul_down(gains - protocol_fee, s.performance_fee_rate)?,
            None => 0,
        };
        let net = redeemed - protocol_fee - performance_fee;

        self.balances
            .credit(self.protocol_fee_collector, asset, protocol_fee)?;
        if let Some(s) = &schedule {
            self.balances.credit(s.collector, asset, performance_fee)?;
        }
        self.balances.credit(account, asset, net)?;
        self.investments
            .exit(account, strategy, shares_to_redeem, invested_portion);

        Ok(OpReceipt::Exit {
            strategy,
            asset,
            shares: shares_to_redeem,
            redeemed,
            gains,
            protocol_fee,
            performance_fee,
            net,
        })
    }

    // -----------------------------------------------------------------------
    // Frame plumbing
    // -----------------------------------------------------------------------

    fn transact<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let frame = self.checkpoint();
        match body(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.restore(frame)?;
                debug!(reason = err.reason(), "operation aborted, state restored");
                Err(err)
            }
        }
    }

    fn checkpoint(&self) -> Frame {
        Frame {
            balances: self.balances.clone(),
            investments: self.investments.clone(),
            assets: self.assets.checkpoint(),
            strategies: self
                .strategies
                .iter()
                .map(|(addr, adapter)| (*addr, adapter.checkpoint()))
                .collect(),
            swap_connector: self.swap_connector.checkpoint(),
        }
    }

    fn restore(&mut self, frame: Frame) -> Result<(), LedgerError> {
        self.balances = frame.balances;
        self.investments = frame.investments;
        self.assets.restore(frame.assets)?;
        for (addr, snapshot) in frame.strategies {
            if let Some(adapter) = self.strategies.get_mut(&addr) {
                adapter.restore(snapshot)?;
            }
        }
        self.swap_connector.restore(frame.swap_connector)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::memory::{RateSwapConnector, SharedAssetBook, TableOracle};

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn vault() -> (Vault, SharedAssetBook) {
        let book = SharedAssetBook::new();
        let ledger = addr("ledger");
        let vault = Vault::new(
            ledger,
            addr("admin"),
            Box::new(book.clone()),
            Box::new(RateSwapConnector::new(addr("venue"), ledger, book.clone())),
            Box::new(TableOracle::new()),
        );
        (vault, book)
    }

    #[test]
    fn admin_surface_rejects_non_admin() {
        let (mut vault, _) = vault();
        let mallory = addr("mallory");

        let err = vault
            .set_asset_whitelisted(mallory, addr("usdc"), true)
            .unwrap_err();
        assert_eq!(err.reason(), "ACTION_NOT_ALLOWED");

        let err = vault
            .set_protocol_fee(mallory, SCALE / 10, addr("treasury"))
            .unwrap_err();
        assert_eq!(err.reason(), "ACTION_NOT_ALLOWED");
    }

    #[test]
    fn protocol_fee_validation() {
        let (mut vault, _) = vault();
        let admin = addr("admin");

        assert!(matches!(
            vault.set_protocol_fee(admin, SCALE + 1, addr("treasury")),
            Err(LedgerError::Fee(FeeError::RateAboveCap { .. }))
        ));
        assert!(matches!(
            vault.set_protocol_fee(admin, SCALE / 10, Address::ZERO),
            Err(LedgerError::Fee(FeeError::ZeroCollector))
        ));
        assert!(vault
            .set_protocol_fee(admin, SCALE / 10, addr("treasury"))
            .is_ok());
    }

    #[test]
    fn join_against_unknown_strategy_rejected() {
        let (mut vault, _) = vault();
        let owner = addr("owner");
        let err = vault
            .join(owner, owner, addr("nowhere"), 100, vec![])
            .unwrap_err();
        assert_eq!(err.reason(), "STRATEGY_NOT_REGISTERED");
    }

    #[test]
    fn exit_ratio_above_scale_rejected() {
        let (mut vault, _) = vault();
        let owner = addr("owner");
        let err = vault
            .exit(owner, owner, addr("strat"), SCALE + 1, false, vec![])
            .unwrap_err();
        assert_eq!(err.reason(), "INVALID_EXIT_RATIO");
    }

    #[test]
    fn deposit_failure_leaves_no_trace() {
        let (mut vault, book) = vault();
        let owner = addr("owner");
        let usdc = addr("usdc");

        // No allowance granted: the wallet pull fails.
        book.mint(usdc, owner, 1000);
        let err = vault.deposit(owner, owner, usdc, 500).unwrap_err();
        assert_eq!(err.reason(), "DEPENDENCY_FAILED");
        assert_eq!(vault.balance_of(owner, usdc), 0);
    }
}
