//! # Strongbox Ledger
//!
//! A custodial multi-account, multi-asset ledger with pluggable yield
//! strategies and delegated authorization.
//!
//! ## Architecture
//!
//! ```text
//!                 +---------------------+
//!    caller ----> | AuthorizationGateway| --> AccountPolicy (per account)
//!                 +---------------------+
//!                           |
//!                           v
//!                 +---------------------+       +------------------+
//!                 |        Vault        | <---> |  AssetTransfer   |
//!                 |  balances           |       |  StrategyAdapter |
//!                 |  investments        |       |  SwapConnector   |
//!                 |  batch / query      |       |  PriceOracle     |
//!                 +---------------------+       +------------------+
//! ```
//!
//! The [`vault::Vault`] owns the books and the collaborators; every
//! account-scoped operation passes through the
//! [`gateway::AuthorizationGateway`] and runs inside a transactional frame,
//! so any failure is a full abort with zero state change.
//!
//! ## Modules
//!
//! - [`address`] -- 20-byte addresses, hex serde
//! - [`math`] -- the fixed-point scale and rounding-down helpers
//! - [`balance`] / [`investment`] -- the custody books
//! - [`fees`] -- account fee schedules
//! - [`policy`] -- the `AccountPolicy` capability trait and typed requests
//! - [`gateway`] -- the authorization chokepoint
//! - [`whitelist`] -- the live asset/strategy whitelist registry
//! - [`connectors`] -- external collaborator traits + in-memory references
//! - [`events`] -- operation receipts
//! - [`pipeline`] -- batch construction and step outcomes
//! - [`vault`] -- the ledger itself
//! - [`error`] -- the error enum and its fixed reason vocabulary

pub mod address;
pub mod balance;
pub mod connectors;
pub mod error;
pub mod events;
pub mod fees;
pub mod gateway;
pub mod investment;
pub mod math;
pub mod pipeline;
pub mod policy;
pub mod vault;
pub mod whitelist;

pub use address::Address;
pub use error::LedgerError;
pub use events::{OpReceipt, Receipt};
pub use fees::{FeeError, FeeSchedule};
pub use math::{div_down, mul_down, MathError, SCALE};
pub use pipeline::{Batch, BatchStep, StepOutcome};
pub use policy::{AccountPolicy, CallbackMask, HookContext, OpRequest, OpSelector, PolicyError};
pub use vault::Vault;
pub use whitelist::WhitelistRegistry;
