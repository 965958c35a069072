//! # Strongbox Policy
//!
//! Concrete account policies for the Strongbox ledger. The centerpiece is
//! the [`agreement::Agreement`]: an immutable multi-party custody mandate
//! with managers, withdrawal recipients, fee terms, a swap slippage cap and
//! token/strategy allow-lists, implementing the ledger's
//! [`AccountPolicy`](strongbox_ledger::AccountPolicy) capability trait.

pub mod agreement;
pub mod allowlist;

pub use agreement::{Agreement, AgreementBuilder, AgreementError};
pub use allowlist::{AllowList, AllowListMode};
