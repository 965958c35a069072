//! # Allow-List Lattice
//!
//! Agreements restrict which tokens can be swapped and which strategies can
//! be joined through the same three-mode shape:
//!
//! - `Any` -- everything passes;
//! - `Custom` -- only the agreement's own set passes;
//! - `CustomAndWhitelisted` -- the agreement's own set passes, and so does
//!   anything on the ledger's *live* whitelist at evaluation time.
//!
//! The live check is supplied by the caller per lookup, so one `AllowList`
//! serves both the token and the strategy lists without holding a registry
//! handle itself.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use strongbox_ledger::Address;

/// How an [`AllowList`] combines its own entries with the ledger whitelist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllowListMode {
    /// Everything is permitted; the entry set is ignored.
    Any,
    /// Only the entry set is permitted.
    Custom,
    /// The entry set is permitted, plus whatever the ledger whitelist says
    /// at evaluation time.
    CustomAndWhitelisted,
}

/// An address filter with one of the three modes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    mode: AllowListMode,
    entries: HashSet<Address>,
}

impl AllowList {
    /// Permits everything.
    pub fn any() -> Self {
        Self {
            mode: AllowListMode::Any,
            entries: HashSet::new(),
        }
    }

    /// Permits only `entries`.
    pub fn custom(entries: impl IntoIterator<Item = Address>) -> Self {
        Self {
            mode: AllowListMode::Custom,
            entries: entries.into_iter().collect(),
        }
    }

    /// Permits `entries` plus whatever the live whitelist permits.
    pub fn custom_and_whitelisted(entries: impl IntoIterator<Item = Address>) -> Self {
        Self {
            mode: AllowListMode::CustomAndWhitelisted,
            entries: entries.into_iter().collect(),
        }
    }

    /// The list's mode.
    pub fn mode(&self) -> AllowListMode {
        self.mode
    }

    /// Decides whether `address` passes, consulting `live` only in
    /// `CustomAndWhitelisted` mode and only when the own set misses.
    pub fn permits(&self, address: Address, live: impl FnOnce(Address) -> bool) -> bool {
        match self.mode {
            AllowListMode::Any => true,
            AllowListMode::Custom => self.entries.contains(&address),
            AllowListMode::CustomAndWhitelisted => {
                self.entries.contains(&address) || live(address)
            }
        }
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

    #[test]
    fn any_permits_everything() {
        let list = AllowList::any();
        assert!(list.permits(addr("whatever"), |_| false));
    }

    #[test]
    fn custom_ignores_the_live_check() {
        let list = AllowList::custom([addr("usdc")]);
        assert!(list.permits(addr("usdc"), |_| false));
        // Live whitelist says yes, mode says it doesn't matter.
        assert!(!list.permits(addr("weth"), |_| true));
    }

    #[test]
    fn custom_and_whitelisted_unions_both_sources() {
        let list = AllowList::custom_and_whitelisted([addr("usdc")]);
        assert!(list.permits(addr("usdc"), |_| false));
        assert!(list.permits(addr("weth"), |a| a == addr("weth")));
        assert!(!list.permits(addr("dai"), |_| false));
    }

    #[test]
    fn serialization_roundtrip() {
        let list = AllowList::custom([addr("usdc"), addr("weth")]);
        let json = serde_json::to_string(&list).expect("serialize");
        let recovered: AllowList = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered, list);
        assert_eq!(recovered.mode(), AllowListMode::Custom);
    }
}
