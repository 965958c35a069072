//! # Global Whitelist Registry
//!
//! The vault maintains two ledger-wide whitelists -- assets and strategies --
//! that policies in `CustomAndWhitelisted` mode consult *live*: a registry
//! toggle after a policy was constructed changes that policy's authorization
//! outcomes without redeploying it.
//!
//! The registry is explicitly shared state, not a hidden singleton: the vault
//! holds an `Arc<WhitelistRegistry>` and hands read clones to whichever
//! policies want one. Tests inject arbitrary snapshots the same way.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::address::Address;

/// Ledger-wide asset and strategy whitelists.
///
/// Writes go through the vault's admin surface; policies only read.
#[derive(Debug, Default)]
pub struct WhitelistRegistry {
    assets: RwLock<HashSet<Address>>,
    strategies: RwLock<HashSet<Address>>,
}

impl WhitelistRegistry {
    /// Creates an empty registry (nothing whitelisted).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `asset` is on the global asset whitelist.
    pub fn is_asset_whitelisted(&self, asset: Address) -> bool {
        self.assets.read().contains(&asset)
    }

    /// Returns `true` if `strategy` is on the global strategy whitelist.
    pub fn is_strategy_whitelisted(&self, strategy: Address) -> bool {
        self.strategies.read().contains(&strategy)
    }

    /// Adds or removes `asset` from the asset whitelist.
    ///
    /// In production, writes arrive through the vault's admin surface.
    pub fn set_asset(&self, asset: Address, whitelisted: bool) {
        let mut assets = self.assets.write();
        if whitelisted {
            assets.insert(asset);
        } else {
            assets.remove(&asset);
        }
    }

    /// Adds or removes `strategy` from the strategy whitelist.
    pub fn set_strategy(&self, strategy: Address, whitelisted: bool) {
        let mut strategies = self.strategies.write();
        if whitelisted {
            strategies.insert(strategy);
        } else {
            strategies.remove(&strategy);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
