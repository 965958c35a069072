//! # Authorization Gateway
//!
//! The single chokepoint every account-scoped operation passes through
//! before the vault mutates anything.
//!
//! The rules are short and load-bearing:
//!
//! 1. Self-service always passes: `caller == account` is authorized with no
//!    policy consulted and no callbacks.
//! 2. Anything else requires a registered [`AccountPolicy`] for the account,
//!    and that policy's `can_perform` must return `true` for the exact typed
//!    request. No policy, or a `false`, is `ACTION_NOT_ALLOWED`.
//!
//! The gateway only decides; the vault drives the policy's lifecycle hooks
//! around the mutation itself.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::address::Address;
use crate::error::LedgerError;
use crate::policy::{AccountPolicy, OpRequest};

/// Account-to-policy bindings plus the authorization decision procedure.
pub struct AuthorizationGateway {
    /// The ledger's own address, passed to `can_perform` as the venue.
    ledger: Address,

    policies: HashMap<Address, Arc<dyn AccountPolicy>>,
}

impl AuthorizationGateway {
    /// Creates a gateway for the ledger at `ledger`, with no bindings.
    pub fn new(ledger: Address) -> Self {
        Self {
            ledger,
            policies: HashMap::new(),
        }
    }

    /// Binds `account` to `policy`, replacing any previous binding.
    pub fn register(&mut self, account: Address, policy: Arc<dyn AccountPolicy>) {
        self.policies.insert(account, policy);
    }

    /// The policy bound to `account`, if any.
    pub fn policy_of(&self, account: Address) -> Option<Arc<dyn AccountPolicy>> {
        self.policies.get(&account).cloned()
    }

    /// Decides whether `caller` may perform `request` on behalf of `account`.
    ///
    /// Returns the policy that mediated the call (`None` for self-service,
    /// where no callbacks fire).
    ///
    /// # Errors
    ///
    /// `ACTION_NOT_ALLOWED` when no policy is registered for a delegated
    /// call, or when the policy declines.
    pub fn authorize(
        &self,
        caller: Address,
        account: Address,
        request: &OpRequest,
    ) -> Result<Option<Arc<dyn AccountPolicy>>, LedgerError> {
        if caller == account {
            return Ok(None);
        }

        let op = request.selector();
        let rejected = || LedgerError::NotAllowed {
            caller,
            account,
            op,
        };

        let policy = self.policy_of(account).ok_or_else(rejected)?;
        if !policy.can_perform(caller, self.ledger, op, request) {
            debug!(%caller, %account, %op, "policy declined");
            return Err(rejected());
        }
        Ok(Some(policy))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
