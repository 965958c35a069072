//! # Batch Pipeline Types
//!
//! A [`Batch`] is an ordered list of typed operation requests, each with a
//! flag saying whether its chainable input should be overwritten by the
//! previous step's numeric output. Construction is where the one structural
//! rule is enforced: the first step has no prior output to consume, so a
//! flagged step 0 is rejected before anything touches the vault.
//!
//! Execution semantics (all-or-nothing, per-step authorization, simulation
//! via `query`) live on the vault; this module is just the shape of the work.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::events::Receipt;
use crate::policy::OpRequest;

/// One step of a batch: a request, plus whether to feed it the previous
/// step's output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStep {
    /// The typed operation request.
    pub request: OpRequest,

    /// When set, the step's chainable numeric input is overwritten with the
    /// previous step's output before authorization and execution.
    pub consume_prior: bool,
}

impl BatchStep {
    /// A step executed with its request exactly as written.
    pub fn new(request: OpRequest) -> Self {
        Self {
            request,
            consume_prior: false,
        }
    }

    /// A step whose chainable input comes from the previous step's output.
    pub fn chained(request: OpRequest) -> Self {
        Self {
            request,
            consume_prior: true,
        }
    }
}

/// A validated, ordered list of steps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    steps: Vec<BatchStep>,
}

impl Batch {
    /// Validates and wraps `steps`.
    ///
    /// # Errors
    ///
    /// Returns `BATCH_INVALID_CHAIN` if the first step is flagged to consume
    /// a prior output.
    pub fn new(steps: Vec<BatchStep>) -> Result<Self, LedgerError> {
        if steps.first().is_some_and(|step| step.consume_prior) {
            return Err(LedgerError::InvalidChain { step: 0 });
        }
        Ok(Self { steps })
    }

    /// The steps, in execution order.
    pub fn steps(&self) -> &[BatchStep] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` for the empty batch (valid, commits nothing).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// The result of one executed (or simulated) step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepOutcome {
    /// The step's receipt.
    pub receipt: Receipt,

    /// The step's numeric output, as fed to a chained successor.
    pub output: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    fn deposit_request() -> OpRequest {
        OpRequest::Deposit {
            asset: Address::from_label("usdc"),
            amount: 100,
        }
    }

    #[test]
    fn chained_first_step_rejected_at_construction() {
        let result = Batch::new(vec![BatchStep::chained(deposit_request())]);
        let err = result.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidChain { step: 0 }));
        assert_eq!(err.reason(), "BATCH_INVALID_CHAIN");
    }

    #[test]
    fn chained_later_steps_accepted() {
        let batch = Batch::new(vec![
            BatchStep::new(deposit_request()),
            BatchStep::chained(deposit_request()),
        ])
        .unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.steps()[1].consume_prior);
    }

    #[test]
    fn empty_batch_is_valid() {
        let batch = Batch::new(vec![]).unwrap();
        assert!(batch.is_empty());
    }
}
