//! Saga Runner
//!
//! The provisioning workflow is a forward-only sequence of remote
//! mutations with no atomic commit. Each completed step records its
//! compensating action here; when a later step fails the runner either
//! leaves the partial state in place (the default, matching the
//! processor-side behavior donors have always seen) or unwinds it in
//! reverse order, depending on the configured policy.

use crate::processor::{CustomerRef, PaymentProcessor, PriceRef, ProcessorError, ProductRef};

/// What to do with already-completed steps when a later step fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompensationPolicy {
    /// Leave partially created remote entities in place (orphaned customers
    /// are logged and accepted)
    #[default]
    ForwardOnly,

    /// Run compensating actions for completed steps in reverse order
    CompensateOnFailure,
}

impl CompensationPolicy {
    /// Parse from a configuration string, defaulting to forward-only
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "compensate" | "compensate_on_failure" => CompensationPolicy::CompensateOnFailure,
            _ => CompensationPolicy::ForwardOnly,
        }
    }
}

/// Compensating action for one completed provisioning step
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Compensation {
    DeleteCustomer(CustomerRef),
    DeleteProduct(ProductRef),
    DeactivatePrice(PriceRef),
}

impl Compensation {
    async fn run(&self, processor: &dyn PaymentProcessor) -> Result<(), ProcessorError> {
        match self {
            Compensation::DeleteCustomer(customer) => processor.delete_customer(customer).await,
            Compensation::DeleteProduct(product) => processor.delete_product(product).await,
            Compensation::DeactivatePrice(price) => processor.deactivate_price(price).await,
        }
    }
}

/// Log of completed steps for one request
pub struct Saga {
    policy: CompensationPolicy,
    completed: Vec<Compensation>,
}

impl Saga {
    pub fn new(policy: CompensationPolicy) -> Self {
        Self {
            policy,
            completed: Vec::new(),
        }
    }

    /// Record the compensating action for a step that just completed
    pub fn record(&mut self, compensation: Compensation) {
        self.completed.push(compensation);
    }

    /// Handle a failed workflow according to the policy.
    ///
    /// Compensation failures are logged and swallowed; they must never
    /// mask the error that aborted the workflow.
    pub async fn unwind(self, processor: &dyn PaymentProcessor) {
        match self.policy {
            CompensationPolicy::ForwardOnly => {
                if !self.completed.is_empty() {
                    tracing::warn!(
                        steps = self.completed.len(),
                        "leaving partially provisioned entities in place"
                    );
                }
            }
            CompensationPolicy::CompensateOnFailure => {
                for compensation in self.completed.into_iter().rev() {
                    if let Err(err) = compensation.run(processor).await {
                        tracing::warn!(
                            compensation = ?compensation,
                            error = %err,
                            "compensating action failed"
                        );
                    }
                }
            }
        }
    }
}
