//! Subscription Orchestrator
//!
//! Runs the donation workflow as a strictly sequential saga: provision a
//! customer with a default payment method, provision the catalog pair,
//! create the subscription, classify the outcome. Every remote call is
//! awaited before the next; nothing is retried.

use std::sync::Arc;

use crate::error::{DonationError, Result};
use crate::processor::{
    CustomerProfile, CustomerRef, PaymentProcessor, ProcessorError, SubscriptionOutcome,
};
use crate::request::DonationRequest;
use crate::saga::{Compensation, CompensationPolicy, Saga};

/// Fixed label for the per-request donation product
pub const PRODUCT_NAME: &str = "Monthly Donation";

/// Status reported when the payment needs client-side confirmation
pub const STATUS_REQUIRES_ACTION: &str = "requires_action";

const FALLBACK_DESCRIPTION: &str = "Recurring monthly donation";

/// Terminal state of a successful (or successful-but-incomplete) workflow
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionReceipt {
    /// Subscription status, or `"requires_action"` when confirmation is pending
    pub status: String,

    /// Remote subscription identifier
    pub subscription_id: String,

    /// Remote customer identifier, when known
    pub customer_id: Option<String>,

    /// Secret for completing authentication; present exactly when
    /// `status == "requires_action"`
    pub client_secret: Option<String>,
}

/// The donation workflow runner
pub struct SubscriptionOrchestrator {
    processor: Arc<dyn PaymentProcessor>,
    policy: CompensationPolicy,
}

impl SubscriptionOrchestrator {
    /// Orchestrator with the default forward-only failure policy
    pub fn new(processor: Arc<dyn PaymentProcessor>) -> Self {
        Self::with_policy(processor, CompensationPolicy::default())
    }

    /// Orchestrator with an explicit compensation policy
    pub fn with_policy(processor: Arc<dyn PaymentProcessor>, policy: CompensationPolicy) -> Self {
        Self { processor, policy }
    }

    /// Name of the backing processor, for health reporting
    pub fn processor_name(&self) -> &str {
        self.processor.name()
    }

    /// Run the workflow for one validated request.
    ///
    /// Steps execute in order: create customer, attach payment method, set
    /// it as the invoice default, create product, create price, create
    /// subscription. A subscription is never attempted without all prior
    /// steps having completed.
    pub async fn subscribe(&self, request: &DonationRequest) -> Result<SubscriptionReceipt> {
        let mut saga = Saga::new(self.policy);

        let profile = CustomerProfile {
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            address: request.address.clone(),
        };

        let customer = match self.processor.create_customer(&profile).await {
            Ok(customer) => {
                saga.record(Compensation::DeleteCustomer(customer.clone()));
                customer
            }
            Err(err) => return Err(self.abort(saga, "create_customer", err).await),
        };

        if let Err(err) = self
            .processor
            .attach_payment_method(&customer, &request.payment_method_id)
            .await
        {
            return Err(self.abort(saga, "attach_payment_method", err).await);
        }

        if let Err(err) = self
            .processor
            .set_default_payment_method(&customer, &request.payment_method_id)
            .await
        {
            return Err(self.abort(saga, "set_default_payment_method", err).await);
        }

        let description = request
            .note
            .as_ref()
            .map_or_else(|| FALLBACK_DESCRIPTION.to_string(), |by| format!("Donation by {by}"));

        let product = match self.processor.create_product(PRODUCT_NAME, &description).await {
            Ok(product) => {
                saga.record(Compensation::DeleteProduct(product.clone()));
                product
            }
            Err(err) => return Err(self.abort(saga, "create_product", err).await),
        };

        let price = match self
            .processor
            .create_price(&product, request.amount, &request.currency)
            .await
        {
            Ok(price) => {
                saga.record(Compensation::DeactivatePrice(price.clone()));
                price
            }
            Err(err) => return Err(self.abort(saga, "create_price", err).await),
        };

        match self.processor.create_subscription(&customer, &price).await {
            Ok(outcome) => classify(&customer, outcome),
            Err(ProcessorError::RequiresAction {
                subscription_id,
                client_secret,
            }) => {
                // A partial subscription exists and the payer must confirm;
                // this is a success variant, so completed steps stay.
                let client_secret = client_secret.ok_or(DonationError::MissingClientSecret)?;
                tracing::info!(
                    subscription_id = %subscription_id,
                    "subscription awaiting payer authentication"
                );
                Ok(SubscriptionReceipt {
                    status: STATUS_REQUIRES_ACTION.into(),
                    subscription_id,
                    customer_id: Some(customer.to_string()),
                    client_secret: Some(client_secret),
                })
            }
            Err(ProcessorError::CardDeclined { message }) => {
                saga.unwind(self.processor.as_ref()).await;
                Err(DonationError::CardDeclined { message })
            }
            Err(err) => Err(self.abort(saga, "create_subscription", err).await),
        }
    }

    async fn abort(&self, saga: Saga, step: &str, err: ProcessorError) -> DonationError {
        tracing::error!(
            step,
            processor = self.processor.name(),
            error = %err,
            "provisioning step failed"
        );
        saga.unwind(self.processor.as_ref()).await;
        DonationError::Processor(err)
    }
}

/// Map a created subscription to a receipt, recovering the requires-action
/// state from the expanded confirmation object
fn classify(customer: &CustomerRef, outcome: SubscriptionOutcome) -> Result<SubscriptionReceipt> {
    match outcome.confirmation {
        Some(confirmation) if confirmation.requires_action() => {
            let client_secret = confirmation
                .client_secret
                .ok_or(DonationError::MissingClientSecret)?;
            Ok(SubscriptionReceipt {
                status: STATUS_REQUIRES_ACTION.into(),
                subscription_id: outcome.subscription_id,
                customer_id: Some(customer.to_string()),
                client_secret: Some(client_secret),
            })
        }
        _ => Ok(SubscriptionReceipt {
            status: outcome.status,
            subscription_id: outcome.subscription_id,
            customer_id: Some(customer.to_string()),
            client_secret: None,
        }),
    }
}
