//! Payment Processor Interface
//!
//! Abstraction over the remote payment processor. The orchestrator only
//! ever talks to this trait; the live Stripe implementation and the mock
//! used in tests both live behind it. Processor failure modes are a closed
//! set of variants so callers match exhaustively instead of probing
//! processor-specific error shapes.

mod mock;
mod stripe;

pub use self::mock::{FailurePoint, MockProcessor};
pub use self::stripe::StripeProcessor;

use async_trait::async_trait;
use thiserror::Error;

use crate::request::PostalAddress;

/// Remote customer identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomerRef(String);

/// Remote product identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProductRef(String);

/// Remote price identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PriceRef(String);

macro_rules! remote_ref {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

remote_ref!(CustomerRef);
remote_ref!(ProductRef);
remote_ref!(PriceRef);

/// Identity and contact details for a new customer record
#[derive(Clone, Debug)]
pub struct CustomerProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<PostalAddress>,
}

/// Expanded payment confirmation attached to a fresh subscription's invoice
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// Processor-reported confirmation status (e.g. "succeeded", "requires_action")
    pub status: String,

    /// Opaque secret the client uses to complete authentication
    pub client_secret: Option<String>,
}

impl PaymentConfirmation {
    /// Whether the payment needs further interactive confirmation by the payer
    pub fn requires_action(&self) -> bool {
        self.status == "requires_action"
    }
}

/// Result of creating a subscription
#[derive(Clone, Debug)]
pub struct SubscriptionOutcome {
    /// Remote subscription identifier
    pub subscription_id: String,

    /// Processor-reported subscription status (e.g. "active", "incomplete")
    pub status: String,

    /// Expanded confirmation object, when the processor returned one
    pub confirmation: Option<PaymentConfirmation>,
}

/// Closed set of processor failure modes
#[derive(Error, Debug, Clone)]
pub enum ProcessorError {
    /// Payment needs further authentication; a partial subscription exists.
    /// Not a hard failure: callers surface the secret to the client.
    #[error("payment requires additional authentication")]
    RequiresAction {
        subscription_id: String,
        client_secret: Option<String>,
    },

    /// The card was declined; user-facing, not retriable server-side
    #[error("card declined: {message}")]
    CardDeclined { message: String },

    /// Any other remote failure
    #[error("processor request failed: {0}")]
    Other(String),
}

/// Payment processor operations the orchestrator depends on.
///
/// Create operations mutate remote state and are never retried; the
/// delete/deactivate operations are their compensating actions, invoked
/// only by the saga runner when compensation is enabled.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a customer record
    async fn create_customer(&self, profile: &CustomerProfile)
    -> Result<CustomerRef, ProcessorError>;

    /// Attach a payment method to a customer
    async fn attach_payment_method(
        &self,
        customer: &CustomerRef,
        payment_method_id: &str,
    ) -> Result<(), ProcessorError>;

    /// Set a customer's default payment method for invoices
    async fn set_default_payment_method(
        &self,
        customer: &CustomerRef,
        payment_method_id: &str,
    ) -> Result<(), ProcessorError>;

    /// Create a product
    async fn create_product(
        &self,
        name: &str,
        description: &str,
    ) -> Result<ProductRef, ProcessorError>;

    /// Create a recurring monthly price bound to a product
    async fn create_price(
        &self,
        product: &ProductRef,
        unit_amount: i64,
        currency: &str,
    ) -> Result<PriceRef, ProcessorError>;

    /// Create a subscription binding customer to price, expanding the
    /// invoice's payment confirmation object
    async fn create_subscription(
        &self,
        customer: &CustomerRef,
        price: &PriceRef,
    ) -> Result<SubscriptionOutcome, ProcessorError>;

    /// Compensating action: delete a customer
    async fn delete_customer(&self, customer: &CustomerRef) -> Result<(), ProcessorError>;

    /// Compensating action: delete a product
    async fn delete_product(&self, product: &ProductRef) -> Result<(), ProcessorError>;

    /// Compensating action: deactivate a price
    async fn deactivate_price(&self, price: &PriceRef) -> Result<(), ProcessorError>;

    /// Processor name, for logs and health reporting
    fn name(&self) -> &str;
}
