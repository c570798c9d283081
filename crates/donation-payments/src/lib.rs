//! # donation-payments
//!
//! Orchestration of recurring monthly donation subscriptions against a
//! remote payment processor (Stripe).
//!
//! The workflow is a strictly sequential saga: each remote call depends on
//! the identifier produced by the previous one:
//!
//! ```text
//! validate ──▶ customer ──▶ attach pm ──▶ default pm ──▶ product ──▶ price ──▶ subscription
//!   (pure)        │                                                               │
//!                 └──────────── compensating actions recorded per step ───────────┘
//! ```
//!
//! Partial failure leaves remote state behind by design; the saga runner can
//! optionally unwind it when [`CompensationPolicy::CompensateOnFailure`] is
//! configured. Subscription-step outcomes that need payer authentication are
//! surfaced as a success variant carrying a client secret, never as a hard
//! failure.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use donation_payments::{
//!     DonationRequest, RequestDefaults, StripeProcessor, SubscriptionOrchestrator,
//! };
//!
//! let processor = Arc::new(StripeProcessor::from_env()?);
//! let orchestrator = SubscriptionOrchestrator::new(processor);
//!
//! let request = DonationRequest::validate(payload, &RequestDefaults::default())?;
//! let receipt = orchestrator.subscribe(&request).await?;
//! // receipt.client_secret is Some exactly when the payer must confirm.
//! ```

mod error;
mod orchestrator;
mod processor;
mod request;
mod saga;

pub use error::{DonationError, Result};
pub use orchestrator::{
    PRODUCT_NAME, STATUS_REQUIRES_ACTION, SubscriptionOrchestrator, SubscriptionReceipt,
};
pub use processor::{
    CustomerProfile, CustomerRef, FailurePoint, MockProcessor, PaymentConfirmation,
    PaymentProcessor, PriceRef, ProcessorError, ProductRef, StripeProcessor, SubscriptionOutcome,
};
pub use request::{
    AddressPayload, DonationPayload, DonationRequest, PostalAddress, RequestDefaults,
    ValidationError,
};
pub use saga::{Compensation, CompensationPolicy, Saga};
