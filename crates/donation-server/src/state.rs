//! Application State

use std::sync::Arc;

use donation_payments::{RequestDefaults, SubscriptionOrchestrator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The donation workflow runner
    pub orchestrator: Arc<SubscriptionOrchestrator>,

    /// Validation fallbacks (default currency and country)
    pub defaults: RequestDefaults,
}
