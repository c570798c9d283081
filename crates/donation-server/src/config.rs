//! Environment Configuration

use donation_payments::{CompensationPolicy, RequestDefaults};

/// Gateway configuration, read once at startup
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Address the server binds to
    pub bind_addr: String,

    /// Origin allowed by the CORS layer
    pub allowed_origin: String,

    /// Currency/country fallbacks applied during validation
    pub defaults: RequestDefaults,

    /// What to do with completed provisioning steps on failure
    pub compensation: CompensationPolicy,
}

impl GatewayConfig {
    /// Load from environment variables, falling back to development defaults
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            allowed_origin: std::env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:8888".into()),
            defaults: RequestDefaults {
                currency: std::env::var("DONATION_CURRENCY")
                    .map(|c| c.trim().to_lowercase())
                    .unwrap_or_else(|_| RequestDefaults::default().currency),
                country: std::env::var("DONATION_COUNTRY")
                    .map(|c| c.trim().to_string())
                    .unwrap_or_else(|_| RequestDefaults::default().country),
            },
            compensation: std::env::var("COMPENSATION_POLICY")
                .map(|s| CompensationPolicy::from_str(&s))
                .unwrap_or_default(),
        }
    }
}
