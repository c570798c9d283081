//! Donation Request Validation
//!
//! Parses and normalizes the inbound donation payload before any remote
//! call is made. Validation is pure: a payload either becomes a
//! [`DonationRequest`] or fails with a field-specific [`ValidationError`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// RFC-light email shape: non-space local part, "@", non-space domain, ".", non-space TLD.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"));

/// Payment method references issued by the processor are `pm_`-prefixed.
const PAYMENT_METHOD_PREFIX: &str = "pm_";

/// Minimum display-name length after trimming.
const MIN_NAME_CHARS: usize = 2;

/// Validation errors, one per rejected field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Body was not parsable JSON
    #[error("Invalid JSON body")]
    MalformedInput,

    /// Amount missing, non-positive, or rounding to zero
    #[error("Invalid amount")]
    InvalidAmount,

    /// Payment method reference missing or not processor-shaped
    #[error("Payment method ID required")]
    InvalidPaymentMethod,

    /// Email missing or malformed
    #[error("Invalid email address")]
    InvalidEmail,

    /// Display name missing or shorter than 2 characters
    #[error("Name must be at least 2 characters")]
    InvalidName,
}

/// Configured fallbacks applied during normalization
#[derive(Clone, Debug)]
pub struct RequestDefaults {
    /// Lower-case 3-letter currency code used when the payload omits one
    pub currency: String,

    /// ISO country code used when an address omits one
    pub country: String,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            currency: "eur".into(),
            country: "IE".into(),
        }
    }
}

/// Raw inbound payload, exactly as the client sends it
#[derive(Clone, Debug, Deserialize)]
pub struct DonationPayload {
    /// Donation amount in minor currency units; may be fractional
    pub amount: Option<f64>,

    /// 3-letter currency code
    pub currency: Option<String>,

    /// Free-text note naming the donor
    pub donation_by: Option<String>,

    /// Payer display name
    pub name: Option<String>,

    /// Payer email
    pub email: Option<String>,

    /// Optional contact phone
    pub phone: Option<String>,

    /// Optional postal address
    pub address: Option<AddressPayload>,

    /// Processor payment method reference
    #[serde(rename = "paymentMethodId")]
    pub payment_method_id: Option<String>,
}

/// Raw postal address sub-object
#[derive(Clone, Debug, Deserialize)]
pub struct AddressPayload {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: Option<String>,
}

/// Normalized postal address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostalAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// A validated, normalized donation request
#[derive(Clone, Debug, PartialEq)]
pub struct DonationRequest {
    /// Positive integer amount in minor currency units
    pub amount: i64,

    /// Lower-case currency code
    pub currency: String,

    /// Trimmed payer display name
    pub name: String,

    /// Trimmed, lower-case payer email
    pub email: String,

    /// Optional contact phone
    pub phone: Option<String>,

    /// Optional postal address with country filled in
    pub address: Option<PostalAddress>,

    /// Optional donation note
    pub note: Option<String>,

    /// `pm_`-prefixed payment method reference
    pub payment_method_id: String,
}

impl DonationRequest {
    /// Validate and normalize a raw payload.
    ///
    /// Checks run in field order (amount, payment method, email, name) and
    /// return on the first violation, before any remote call is issued.
    pub fn validate(
        payload: DonationPayload,
        defaults: &RequestDefaults,
    ) -> Result<Self, ValidationError> {
        let raw_amount = payload
            .amount
            .filter(|a| a.is_finite() && *a > 0.0)
            .ok_or(ValidationError::InvalidAmount)?;
        // Nearest integer minor unit; sub-half-unit donations round to zero
        // and are rejected.
        let amount = raw_amount.round() as i64;
        if amount <= 0 {
            return Err(ValidationError::InvalidAmount);
        }

        let payment_method_id = payload
            .payment_method_id
            .map(|s| s.trim().to_string())
            .filter(|s| s.starts_with(PAYMENT_METHOD_PREFIX))
            .ok_or(ValidationError::InvalidPaymentMethod)?;

        let email = payload
            .email
            .map(|s| s.trim().to_lowercase())
            .filter(|s| EMAIL_RE.is_match(s))
            .ok_or(ValidationError::InvalidEmail)?;

        let name = payload
            .name
            .map(|s| s.trim().to_string())
            .filter(|s| s.chars().count() >= MIN_NAME_CHARS)
            .ok_or(ValidationError::InvalidName)?;

        let currency = payload
            .currency
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| defaults.currency.clone());

        let phone = payload.phone.and_then(non_empty);
        let note = payload.donation_by.and_then(non_empty);

        let address = payload.address.map(|a| PostalAddress {
            line1: a.line1.trim().to_string(),
            line2: a.line2.and_then(non_empty),
            city: a.city.trim().to_string(),
            state: a.state.and_then(non_empty),
            postal_code: a.postal_code.trim().to_string(),
            country: a
                .country
                .and_then(non_empty)
                .unwrap_or_else(|| defaults.country.clone()),
        });

        Ok(Self {
            amount,
            currency,
            name,
            email,
            phone,
            address,
            note,
            payment_method_id,
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> DonationPayload {
        serde_json::from_value(serde_json::json!({
            "amount": 1000,
            "currency": "EUR",
            "name": "Ada Lovelace",
            "email": "Ada@Example.com",
            "paymentMethodId": "pm_card_visa",
        }))
        .unwrap()
    }

    fn defaults() -> RequestDefaults {
        RequestDefaults::default()
    }

    #[test]
    fn test_valid_payload_normalizes() {
        let request = DonationRequest::validate(payload(), &defaults()).unwrap();
        assert_eq!(request.amount, 1000);
        assert_eq!(request.currency, "eur");
        assert_eq!(request.email, "ada@example.com");
        assert_eq!(request.payment_method_id, "pm_card_visa");
    }

    #[test]
    fn test_missing_amount_rejected() {
        let mut p = payload();
        p.amount = None;
        assert_eq!(
            DonationRequest::validate(p, &defaults()),
            Err(ValidationError::InvalidAmount)
        );
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for bad in [0.0, -500.0] {
            let mut p = payload();
            p.amount = Some(bad);
            assert_eq!(
                DonationRequest::validate(p, &defaults()),
                Err(ValidationError::InvalidAmount)
            );
        }
    }

    #[test]
    fn test_amount_rounds_to_nearest_minor_unit() {
        let mut p = payload();
        p.amount = Some(10.4);
        let request = DonationRequest::validate(p, &defaults()).unwrap();
        assert_eq!(request.amount, 10);

        let mut p = payload();
        p.amount = Some(10.6);
        let request = DonationRequest::validate(p, &defaults()).unwrap();
        assert_eq!(request.amount, 11);
    }

    #[test]
    fn test_amount_rounding_to_zero_rejected() {
        let mut p = payload();
        p.amount = Some(0.4);
        assert_eq!(
            DonationRequest::validate(p, &defaults()),
            Err(ValidationError::InvalidAmount)
        );
    }

    #[test]
    fn test_payment_method_requires_prefix() {
        for bad in [None, Some(""), Some("   "), Some("tok_visa")] {
            let mut p = payload();
            p.payment_method_id = bad.map(String::from);
            assert_eq!(
                DonationRequest::validate(p, &defaults()),
                Err(ValidationError::InvalidPaymentMethod)
            );
        }
    }

    #[test]
    fn test_malformed_email_rejected() {
        for bad in ["not-an-email", "a@b", "a b@c.com", ""] {
            let mut p = payload();
            p.email = Some(bad.into());
            assert_eq!(
                DonationRequest::validate(p, &defaults()),
                Err(ValidationError::InvalidEmail)
            );
        }
    }

    #[test]
    fn test_short_name_rejected() {
        for bad in ["", "A", "  B  "] {
            let mut p = payload();
            p.name = Some(bad.into());
            assert_eq!(
                DonationRequest::validate(p, &defaults()),
                Err(ValidationError::InvalidName)
            );
        }
    }

    #[test]
    fn test_currency_defaults_when_absent() {
        let mut p = payload();
        p.currency = None;
        let request = DonationRequest::validate(p, &defaults()).unwrap();
        assert_eq!(request.currency, "eur");
    }

    #[test]
    fn test_address_country_defaults_when_absent() {
        let mut p = payload();
        p.address = Some(AddressPayload {
            line1: " 1 Main St ".into(),
            line2: None,
            city: "Dublin".into(),
            state: Some("  ".into()),
            postal_code: "D01".into(),
            country: None,
        });
        let request = DonationRequest::validate(p, &defaults()).unwrap();
        let address = request.address.unwrap();
        assert_eq!(address.line1, "1 Main St");
        assert_eq!(address.country, "IE");
        assert_eq!(address.state, None);
    }

    #[test]
    fn test_donation_note_trimmed() {
        let mut p = payload();
        p.donation_by = Some("  The Lovelace family  ".into());
        let request = DonationRequest::validate(p, &defaults()).unwrap();
        assert_eq!(request.note.as_deref(), Some("The Lovelace family"));
    }
}
