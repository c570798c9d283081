//! Live Stripe Processor
//!
//! Implements [`PaymentProcessor`] against the Stripe API. Each operation
//! maps one remote call; classification of Stripe's error shapes into the
//! closed [`ProcessorError`] set happens here, at the boundary, so the
//! orchestrator never sees a raw Stripe error.

use async_trait::async_trait;
use stripe::{
    Address, AttachPaymentMethod, Client, CreateCustomer, CreatePrice, CreatePriceRecurring,
    CreatePriceRecurringInterval, CreateProduct, CreateSubscription, CreateSubscriptionItems,
    CreateSubscriptionPaymentSettings, CreateSubscriptionPaymentSettingsPaymentMethodTypes,
    CreateSubscriptionPaymentSettingsSaveDefaultPaymentMethod, Currency, Customer,
    CustomerInvoiceSettings, ErrorCode, Expandable, IdOrCreate, PaymentMethod, Price, Product,
    StripeError, Subscription, UpdateCustomer, UpdatePrice,
};

use super::{
    CustomerProfile, CustomerRef, PaymentConfirmation, PaymentProcessor, PriceRef, ProcessorError,
    ProductRef, SubscriptionOutcome,
};
use crate::error::DonationError;

/// Stripe-backed payment processor
pub struct StripeProcessor {
    client: Client,
}

impl StripeProcessor {
    /// Create a processor from an API secret key
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, DonationError> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| DonationError::Config("STRIPE_SECRET_KEY not set".into()))?;

        Ok(Self::new(&secret_key))
    }

    fn customer_id(customer: &CustomerRef) -> Result<stripe::CustomerId, ProcessorError> {
        customer
            .as_str()
            .parse()
            .map_err(|_| ProcessorError::Other(format!("invalid customer id: {customer}")))
    }

    fn payment_method_id(id: &str) -> Result<stripe::PaymentMethodId, ProcessorError> {
        id.parse()
            .map_err(|_| ProcessorError::Other(format!("invalid payment method id: {id}")))
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_customer(
        &self,
        profile: &CustomerProfile,
    ) -> Result<CustomerRef, ProcessorError> {
        let mut params = CreateCustomer::new();
        params.name = Some(&profile.name);
        params.email = Some(&profile.email);
        if let Some(ref phone) = profile.phone {
            params.phone = Some(phone);
        }
        if let Some(ref address) = profile.address {
            // Absent optional sub-fields go over the wire as empty strings,
            // never null.
            params.address = Some(Address {
                line1: Some(address.line1.clone()),
                line2: Some(address.line2.clone().unwrap_or_default()),
                city: Some(address.city.clone()),
                state: Some(address.state.clone().unwrap_or_default()),
                postal_code: Some(address.postal_code.clone()),
                country: Some(address.country.clone()),
            });
        }

        let customer = Customer::create(&self.client, params)
            .await
            .map_err(classify)?;

        Ok(CustomerRef::new(customer.id.to_string()))
    }

    async fn attach_payment_method(
        &self,
        customer: &CustomerRef,
        payment_method_id: &str,
    ) -> Result<(), ProcessorError> {
        let pm_id = Self::payment_method_id(payment_method_id)?;
        let customer_id = Self::customer_id(customer)?;

        PaymentMethod::attach(
            &self.client,
            &pm_id,
            AttachPaymentMethod {
                customer: customer_id,
            },
        )
        .await
        .map_err(classify)?;

        Ok(())
    }

    async fn set_default_payment_method(
        &self,
        customer: &CustomerRef,
        payment_method_id: &str,
    ) -> Result<(), ProcessorError> {
        let customer_id = Self::customer_id(customer)?;
        let pm_id = Self::payment_method_id(payment_method_id)?;

        let mut params = UpdateCustomer::new();
        params.invoice_settings = Some(CustomerInvoiceSettings {
            default_payment_method: Some(pm_id.to_string()),
            ..Default::default()
        });

        Customer::update(&self.client, &customer_id, params)
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn create_product(
        &self,
        name: &str,
        description: &str,
    ) -> Result<ProductRef, ProcessorError> {
        let mut params = CreateProduct::new(name);
        params.description = Some(description);

        let product = Product::create(&self.client, params)
            .await
            .map_err(classify)?;

        Ok(ProductRef::new(product.id.to_string()))
    }

    async fn create_price(
        &self,
        product: &ProductRef,
        unit_amount: i64,
        currency: &str,
    ) -> Result<PriceRef, ProcessorError> {
        let currency = currency
            .parse::<Currency>()
            .map_err(|_| ProcessorError::Other(format!("unsupported currency: {currency}")))?;

        let mut params = CreatePrice::new(currency);
        params.product = Some(IdOrCreate::Id(product.as_str()));
        params.unit_amount = Some(unit_amount);
        params.recurring = Some(CreatePriceRecurring {
            interval: CreatePriceRecurringInterval::Month,
            aggregate_usage: None,
            interval_count: None,
            trial_period_days: None,
            usage_type: None,
        });

        let price = Price::create(&self.client, params).await.map_err(classify)?;

        Ok(PriceRef::new(price.id.to_string()))
    }

    async fn create_subscription(
        &self,
        customer: &CustomerRef,
        price: &PriceRef,
    ) -> Result<SubscriptionOutcome, ProcessorError> {
        let customer_id = Self::customer_id(customer)?;

        let mut params = CreateSubscription::new(customer_id);
        params.items = Some(vec![CreateSubscriptionItems {
            price: Some(price.as_str().to_string()),
            quantity: Some(1),
            ..Default::default()
        }]);
        params.payment_settings = Some(CreateSubscriptionPaymentSettings {
            payment_method_types: Some(vec![
                CreateSubscriptionPaymentSettingsPaymentMethodTypes::Card,
            ]),
            save_default_payment_method: Some(
                CreateSubscriptionPaymentSettingsSaveDefaultPaymentMethod::OnSubscription,
            ),
            ..Default::default()
        });
        params.expand = &["latest_invoice.payment_intent"];

        let subscription = Subscription::create(&self.client, params)
            .await
            .map_err(classify)?;

        Ok(outcome(subscription))
    }

    async fn delete_customer(&self, customer: &CustomerRef) -> Result<(), ProcessorError> {
        let customer_id = Self::customer_id(customer)?;
        Customer::delete(&self.client, &customer_id)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_product(&self, product: &ProductRef) -> Result<(), ProcessorError> {
        let product_id = product
            .as_str()
            .parse::<stripe::ProductId>()
            .map_err(|_| ProcessorError::Other(format!("invalid product id: {product}")))?;
        Product::delete(&self.client, &product_id)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn deactivate_price(&self, price: &PriceRef) -> Result<(), ProcessorError> {
        let price_id = price
            .as_str()
            .parse::<stripe::PriceId>()
            .map_err(|_| ProcessorError::Other(format!("invalid price id: {price}")))?;
        let mut params = UpdatePrice::new();
        params.active = Some(false);
        Price::update(&self.client, &price_id, params)
            .await
            .map_err(classify)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

/// Extract the expanded confirmation object from a fresh subscription
fn outcome(subscription: Subscription) -> SubscriptionOutcome {
    let confirmation = match subscription.latest_invoice {
        Some(Expandable::Object(invoice)) => match invoice.payment_intent {
            Some(Expandable::Object(intent)) => Some(PaymentConfirmation {
                status: intent.status.to_string(),
                client_secret: intent.client_secret,
            }),
            _ => None,
        },
        _ => None,
    };

    SubscriptionOutcome {
        subscription_id: subscription.id.to_string(),
        status: subscription.status.to_string(),
        confirmation,
    }
}

/// Map Stripe errors into the closed processor error set.
///
/// Card declines are the only request errors surfaced distinctly; everything
/// else collapses to [`ProcessorError::Other`]. Authentication-required
/// outcomes reach the caller through the expanded confirmation object on the
/// success path, so they are not recovered from the error side here.
fn classify(err: StripeError) -> ProcessorError {
    match err {
        StripeError::Stripe(request_error) => {
            if matches!(request_error.code, Some(ErrorCode::CardDeclined)) {
                ProcessorError::CardDeclined {
                    message: request_error
                        .message
                        .unwrap_or_else(|| "Your card was declined.".to_string()),
                }
            } else {
                ProcessorError::Other(
                    request_error
                        .message
                        .unwrap_or_else(|| format!("HTTP {}", request_error.http_status)),
                )
            }
        }
        other => ProcessorError::Other(other.to_string()),
    }
}
