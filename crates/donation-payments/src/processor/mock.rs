//! Mock Payment Processor
//!
//! For tests and local development. Returns generated identifiers, records
//! every call, and can be scripted to fail at a chosen step with a chosen
//! error.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    CustomerProfile, CustomerRef, PaymentConfirmation, PaymentProcessor, PriceRef, ProcessorError,
    ProductRef, SubscriptionOutcome,
};

/// Step at which a scripted failure fires
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePoint {
    CreateCustomer,
    AttachPaymentMethod,
    SetDefaultPaymentMethod,
    CreateProduct,
    CreatePrice,
    CreateSubscription,
    DeleteCustomer,
    DeleteProduct,
    DeactivatePrice,
}

/// Scriptable in-memory processor
pub struct MockProcessor {
    subscription_status: String,
    confirmation: Option<PaymentConfirmation>,
    failure: Option<(FailurePoint, ProcessorError)>,
    calls: Mutex<Vec<String>>,
    created_prices: Mutex<Vec<(i64, String)>>,
}

impl Default for MockProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessor {
    /// A processor where every step succeeds and the subscription
    /// activates immediately
    pub fn new() -> Self {
        Self {
            subscription_status: "active".into(),
            confirmation: None,
            failure: None,
            calls: Mutex::new(Vec::new()),
            created_prices: Mutex::new(Vec::new()),
        }
    }

    /// Script the status the created subscription reports
    pub fn with_subscription_status(mut self, status: impl Into<String>) -> Self {
        self.subscription_status = status.into();
        self
    }

    /// Script the expanded confirmation object on the success path
    pub fn with_confirmation(
        mut self,
        status: impl Into<String>,
        client_secret: Option<&str>,
    ) -> Self {
        self.confirmation = Some(PaymentConfirmation {
            status: status.into(),
            client_secret: client_secret.map(String::from),
        });
        self
    }

    /// Script a failure at one step
    pub fn fail_at(mut self, point: FailurePoint, error: ProcessorError) -> Self {
        self.failure = Some((point, error));
        self
    }

    /// Script a card decline during subscription creation
    pub fn decline_card(self, message: impl Into<String>) -> Self {
        self.fail_at(
            FailurePoint::CreateSubscription,
            ProcessorError::CardDeclined {
                message: message.into(),
            },
        )
    }

    /// Script a requires-action error carrying a partial subscription
    pub fn require_action(self, subscription_id: &str, client_secret: Option<&str>) -> Self {
        self.fail_at(
            FailurePoint::CreateSubscription,
            ProcessorError::RequiresAction {
                subscription_id: subscription_id.into(),
                client_secret: client_secret.map(String::from),
            },
        )
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// `(unit_amount, currency)` pairs passed to price creation
    pub fn created_prices(&self) -> Vec<(i64, String)> {
        self.created_prices.lock().unwrap().clone()
    }

    fn log(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn check(&self, point: FailurePoint) -> Result<(), ProcessorError> {
        match &self.failure {
            Some((fail_point, err)) if *fail_point == point => Err(err.clone()),
            _ => Ok(()),
        }
    }

    fn generated_id(prefix: &str) -> String {
        format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
    }
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn create_customer(
        &self,
        _profile: &CustomerProfile,
    ) -> Result<CustomerRef, ProcessorError> {
        self.log("create_customer");
        self.check(FailurePoint::CreateCustomer)?;
        Ok(CustomerRef::new(Self::generated_id("cus")))
    }

    async fn attach_payment_method(
        &self,
        _customer: &CustomerRef,
        _payment_method_id: &str,
    ) -> Result<(), ProcessorError> {
        self.log("attach_payment_method");
        self.check(FailurePoint::AttachPaymentMethod)
    }

    async fn set_default_payment_method(
        &self,
        _customer: &CustomerRef,
        _payment_method_id: &str,
    ) -> Result<(), ProcessorError> {
        self.log("set_default_payment_method");
        self.check(FailurePoint::SetDefaultPaymentMethod)
    }

    async fn create_product(
        &self,
        _name: &str,
        _description: &str,
    ) -> Result<ProductRef, ProcessorError> {
        self.log("create_product");
        self.check(FailurePoint::CreateProduct)?;
        Ok(ProductRef::new(Self::generated_id("prod")))
    }

    async fn create_price(
        &self,
        _product: &ProductRef,
        unit_amount: i64,
        currency: &str,
    ) -> Result<PriceRef, ProcessorError> {
        self.log("create_price");
        self.check(FailurePoint::CreatePrice)?;
        self.created_prices
            .lock()
            .unwrap()
            .push((unit_amount, currency.to_string()));
        Ok(PriceRef::new(Self::generated_id("price")))
    }

    async fn create_subscription(
        &self,
        _customer: &CustomerRef,
        _price: &PriceRef,
    ) -> Result<SubscriptionOutcome, ProcessorError> {
        self.log("create_subscription");
        self.check(FailurePoint::CreateSubscription)?;
        Ok(SubscriptionOutcome {
            subscription_id: Self::generated_id("sub"),
            status: self.subscription_status.clone(),
            confirmation: self.confirmation.clone(),
        })
    }

    async fn delete_customer(&self, _customer: &CustomerRef) -> Result<(), ProcessorError> {
        self.log("delete_customer");
        self.check(FailurePoint::DeleteCustomer)
    }

    async fn delete_product(&self, _product: &ProductRef) -> Result<(), ProcessorError> {
        self.log("delete_product");
        self.check(FailurePoint::DeleteProduct)
    }

    async fn deactivate_price(&self, _price: &PriceRef) -> Result<(), ProcessorError> {
        self.log("deactivate_price");
        self.check(FailurePoint::DeactivatePrice)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
