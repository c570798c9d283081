//! HTTP Handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;

use donation_payments::{
    DonationError, DonationPayload, DonationRequest, SubscriptionReceipt, ValidationError,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub processor: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Successful donation response. `clientSecret` is serialized even when
/// null so clients can branch on it unconditionally.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationResponse {
    pub status: String,
    pub subscription_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub client_secret: Option<String>,
}

impl From<SubscriptionReceipt> for DonationResponse {
    fn from(receipt: SubscriptionReceipt) -> Self {
        Self {
            status: receipt.status,
            subscription_id: receipt.subscription_id,
            customer_id: receipt.customer_id,
            client_secret: receipt.client_secret,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        processor: state.orchestrator.processor_name().to_string(),
    })
}

/// Create a recurring donation subscription
pub async fn create_subscription(
    State(state): State<AppState>,
    payload: Result<Json<DonationPayload>, JsonRejection>,
) -> Result<Json<DonationResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected unparsable request body");
        error_response(&DonationError::Validation(ValidationError::MalformedInput))
    })?;

    let request = DonationRequest::validate(payload, &state.defaults)
        .map_err(|err| error_response(&DonationError::Validation(err)))?;

    let receipt = state.orchestrator.subscribe(&request).await.map_err(|err| {
        tracing::error!(error = %err, "donation subscription failed");
        error_response(&err)
    })?;

    Ok(Json(DonationResponse::from(receipt)))
}

/// Fallback for known routes hit with an unsupported method
pub async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "Method Not Allowed".into(),
        }),
    )
}

fn error_response(err: &DonationError) -> (StatusCode, Json<ErrorResponse>) {
    (
        status_for(err),
        Json(ErrorResponse {
            error: err.user_message(),
        }),
    )
}

fn status_for(err: &DonationError) -> StatusCode {
    match err {
        DonationError::Validation(_) => StatusCode::BAD_REQUEST,
        DonationError::CardDeclined { .. } => StatusCode::PAYMENT_REQUIRED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use donation_payments::{
        FailurePoint, MockProcessor, ProcessorError, RequestDefaults, SubscriptionOrchestrator,
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    const ORIGIN: &str = "https://donate.example.org";

    fn test_app(mock: Arc<MockProcessor>) -> Router {
        let state = AppState {
            orchestrator: Arc::new(SubscriptionOrchestrator::new(mock)),
            defaults: RequestDefaults::default(),
        };
        crate::app(state, ORIGIN).expect("router builds")
    }

    fn donation() -> Value {
        json!({
            "amount": 1500,
            "currency": "eur",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "paymentMethodId": "pm_card_visa",
        })
    }

    async fn post_json(app: Router, body: String) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/subscriptions")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_active_subscription_returns_200_with_null_secret() {
        let mock = Arc::new(MockProcessor::new());
        let (status, body) = post_json(test_app(mock), donation().to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");
        assert!(body["subscriptionId"].as_str().unwrap().starts_with("sub_"));
        assert!(body["clientSecret"].is_null());
    }

    #[tokio::test]
    async fn test_requires_action_returns_200_with_secret() {
        let mock = Arc::new(
            MockProcessor::new()
                .with_subscription_status("incomplete")
                .with_confirmation("requires_action", Some("pi_secret_42")),
        );
        let (status, body) = post_json(test_app(mock), donation().to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "requires_action");
        assert_eq!(body["clientSecret"], "pi_secret_42");
    }

    #[tokio::test]
    async fn test_invalid_amount_is_400_without_remote_calls() {
        let mock = Arc::new(MockProcessor::new());
        let mut payload = donation();
        payload["amount"] = json!(0);
        let (status, body) = post_json(test_app(mock.clone()), payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid amount");
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_payment_method_is_400_without_remote_calls() {
        let mock = Arc::new(MockProcessor::new());
        let mut payload = donation();
        payload.as_object_mut().unwrap().remove("paymentMethodId");
        let (status, body) = post_json(test_app(mock.clone()), payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Payment method ID required");
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_email_is_400() {
        let mock = Arc::new(MockProcessor::new());
        let mut payload = donation();
        payload["email"] = json!("not-an-email");
        let (status, _) = post_json(test_app(mock), payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_short_name_is_400() {
        let mock = Arc::new(MockProcessor::new());
        let mut payload = donation();
        payload["name"] = json!("A");
        let (status, _) = post_json(test_app(mock), payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unparsable_body_is_400() {
        let mock = Arc::new(MockProcessor::new());
        let (status, body) = post_json(test_app(mock.clone()), "{not json".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON body");
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_card_decline_is_402_with_decline_message() {
        let mock = Arc::new(MockProcessor::new().decline_card("Your card was declined."));
        let (status, body) = post_json(test_app(mock), donation().to_string()).await;

        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["error"], "Your card was declined.");
    }

    #[tokio::test]
    async fn test_customer_step_failure_is_500_and_generic() {
        let mock = Arc::new(MockProcessor::new().fail_at(
            FailurePoint::CreateCustomer,
            ProcessorError::Other("No such payment_method: pm_zzz".into()),
        ));
        let (status, body) = post_json(test_app(mock), donation().to_string()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let mock = Arc::new(MockProcessor::new());
        let response = test_app(mock)
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/subscriptions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_preflight_answers_without_touching_the_processor() {
        let mock = Arc::new(MockProcessor::new());
        let response = test_app(mock.clone())
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/subscriptions")
                    .header(header::ORIGIN, ORIGIN)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some(ORIGIN)
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cors_header_present_on_actual_response() {
        let mock = Arc::new(MockProcessor::new());
        let response = test_app(mock)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/subscriptions")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::ORIGIN, ORIGIN)
                    .body(Body::from(donation().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some(ORIGIN)
        );
    }
}
