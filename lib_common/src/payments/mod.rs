//! # Payments Module
//!
//! Minimal Stripe client: the backend only ever creates PaymentIntents and
//! hands the client secret to the frontend, so that is all this wraps. The
//! provider owns everything else about the payment lifecycle.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

const PAYMENT_INTENTS_URL: &str = "https://api.stripe.com/v1/payment_intents";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from the payment provider boundary. Unlike the geo adapters these
/// are hard errors: a failed intent creation must surface to the caller.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment provider request failed: {0}")]
    Http(String),
    #[error("Payment provider rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
}

/// The slice of Stripe's PaymentIntent object the frontend needs.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// # Stripe Client
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(), // Fallback to a default client if builder fails.
            secret_key,
        }
    }

    /// Creates a PaymentIntent for `amount_cents` (smallest currency unit)
    /// with automatic payment methods enabled.
    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let form = [
            ("amount", amount_cents.to_string()),
            ("currency", currency.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let response = self
            .client
            .post(PAYMENT_INTENTS_URL)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<PaymentIntent>()
                .await
                .map_err(|e| PaymentError::Http(e.to_string()))
        } else {
            // Stripe error bodies carry a message under error.message.
            let body: Value = response.json().await.unwrap_or_default();
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown provider error")
                .to_string();
            error!("Stripe rejected payment intent ({status}): {message}");
            Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
