use std::collections::HashMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::AppError;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

type HmacSha256 = Hmac<Sha256>;

/// The token bundles offered for purchase. Prices are in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPackage {
    Starter,
    Pro,
    Expert,
}

impl TokenPackage {
    pub fn from_name(name: &str) -> Result<Self, AppError> {
        match name.to_ascii_lowercase().as_str() {
            "starter" => Ok(Self::Starter),
            "pro" => Ok(Self::Pro),
            "expert" => Ok(Self::Expert),
            other => Err(AppError::Validation(format!(
                "Unknown token package '{other}'"
            ))),
        }
    }

    pub fn amount_cents(&self) -> i64 {
        match self {
            TokenPackage::Starter => 499,
            TokenPackage::Pro => 999,
            TokenPackage::Expert => 1999,
        }
    }

    pub fn credits(&self) -> i64 {
        match self {
            TokenPackage::Starter => 5,
            TokenPackage::Pro => 12,
            TokenPackage::Expert => 30,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct StripeCustomer {
    pub id: String,
}

#[derive(Deserialize, Debug)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Deserialize, Debug)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Deserialize, Debug)]
pub struct WebhookEventData {
    pub object: WebhookSessionObject,
}

#[derive(Deserialize, Debug)]
pub struct WebhookSessionObject {
    pub customer: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(secret_key: String, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            secret_key,
            api_base: STRIPE_API_BASE.to_string(),
        })
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base;
        self
    }

    pub async fn create_customer(&self, email: &str) -> Result<StripeCustomer, AppError> {
        let customer = self
            .http
            .post(format!("{}/customers", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&[("email", email)])
            .send()
            .await?
            .error_for_status()
            .map_err(|err| AppError::Payment(format!("Stripe customer creation failed: {err}")))?
            .json()
            .await?;
        Ok(customer)
    }

    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AppError> {
        let intent = self
            .http
            .post(format!("{}/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount_cents.to_string()),
                ("currency", currency.to_ascii_lowercase()),
                ("automatic_payment_methods[enabled]", "true".to_string()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|err| AppError::Payment(format!("Stripe payment intent failed: {err}")))?
            .json()
            .await?;
        Ok(intent)
    }

    /// Hosted checkout session for a price. The price id is carried in the
    /// session metadata so the webhook can credit without a second API call.
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, AppError> {
        let session = self
            .http
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("mode", "payment"),
                ("customer", customer_id),
                ("line_items[0][price]", price_id),
                ("line_items[0][quantity]", "1"),
                ("success_url", success_url),
                ("cancel_url", cancel_url),
                ("metadata[price_id]", price_id),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|err| AppError::Payment(format!("Stripe checkout session failed: {err}")))?
            .json()
            .await?;
        Ok(session)
    }
}

/// Check a `Stripe-Signature` header against the raw request body.
///
/// The header carries a timestamp and one or more `v1` signatures; each is
/// HMAC-SHA256 over `"{timestamp}.{payload}"` keyed with the webhook secret.
pub fn verify_webhook_signature(
    payload: &str,
    signature_header: &str,
    webhook_secret: &str,
) -> Result<(), AppError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::Payment("Signature header missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(AppError::Payment("Signature header missing v1 signature".into()));
    }

    let signed_payload = format!("{timestamp}.{payload}");
    for signature in signatures {
        let Ok(expected) = hex::decode(signature) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
            .map_err(|_| AppError::Payment("Invalid webhook secret".into()))?;
        mac.update(signed_payload.as_bytes());
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::Payment("Webhook signature mismatch".into()))
}
