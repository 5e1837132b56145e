use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use common::{
    storage::types::app_user::AppUser,
    utils::{
        config::AppConfig,
        stripe::{verify_webhook_signature, TokenPackage, WebhookEvent},
    },
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{api_state::ApiState, error::ApiError, extract::ApiJson, middleware_jwt_auth::Claims};

#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    #[serde(alias = "tokenPackage")]
    pub token_package: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionRequest {
    #[serde(alias = "priceId")]
    pub price_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateStripeUserRequest {
    pub email: String,
}

/// Create a payment intent priced from a named token package.
pub async fn create_payment_intent(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<PaymentIntentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.currency.trim().is_empty() {
        return Err(ApiError::ValidationError("currency is required".to_string()));
    }
    let package = TokenPackage::from_name(&request.token_package)?;
    let intent = state
        .stripe
        .create_payment_intent(package.amount_cents(), &request.currency)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "clientSecret": intent.client_secret })),
    ))
}

/// Create a hosted checkout session for the authenticated user.
pub async fn create_checkout_session(
    State(state): State<ApiState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<CheckoutSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user: Option<AppUser> = state.db.get_item(&claims.sub).await?;
    let user = user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let customer_id = user.stripe_customer_id.ok_or_else(|| {
        ApiError::ValidationError("User has no payment customer record".to_string())
    })?;

    let success_url = format!(
        "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
        state.config.app_domain
    );
    let cancel_url = format!("{}/payment-cancelled", state.config.app_domain);

    let session = state
        .stripe
        .create_checkout_session(&customer_id, &request.price_id, &success_url, &cancel_url)
        .await?;

    Ok(Json(json!({ "url": session.url })))
}

/// Stripe webhook: on a completed checkout, credit the purchasing user with
/// the package matching the session's price id.
pub async fn stripe_webhook(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::PaymentError("Missing Stripe-Signature header".to_string()))?;

    verify_webhook_signature(&body, signature, &state.config.stripe_webhook_secret)?;

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|err| ApiError::PaymentError(format!("Malformed webhook payload: {err}")))?;

    if event.event_type != "checkout.session.completed" {
        return Ok(Json(json!({ "received": true })));
    }

    let session = event.data.object;
    let Some(customer_id) = session.customer else {
        warn!("completed checkout session without a customer, skipping");
        return Ok(Json(json!({ "received": true })));
    };

    let Some(package) = session
        .metadata
        .get("price_id")
        .and_then(|price_id| package_for_price(&state.config, price_id))
    else {
        warn!("completed checkout session with unknown price, skipping");
        return Ok(Json(json!({ "received": true })));
    };

    let user = AppUser::find_by_stripe_customer(&state.db, &customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user for checkout customer".to_string()))?;

    let updated = AppUser::add_credits(&state.db, &user.id, package.credits()).await?;
    info!(
        user_id = %updated.id,
        credits = updated.credits,
        added = package.credits(),
        "credits granted from completed checkout"
    );

    Ok(Json(json!({ "received": true })))
}

/// Provision a payment customer record and the application user carrying it.
pub async fn create_stripe_user(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<CreateStripeUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.email.trim().is_empty() {
        return Err(ApiError::ValidationError("email is required".to_string()));
    }

    if AppUser::find_by_email(&state.db, &request.email)
        .await?
        .is_some()
    {
        return Err(ApiError::ValidationError(
            "A user with this email already exists".to_string(),
        ));
    }

    let customer = state.stripe.create_customer(&request.email).await?;
    let user = AppUser::new(request.email, Some(customer.id.clone()));
    state.db.store_item(user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "customerId": customer.id })),
    ))
}

fn package_for_price(config: &AppConfig, price_id: &str) -> Option<TokenPackage> {
    if price_id == config.stripe_price_starter {
        Some(TokenPackage::Starter)
    } else if price_id == config.stripe_price_pro {
        Some(TokenPackage::Pro)
    } else if price_id == config.stripe_price_expert {
        Some(TokenPackage::Expert)
    } else {
        None
    }
}
