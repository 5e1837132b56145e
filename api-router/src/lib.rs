use api_state::ApiState;
use axum::{
    extract::FromRef,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use middleware_jwt_auth::jwt_auth;
use routes::{
    accounts::delete_users_account,
    courses::{create_course, create_course_embed, delete_course},
    generation::generate_title_description,
    liveness::{live, root},
    payments::{create_checkout_session, create_payment_intent, create_stripe_user, stripe_webhook},
    readiness::ready,
    speech::text_to_speech,
    status::course_status,
    videos::video_data,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api_state;
pub mod error;
pub mod extract;
pub mod middleware_jwt_auth;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Public endpoints: probes, polling, and the payment entry points that
    // run before a session exists (webhook requests are signed instead).
    let public = Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready))
        .route("/video_data/{video_id}", get(video_data))
        .route("/course_status", get(course_status))
        .route("/create_payment_intent", post(create_payment_intent))
        .route("/create_stripe_user", post(create_stripe_user))
        .route("/api/webhook/stripe", post(stripe_webhook));

    // Protected endpoints (require a bearer token)
    let protected = Router::new()
        .route("/create_course", post(create_course))
        .route("/create_course_embed", post(create_course_embed))
        .route("/delete_course", post(delete_course))
        .route(
            "/generate_title_description",
            post(generate_title_description),
        )
        .route("/text_to_speech", post(text_to_speech))
        .route("/create_checkout_session", post(create_checkout_session))
        .route("/delete_users_account", post(delete_users_account))
        .route_layer(from_fn_with_state(app_state.clone(), jwt_auth));

    public
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
