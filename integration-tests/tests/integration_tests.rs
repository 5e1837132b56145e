use std::sync::Arc;

use api_router::{api_routes_v1, api_state::ApiState};
use axum_test::TestServer;
use common::storage::{
    db::SurrealDbClient,
    types::{
        app_user::AppUser,
        course::Course,
        course_job::CourseJob,
        course_video::CourseVideo,
        quiz::Quiz,
        summary::Summary,
    },
};
use ingestion_pipeline::CoursePipeline;
use serde_json::{json, Value};

use test_utils::*;

async fn make_server() -> (TestServer, Arc<SurrealDbClient>) {
    let (state, db) = setup_state().await;
    let app = api_routes_v1(&state).with_state(state);
    let server = TestServer::new(app).expect("test server starts");
    (server, db)
}

fn course_request(youtube_ids: &[&str]) -> Value {
    json!({
        "title": "Rust from scratch",
        "description": "Ownership and beyond",
        "youtube_ids": youtube_ids,
        "difficulty": 2,
        "question_count": 5,
        "summary_detail": 3,
        "is_public": true,
    })
}

#[tokio::test]
async fn liveness_returns_ok() {
    let (server, _db) = make_server().await;

    let response = server.get("/live").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn readiness_reports_db_check() {
    let (server, _db) = make_server().await;

    let response = server.get("/ready").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["checks"]["db"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let (server, _db) = make_server().await;

    let response = server
        .post("/create_course")
        .json(&course_request(&["vid1"]))
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn create_course_processes_videos_synchronously() {
    let (server, db) = make_server().await;
    let user = create_test_user(&db).await;
    let token = auth_token(&user);

    let response = server
        .post("/create_course")
        .authorization_bearer(&token)
        .json(&course_request(&["vidA", "vidB"]))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body = response.json::<Value>();
    let course_id = body["courseId"].as_str().expect("courseId returned");
    assert_eq!(body["failed"].as_array().expect("failed list").len(), 0);

    let linked = CourseVideo::video_ids_for_course(&db, course_id)
        .await
        .expect("links fetched");
    assert_eq!(linked, vec!["vidA".to_string(), "vidB".to_string()]);

    for video_id in &linked {
        assert!(Summary::find_by_video(&db, video_id)
            .await
            .expect("summary query")
            .is_some());
        assert!(Quiz::find_by_video(&db, video_id)
            .await
            .expect("quiz query")
            .is_some());
    }
}

#[tokio::test]
async fn create_course_embed_spends_a_credit_and_enqueues_jobs() {
    let (server, db) = make_server().await;
    let user = create_test_user(&db).await;
    let token = auth_token(&user);

    let response = server
        .post("/create_course_embed")
        .authorization_bearer(&token)
        .json(&course_request(&["vidQ"]))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let refreshed: Option<AppUser> = db.get_item(&user.id).await.expect("user fetched");
    assert_eq!(refreshed.expect("user present").credits, user.credits - 1);

    let job = CourseJob::claim_next_ready(&db, "integration-worker")
        .await
        .expect("claim succeeds")
        .expect("job enqueued");
    assert_eq!(job.video_id, "vidQ");
}

#[tokio::test]
async fn create_course_embed_rejects_when_credits_run_out() {
    let (server, db) = make_server().await;
    let user = create_test_user(&db).await;
    let token = auth_token(&user);

    // Signup grants two credits; the third request must be refused.
    for _ in 0..2 {
        server
            .post("/create_course_embed")
            .authorization_bearer(&token)
            .json(&course_request(&["vidR"]))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    let response = server
        .post("/create_course_embed")
        .authorization_bearer(&token)
        .json(&course_request(&["vidR"]))
        .await;
    response.assert_status_unauthorized();

    let refreshed: Option<AppUser> = db.get_item(&user.id).await.expect("user fetched");
    assert_eq!(refreshed.expect("user present").credits, 0);
}

#[tokio::test]
async fn course_status_follows_job_then_summary_precedence() {
    let (server, db) = make_server().await;
    let user = create_test_user(&db).await;
    let token = auth_token(&user);

    // A course nobody linked videos to reports failed.
    let response = server
        .get("/course_status")
        .add_query_param("courseId", "missing-course")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "failed");

    let created = server
        .post("/create_course_embed")
        .authorization_bearer(&token)
        .json(&course_request(&["vidS"]))
        .await
        .json::<Value>();
    let course_id = created["courseId"].as_str().expect("courseId").to_string();

    let response = server
        .get("/course_status")
        .add_query_param("courseId", &course_id)
        .await;
    assert_eq!(response.json::<Value>()["status"], "pending");

    // Drain the queue the way the worker loop would.
    let pipeline = CoursePipeline::with_services(Arc::clone(&db), Arc::new(StubServices));
    while let Some(job) = CourseJob::claim_next_ready(&db, "integration-worker")
        .await
        .expect("claim succeeds")
    {
        pipeline.process_job(job).await.expect("job processes");
    }

    let response = server
        .get("/course_status")
        .add_query_param("courseId", &course_id)
        .await;
    assert_eq!(response.json::<Value>()["status"], "completed");
}

#[tokio::test]
async fn course_status_requires_the_course_id_param() {
    let (server, _db) = make_server().await;

    let response = server.get("/course_status").await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn webhook_rejects_a_tampered_signature() {
    let (server, _db) = make_server().await;

    let payload = json!({
        "type": "checkout.session.completed",
        "data": { "object": { "customer": "cus_x", "metadata": {} } }
    })
    .to_string();

    let response = server
        .post("/api/webhook/stripe")
        .add_header("Stripe-Signature", "t=1700000000,v1=deadbeef")
        .text(payload)
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn webhook_credits_the_purchasing_user() {
    let (server, db) = make_server().await;
    let user = create_test_user(&db).await;
    let customer_id = user.stripe_customer_id.clone().expect("customer id");

    let payload = json!({
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "customer": customer_id,
                "metadata": { "price_id": "price_pro_test" }
            }
        }
    })
    .to_string();
    let signature = sign_webhook_payload(&payload);

    let response = server
        .post("/api/webhook/stripe")
        .add_header("Stripe-Signature", signature)
        .text(payload)
        .await;
    response.assert_status_ok();

    let refreshed: Option<AppUser> = db.get_item(&user.id).await.expect("user fetched");
    assert_eq!(
        refreshed.expect("user present").credits,
        user.credits + 12,
        "pro package grants 12 credits"
    );
}

#[tokio::test]
async fn delete_course_requires_ownership() {
    let (server, db) = make_server().await;
    let owner = create_test_user(&db).await;
    let stranger = create_test_user(&db).await;

    let created = server
        .post("/create_course")
        .authorization_bearer(&auth_token(&owner))
        .json(&course_request(&["vidD"]))
        .await
        .json::<Value>();
    let course_id = created["courseId"].as_str().expect("courseId").to_string();

    let response = server
        .post("/delete_course")
        .authorization_bearer(&auth_token(&stranger))
        .json(&json!({ "course_id": course_id }))
        .await;
    response.assert_status_unauthorized();

    let response = server
        .post("/delete_course")
        .authorization_bearer(&auth_token(&owner))
        .json(&json!({ "course_id": course_id }))
        .await;
    response.assert_status_ok();

    let course: Option<Course> = db.get_item(&course_id).await.expect("course query");
    assert!(course.is_none());
    let linked = CourseVideo::video_ids_for_course(&db, &course_id)
        .await
        .expect("links fetched");
    assert!(linked.is_empty());
}

#[tokio::test]
async fn account_deletion_is_restricted_to_the_caller() {
    let (server, db) = make_server().await;
    let user = create_test_user(&db).await;
    let other = create_test_user(&db).await;
    let token = auth_token(&user);

    let response = server
        .post("/delete_users_account")
        .authorization_bearer(&token)
        .json(&json!({ "user_id": other.id }))
        .await;
    response.assert_status_unauthorized();

    // Give the user something to cascade.
    server
        .post("/create_course")
        .authorization_bearer(&token)
        .json(&course_request(&["vidE"]))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post("/delete_users_account")
        .authorization_bearer(&token)
        .json(&json!({ "user_id": user.id }))
        .await;
    response.assert_status_ok();

    let gone: Option<AppUser> = db.get_item(&user.id).await.expect("user query");
    assert!(gone.is_none());
    let courses = Course::ids_for_owner(&db, &user.id).await.expect("courses");
    assert!(courses.is_empty());
}

#[tokio::test]
async fn title_description_rejects_an_empty_video_list() {
    let (server, db) = make_server().await;
    let user = create_test_user(&db).await;

    let response = server
        .post("/generate_title_description")
        .authorization_bearer(&auth_token(&user))
        .json(&json!({ "videoInfo": [] }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn payment_intent_rejects_an_unknown_package() {
    let (server, _db) = make_server().await;

    let response = server
        .post("/create_payment_intent")
        .json(&json!({ "tokenPackage": "diamond", "currency": "usd" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn payment_intent_requires_a_currency() {
    let (server, _db) = make_server().await;

    // Missing field is a 400, not axum's default body rejection
    let response = server
        .post("/create_payment_intent")
        .json(&json!({ "tokenPackage": "starter" }))
        .await;
    response.assert_status_bad_request();

    let response = server
        .post("/create_payment_intent")
        .json(&json!({ "tokenPackage": "starter", "currency": "  " }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn incomplete_json_bodies_are_rejected_with_400() {
    let (server, db) = make_server().await;
    let user = create_test_user(&db).await;
    let token = auth_token(&user);

    let response = server
        .post("/create_course")
        .authorization_bearer(&token)
        .json(&json!({ "title": "Missing the rest" }))
        .await;
    response.assert_status_bad_request();

    let response = server
        .post("/delete_course")
        .authorization_bearer(&token)
        .json(&json!({}))
        .await;
    response.assert_status_bad_request();
}
