use axum::{extract::State, response::IntoResponse, Extension, Json};
use common::storage::types::{app_user::AppUser, course::Course};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError, extract::ApiJson, middleware_jwt_auth::Claims};

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(alias = "userId")]
    pub user_id: String,
}

/// Delete a user and every course they own. Callers may only delete their
/// own account.
pub async fn delete_users_account(
    State(state): State<ApiState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<DeleteAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.user_id != claims.sub {
        return Err(ApiError::Unauthorized(
            "You may only delete your own account".to_string(),
        ));
    }

    let user: Option<AppUser> = state.db.get_item(&request.user_id).await?;
    let user = user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let course_ids = Course::ids_for_owner(&state.db, &user.id).await?;
    for course_id in &course_ids {
        Course::delete_cascade(&state.db, course_id).await?;
    }

    state.db.delete_item::<AppUser>(&user.id).await?;
    info!(user_id = %user.id, courses = course_ids.len(), "account deleted");

    Ok(Json(json!({ "status": "ok" })))
}
