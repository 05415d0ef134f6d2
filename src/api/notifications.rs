use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::notification::NotificationResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_notifications))
}

async fn list_notifications(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let notifications = repositories::notifications::list_for_user(state.db(), &user.id, 100)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch notifications"))?;

    Ok(Json(notifications.into_iter().map(NotificationResponse::from).collect()))
}
