use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_role, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::attempt::{format_primitive, AttemptResponse, SubmitAttemptRequest};
use crate::services::submission::{self, SubmissionContext};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:exam_id/attempts", post(start_attempt))
        .route("/:exam_id/attempts/current", get(current_attempt))
        .route("/:exam_id/attempts/current/submit", post(submit_attempt))
        .route("/:exam_id/result", get(exam_result))
}

/// Opens the student's sitting of the exam, reusing the active attempt when
/// one already exists.
async fn start_attempt(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptResponse>, ApiError> {
    require_role(&user, UserRole::Student)?;

    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let now = primitive_now_utc();
    if now < exam.start_time || now > exam.end_time {
        return Err(ApiError::BadRequest("Exam is not open".to_string()));
    }

    let existing =
        repositories::attempts::find_active_for_exam_and_student(state.db(), &exam_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?;

    if let Some(attempt) = existing {
        return Ok(Json(attempt.into()));
    }

    let attempt = repositories::attempts::create(
        state.db(),
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam_id,
            student_id: &user.id,
            started_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?;

    tracing::info!(
        exam_id = %exam_id,
        student_id = %user.id,
        attempt_id = %attempt.id,
        "Attempt started"
    );

    Ok(Json(attempt.into()))
}

async fn current_attempt(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptResponse>, ApiError> {
    require_role(&user, UserRole::Student)?;

    let attempt =
        repositories::attempts::find_latest_for_exam_and_student(state.db(), &exam_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
            .ok_or_else(|| ApiError::NotFound("No attempt for this exam".to_string()))?;

    Ok(Json(attempt.into()))
}

/// The student's own graded result, written by the correction pass.
async fn exam_result(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(&user, UserRole::Student)?;

    let result =
        repositories::results::find_for_exam_and_student(state.db(), &exam_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch result"))?
            .ok_or_else(|| ApiError::NotFound("No result for this exam yet".to_string()))?;

    Ok(Json(serde_json::json!({
        "exam_id": result.exam_id,
        "student_id": result.student_id,
        "score": result.score,
        "submitted_at": result.submitted_at.map(format_primitive),
        "graded_at": format_primitive(result.graded_at),
    })))
}

async fn submit_attempt(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(&user, UserRole::Student)?;

    // The attempt is resolved here, server-side; the request body only
    // carries answers. Resubmission targets the same sitting until it has
    // been graded.
    let attempt =
        repositories::attempts::find_latest_for_exam_and_student(state.db(), &exam_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
            .ok_or_else(|| ApiError::NotFound("No attempt for this exam".to_string()))?;

    let outcome = submission::submit_attempt(
        state.db(),
        SubmissionContext { exam_id: &exam_id, student_id: &user.id, attempt_id: &attempt.id },
        &payload.answers,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "attempt_id": attempt.id,
        "status": outcome.status,
        "total_score": outcome.total_score,
        "submitted_at": format_primitive(outcome.submitted_at),
    })))
}
