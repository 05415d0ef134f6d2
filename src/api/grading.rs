use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_role, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::format_primitive;
use crate::db::models::{Exam, User};
use crate::db::types::{AttemptStatus, UserRole};
use crate::repositories;
use crate::schemas::correction::CorrectionRequest;
use crate::services::correction;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:exam_id/attempts", get(list_attempts))
        .route("/:exam_id/attempts/:attempt_id/answers", get(attempt_answers))
        .route("/:exam_id/students/:student_id/corrections", post(record_corrections))
}

#[derive(Debug, Deserialize)]
struct ListAttemptsQuery {
    status: Option<AttemptStatus>,
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    50
}

async fn list_attempts(
    Path(exam_id): Path<String>,
    Query(query): Query<ListAttemptsQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let _exam = require_owned_exam(&state, &user, &exam_id).await?;

    let rows = repositories::attempts::list_by_exam(
        state.db(),
        &exam_id,
        query.status,
        query.skip,
        query.limit,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;

    let total = repositories::attempts::count_by_exam(state.db(), &exam_id, query.status)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;

    let items: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|row| {
            serde_json::json!({
                "id": row.id,
                "student_id": row.student_id,
                "student_name": row.student_name,
                "student_username": row.student_username,
                "status": row.status,
                "total_score": row.total_score,
                "final_score": row.final_score,
                "submitted_at": row.submitted_at.map(format_primitive),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "items": items, "total": total })))
}

async fn attempt_answers(
    Path((exam_id, attempt_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let _exam = require_owned_exam(&state, &user, &exam_id).await?;

    let attempt = repositories::attempts::find_by_id(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .filter(|attempt| attempt.exam_id == exam_id)
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    let answers = repositories::answers::list_for_review(state.db(), &attempt.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;

    let items: Vec<serde_json::Value> = answers
        .into_iter()
        .map(|row| {
            serde_json::json!({
                "id": row.id,
                "question_id": row.question_id,
                "question_prompt": row.question_prompt,
                "question_kind": row.question_kind,
                "question_points": row.question_points,
                "selected_option_id": row.selected_option_id,
                "answer_text": row.answer_text,
                "is_correct": row.is_correct,
                "points_earned": row.points_earned,
                "feedback": row.feedback,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "attempt_id": attempt.id,
        "student_id": attempt.student_id,
        "status": attempt.status,
        "answers": items,
    })))
}

async fn record_corrections(
    Path((exam_id, student_id)): Path<(String, String)>,
    CurrentUser(teacher): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CorrectionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(&teacher, UserRole::Teacher)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let outcome = correction::record_corrections(
        state.db(),
        &exam_id,
        &student_id,
        &teacher.id,
        &payload.scores,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "message": "Attempt graded",
        "final_score": outcome.final_score,
        "status": outcome.status,
    })))
}

async fn require_owned_exam(
    state: &AppState,
    user: &User,
    exam_id: &str,
) -> Result<Exam, ApiError> {
    require_role(user, UserRole::Teacher)?;

    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    if exam.created_by != user.id {
        return Err(ApiError::Forbidden("Exam belongs to another teacher"));
    }

    Ok(exam)
}
