use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::StudentAnswer;
use crate::db::types::QuestionKind;

pub(crate) const COLUMNS: &str = "\
    id, attempt_id, question_id, selected_option_id, answer_text, is_correct, \
    points_earned, feedback, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AnswerReviewRow {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) question_prompt: String,
    pub(crate) question_kind: QuestionKind,
    pub(crate) question_points: f64,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points_earned: f64,
    pub(crate) feedback: Option<String>,
}

pub(crate) async fn delete_by_attempt(
    tx: &mut Transaction<'_, Postgres>,
    attempt_id: &str,
) -> Result<u64, sqlx::Error> {
    let deleted = sqlx::query("DELETE FROM student_answers WHERE attempt_id = $1")
        .bind(attempt_id)
        .execute(&mut **tx)
        .await?;
    Ok(deleted.rows_affected())
}

pub(crate) async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    answer: &StudentAnswer,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO student_answers (id, attempt_id, question_id, selected_option_id, \
         answer_text, is_correct, points_earned, feedback, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(&answer.id)
    .bind(&answer.attempt_id)
    .bind(&answer.question_id)
    .bind(&answer.selected_option_id)
    .bind(&answer.answer_text)
    .bind(answer.is_correct)
    .bind(answer.points_earned)
    .bind(&answer.feedback)
    .bind(answer.created_at)
    .bind(answer.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_attempt(
    tx: &mut Transaction<'_, Postgres>,
    attempt_id: &str,
) -> Result<Vec<StudentAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(&format!(
        "SELECT {COLUMNS} FROM student_answers WHERE attempt_id = $1"
    ))
    .bind(attempt_id)
    .fetch_all(&mut **tx)
    .await
}

pub(crate) async fn apply_correction(
    tx: &mut Transaction<'_, Postgres>,
    answer_id: &str,
    points_earned: f64,
    feedback: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE student_answers
         SET points_earned = $1, feedback = $2, updated_at = $3
         WHERE id = $4",
    )
    .bind(points_earned)
    .bind(feedback)
    .bind(now)
    .bind(answer_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn list_for_review(
    pool: &PgPool,
    attempt_id: &str,
) -> Result<Vec<AnswerReviewRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerReviewRow>(
        "SELECT a.id,
                a.question_id,
                q.prompt AS question_prompt,
                q.kind AS question_kind,
                q.points AS question_points,
                a.selected_option_id,
                a.answer_text,
                a.is_correct,
                a.points_earned,
                a.feedback
         FROM student_answers a
         JOIN questions q ON q.id = a.question_id
         WHERE a.attempt_id = $1
         ORDER BY q.position, q.id",
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await
}
