use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::ExamResult;

pub(crate) const COLUMNS: &str =
    "id, exam_id, student_id, score, submitted_at, graded_at, created_at, updated_at";

pub(crate) struct UpsertResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) score: f64,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) graded_at: PrimitiveDateTime,
}

/// Insert the (student, exam) result or overwrite it on re-correction.
pub(crate) async fn upsert(
    tx: &mut Transaction<'_, Postgres>,
    params: UpsertResult<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_results (id, exam_id, student_id, score, submitted_at, graded_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $6, $6)
         ON CONFLICT (exam_id, student_id) DO UPDATE
         SET score = EXCLUDED.score,
             submitted_at = EXCLUDED.submitted_at,
             graded_at = EXCLUDED.graded_at,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.student_id)
    .bind(params.score)
    .bind(params.submitted_at)
    .bind(params.graded_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn find_for_exam_and_student(
    pool: &PgPool,
    exam_id: &str,
    student_id: &str,
) -> Result<Option<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {COLUMNS} FROM exam_results WHERE exam_id = $1 AND student_id = $2"
    ))
    .bind(exam_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}
