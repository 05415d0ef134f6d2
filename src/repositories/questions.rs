use sqlx::{Postgres, Transaction};

use crate::db::types::QuestionKind;

/// A question joined with the id of its option flagged correct, when any.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct QuestionWithKey {
    pub(crate) id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) points: f64,
    pub(crate) correct_option_id: Option<String>,
}

pub(crate) async fn list_with_answer_key(
    tx: &mut Transaction<'_, Postgres>,
    exam_id: &str,
) -> Result<Vec<QuestionWithKey>, sqlx::Error> {
    sqlx::query_as::<_, QuestionWithKey>(
        "SELECT q.id,
                q.kind,
                q.points,
                o.id AS correct_option_id
         FROM questions q
         LEFT JOIN question_options o ON o.question_id = q.id AND o.is_correct
         WHERE q.exam_id = $1
         ORDER BY q.position, q.id",
    )
    .bind(exam_id)
    .fetch_all(&mut **tx)
    .await
}
