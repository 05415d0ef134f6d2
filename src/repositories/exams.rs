use sqlx::{PgPool, Postgres, Transaction};

use crate::db::models::Exam;

pub(crate) const COLUMNS: &str =
    "id, title, description, created_by, start_time, end_time, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
}
