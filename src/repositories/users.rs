use sqlx::{PgPool, Postgres, Transaction};

use crate::db::models::User;
use crate::db::types::UserRole;

pub(crate) const COLUMNS: &str = "id, username, full_name, role, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_student(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND role = $2"))
        .bind(id)
        .bind(UserRole::Student)
        .fetch_optional(&mut **tx)
        .await
}
