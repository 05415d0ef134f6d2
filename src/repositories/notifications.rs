use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::Notification;
use crate::db::types::NotificationKind;

pub(crate) const COLUMNS: &str =
    "id, user_id, title, message, kind, reference_id, is_read, created_at";

pub(crate) struct CreateNotification<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) message: &'a str,
    pub(crate) kind: NotificationKind,
    pub(crate) reference_id: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    tx: &mut Transaction<'_, Postgres>,
    params: CreateNotification<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notifications (id, user_id, title, message, kind, reference_id, is_read, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)",
    )
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.title)
    .bind(params.message)
    .bind(params.kind)
    .bind(params.reference_id)
    .bind(params.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS}
         FROM notifications
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit.clamp(1, 500))
    .fetch_all(pool)
    .await
}
