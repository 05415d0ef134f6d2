use sqlx::{Postgres, Transaction};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::types::NotificationKind;
use crate::repositories::notifications::{self, CreateNotification};

/// Creates the grading-complete notice inside the caller's transaction, so a
/// failed insert aborts the correction it belongs to.
pub(crate) async fn notify_grade_available(
    tx: &mut Transaction<'_, Postgres>,
    student_id: &str,
    exam_id: &str,
    exam_title: &str,
    score: f64,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    notifications::create(
        tx,
        CreateNotification {
            id: &Uuid::new_v4().to_string(),
            user_id: student_id,
            title: "Grade available",
            message: &format!("Your exam \"{exam_title}\" has been graded. Score: {score}%"),
            kind: NotificationKind::GradeAvailable,
            reference_id: Some(exam_id),
            created_at: now,
        },
    )
    .await
}
