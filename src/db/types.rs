use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Teacher,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questionkind", rename_all = "snake_case")]
pub(crate) enum QuestionKind {
    Mcq,
    Open,
    Essay,
    ShortAnswer,
}

impl QuestionKind {
    /// Open-type questions carry free text and are graded by a teacher.
    pub(crate) fn is_open(self) -> bool {
        matches!(self, QuestionKind::Open | QuestionKind::Essay | QuestionKind::ShortAnswer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "attemptstatus", rename_all = "snake_case")]
pub(crate) enum AttemptStatus {
    InProgress,
    Pending,
    Submitted,
    Graded,
}

impl AttemptStatus {
    /// Forward-only lifecycle: in_progress → {pending, submitted} → graded.
    pub(crate) fn can_become(self, next: AttemptStatus) -> bool {
        matches!(
            (self, next),
            (AttemptStatus::InProgress, AttemptStatus::Pending)
                | (AttemptStatus::InProgress, AttemptStatus::Submitted)
                | (AttemptStatus::Pending, AttemptStatus::Graded)
                | (AttemptStatus::Submitted, AttemptStatus::Graded)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notificationkind", rename_all = "snake_case")]
pub(crate) enum NotificationKind {
    GradeAvailable,
}
