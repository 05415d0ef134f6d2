use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::ExamAttempt;
use crate::db::types::AttemptStatus;

/// One raw answer from the exam-taking form, tagged by question type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum AnswerValue {
    /// Selected option for an mcq question.
    Choice { option_id: String },
    /// Free text for an open/essay/short-answer question.
    Text { text: String },
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitAttemptRequest {
    #[serde(default)]
    pub(crate) answers: HashMap<String, AnswerValue>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) status: AttemptStatus,
    pub(crate) total_score: Option<f64>,
    pub(crate) final_score: Option<f64>,
    pub(crate) graded_by: Option<String>,
    pub(crate) started_at: String,
    pub(crate) submitted_at: Option<String>,
    pub(crate) graded_at: Option<String>,
}

impl From<ExamAttempt> for AttemptResponse {
    fn from(attempt: ExamAttempt) -> Self {
        Self {
            id: attempt.id,
            exam_id: attempt.exam_id,
            student_id: attempt.student_id,
            status: attempt.status,
            total_score: attempt.total_score,
            final_score: attempt.final_score,
            graded_by: attempt.graded_by,
            started_at: format_primitive(attempt.started_at),
            submitted_at: attempt.submitted_at.map(format_primitive),
            graded_at: attempt.graded_at.map(format_primitive),
        }
    }
}
