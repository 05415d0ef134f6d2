use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::StudentAnswer;
use crate::db::types::{AttemptStatus, QuestionKind};
use crate::repositories::questions::QuestionWithKey;
use crate::repositories::{answers, attempts, questions};
use crate::schemas::attempt::AnswerValue;
use crate::services::{scoring, GradingError};

/// Request-scoped identifiers for one submission. The attempt id is resolved
/// by the handler from the student's active attempt, never from the request
/// body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SubmissionContext<'a> {
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) attempt_id: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SubmissionOutcome {
    pub(crate) status: AttemptStatus,
    pub(crate) total_score: f64,
    pub(crate) submitted_at: PrimitiveDateTime,
}

/// Finalizes an attempt from the student side: replaces the stored answers,
/// auto-grades the mcq items and records the provisional score. One
/// transaction; any failure leaves the attempt untouched.
pub(crate) async fn submit_attempt(
    pool: &PgPool,
    ctx: SubmissionContext<'_>,
    payload: &HashMap<String, AnswerValue>,
) -> Result<SubmissionOutcome, GradingError> {
    let mut tx = pool.begin().await?;

    let attempt = attempts::lock_by_id(&mut tx, ctx.attempt_id)
        .await?
        .ok_or(GradingError::Authorization("Attempt not found"))?;

    if attempt.student_id != ctx.student_id || attempt.exam_id != ctx.exam_id {
        return Err(GradingError::Authorization("Attempt belongs to another student"));
    }

    if attempt.status == AttemptStatus::Graded {
        return Err(GradingError::Validation("Attempt has already been graded".to_string()));
    }

    let question_set = questions::list_with_answer_key(&mut tx, ctx.exam_id).await?;
    if question_set.is_empty() {
        return Err(GradingError::Validation("Exam has no questions".to_string()));
    }

    let graded = grade_answers(&question_set, payload)?;

    // Resubmission fully replaces the previous answer set.
    answers::delete_by_attempt(&mut tx, &attempt.id).await?;

    let now = primitive_now_utc();
    let rows: Vec<StudentAnswer> = graded
        .into_iter()
        .map(|answer| StudentAnswer {
            id: Uuid::new_v4().to_string(),
            attempt_id: attempt.id.clone(),
            question_id: answer.question_id,
            selected_option_id: answer.selected_option_id,
            answer_text: answer.answer_text,
            is_correct: answer.is_correct,
            points_earned: answer.points_earned,
            feedback: None,
            created_at: now,
            updated_at: now,
        })
        .collect();

    for row in &rows {
        answers::insert(&mut tx, row).await?;
    }

    let summary = scoring::aggregate(&question_set, &rows);
    let status = status_for_provisional_score(summary.percentage);

    // A resubmission that lands in the same state replaces the answers in
    // place; everything else must be a forward transition.
    if status != attempt.status && !attempt.status.can_become(status) {
        return Err(GradingError::Validation(format!(
            "Attempt cannot move from {:?} to {:?}",
            attempt.status, status
        )));
    }

    attempts::mark_submitted(&mut tx, &attempt.id, status, summary.percentage, now).await?;

    tx.commit().await?;

    tracing::info!(
        exam_id = %ctx.exam_id,
        student_id = %ctx.student_id,
        attempt_id = %ctx.attempt_id,
        total_score = summary.percentage,
        status = ?status,
        "Attempt submitted"
    );

    Ok(SubmissionOutcome { status, total_score: summary.percentage, submitted_at: now })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradedAnswer {
    pub(crate) question_id: String,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points_earned: f64,
}

/// Validates the tagged payload against the exam's question set and grades
/// the objective items. Questions without a supplied answer produce no row.
pub(crate) fn grade_answers(
    questions: &[QuestionWithKey],
    payload: &HashMap<String, AnswerValue>,
) -> Result<Vec<GradedAnswer>, GradingError> {
    let known: HashSet<&str> = questions.iter().map(|question| question.id.as_str()).collect();
    for question_id in payload.keys() {
        if !known.contains(question_id.as_str()) {
            return Err(GradingError::Validation(format!(
                "Answer references a question that is not on this exam: {question_id}"
            )));
        }
    }

    let mut graded = Vec::new();
    for question in questions {
        let Some(value) = payload.get(&question.id) else {
            continue;
        };

        match (question.kind, value) {
            (QuestionKind::Mcq, AnswerValue::Choice { option_id }) => {
                let is_correct = question.correct_option_id.as_deref() == Some(option_id.as_str());
                graded.push(GradedAnswer {
                    question_id: question.id.clone(),
                    selected_option_id: Some(option_id.clone()),
                    answer_text: None,
                    is_correct: Some(is_correct),
                    points_earned: if is_correct { question.points } else { 0.0 },
                });
            }
            (kind, AnswerValue::Text { text }) if kind.is_open() => {
                graded.push(GradedAnswer {
                    question_id: question.id.clone(),
                    selected_option_id: None,
                    answer_text: Some(text.clone()),
                    is_correct: None,
                    points_earned: 0.0,
                });
            }
            _ => {
                return Err(GradingError::Validation(format!(
                    "Answer for question {} does not match the question type",
                    question.id
                )))
            }
        }
    }

    Ok(graded)
}

/// The source keeps a zero-score submission in `pending` and everything else
/// in `submitted`; both mean "awaiting full grading".
pub(crate) fn status_for_provisional_score(percentage: f64) -> AttemptStatus {
    if percentage > 0.0 {
        AttemptStatus::Submitted
    } else {
        AttemptStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, kind: QuestionKind, points: f64, correct: Option<&str>) -> QuestionWithKey {
        QuestionWithKey {
            id: id.to_string(),
            kind,
            points,
            correct_option_id: correct.map(|value| value.to_string()),
        }
    }

    fn choice(option_id: &str) -> AnswerValue {
        AnswerValue::Choice { option_id: option_id.to_string() }
    }

    fn text(value: &str) -> AnswerValue {
        AnswerValue::Text { text: value.to_string() }
    }

    #[test]
    fn correct_choice_earns_full_points() {
        let questions = vec![question("q1", QuestionKind::Mcq, 5.0, Some("o1"))];
        let payload = HashMap::from([("q1".to_string(), choice("o1"))]);

        let graded = grade_answers(&questions, &payload).expect("graded");
        assert_eq!(graded.len(), 1);
        assert_eq!(graded[0].is_correct, Some(true));
        assert_eq!(graded[0].points_earned, 5.0);
    }

    #[test]
    fn wrong_choice_earns_nothing() {
        let questions = vec![question("q1", QuestionKind::Mcq, 5.0, Some("o1"))];
        let payload = HashMap::from([("q1".to_string(), choice("o2"))]);

        let graded = grade_answers(&questions, &payload).expect("graded");
        assert_eq!(graded[0].is_correct, Some(false));
        assert_eq!(graded[0].points_earned, 0.0);
    }

    #[test]
    fn open_answer_is_stored_ungraded() {
        let questions = vec![question("q1", QuestionKind::Essay, 10.0, None)];
        let payload = HashMap::from([("q1".to_string(), text("my essay"))]);

        let graded = grade_answers(&questions, &payload).expect("graded");
        assert_eq!(graded[0].answer_text.as_deref(), Some("my essay"));
        assert_eq!(graded[0].is_correct, None);
        assert_eq!(graded[0].points_earned, 0.0);
    }

    #[test]
    fn unanswered_questions_produce_no_rows() {
        let questions = vec![
            question("q1", QuestionKind::Mcq, 5.0, Some("o1")),
            question("q2", QuestionKind::Open, 5.0, None),
        ];
        let payload = HashMap::from([("q1".to_string(), choice("o1"))]);

        let graded = grade_answers(&questions, &payload).expect("graded");
        assert_eq!(graded.len(), 1);
        assert_eq!(graded[0].question_id, "q1");
    }

    #[test]
    fn unknown_question_id_is_rejected() {
        let questions = vec![question("q1", QuestionKind::Mcq, 5.0, Some("o1"))];
        let payload = HashMap::from([("q9".to_string(), choice("o1"))]);

        let err = grade_answers(&questions, &payload).expect_err("must reject");
        assert!(matches!(err, GradingError::Validation(_)));
    }

    #[test]
    fn mismatched_answer_kind_is_rejected() {
        let questions = vec![
            question("q1", QuestionKind::Mcq, 5.0, Some("o1")),
            question("q2", QuestionKind::Open, 5.0, None),
        ];

        let text_for_mcq = HashMap::from([("q1".to_string(), text("not an option"))]);
        assert!(matches!(
            grade_answers(&questions, &text_for_mcq),
            Err(GradingError::Validation(_))
        ));

        let choice_for_open = HashMap::from([("q2".to_string(), choice("o1"))]);
        assert!(matches!(
            grade_answers(&questions, &choice_for_open),
            Err(GradingError::Validation(_))
        ));
    }

    #[test]
    fn positive_score_submits_zero_score_stays_pending() {
        assert_eq!(status_for_provisional_score(50.0), AttemptStatus::Submitted);
        assert_eq!(status_for_provisional_score(0.1), AttemptStatus::Submitted);
        assert_eq!(status_for_provisional_score(0.0), AttemptStatus::Pending);
    }
}
