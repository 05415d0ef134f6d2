use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::StudentAnswer;
use crate::db::types::AttemptStatus;
use crate::repositories::results::UpsertResult;
use crate::repositories::{answers, attempts, exams, questions, results, users};
use crate::schemas::correction::ScoreEntry;
use crate::services::{notifications, scoring, GradingError};

#[derive(Debug, Clone, Copy)]
pub(crate) struct CorrectionOutcome {
    pub(crate) final_score: f64,
    pub(crate) status: AttemptStatus,
}

/// Applies a teacher's per-answer points and feedback to the open-type
/// answers of one attempt, recomputes the combined score, marks the attempt
/// graded, upserts the student's result and notifies them. One transaction;
/// every entry is accepted or the whole pass is rejected.
pub(crate) async fn record_corrections(
    pool: &PgPool,
    exam_id: &str,
    student_id: &str,
    teacher_id: &str,
    entries: &HashMap<String, ScoreEntry>,
) -> Result<CorrectionOutcome, GradingError> {
    let mut tx = pool.begin().await?;

    let exam = exams::find_by_id_tx(&mut tx, exam_id)
        .await?
        .ok_or_else(|| GradingError::NotFound("Exam not found".to_string()))?;

    if exam.created_by != teacher_id {
        return Err(GradingError::Authorization("Exam belongs to another teacher"));
    }

    let student = users::find_student(&mut tx, student_id)
        .await?
        .ok_or_else(|| GradingError::NotFound("Student not found".to_string()))?;

    // The row lock serializes concurrent correction passes on this attempt.
    let attempt = attempts::lock_submitted_for_exam_and_student(&mut tx, exam_id, student_id)
        .await?
        .ok_or_else(|| GradingError::NotFound("No submitted attempt for this student".to_string()))?;

    if attempt.status != AttemptStatus::Graded && !attempt.status.can_become(AttemptStatus::Graded)
    {
        return Err(GradingError::Validation("Attempt is not awaiting grading".to_string()));
    }

    let question_set = questions::list_with_answer_key(&mut tx, exam_id).await?;
    let stored = answers::list_by_attempt(&mut tx, &attempt.id).await?;

    let open_question_ids: HashSet<&str> = question_set
        .iter()
        .filter(|question| question.kind.is_open())
        .map(|question| question.id.as_str())
        .collect();
    let open_answers: Vec<&StudentAnswer> = stored
        .iter()
        .filter(|answer| open_question_ids.contains(answer.question_id.as_str()))
        .collect();

    if open_answers.is_empty() {
        return Err(GradingError::NotFound(
            "No open answers awaiting correction for this attempt".to_string(),
        ));
    }

    check_entries(entries, &open_answers)?;

    let now = primitive_now_utc();
    for (answer_id, entry) in entries {
        answers::apply_correction(&mut tx, answer_id, entry.points, entry.feedback.as_deref(), now)
            .await?;
    }

    let corrected = answers::list_by_attempt(&mut tx, &attempt.id).await?;
    let summary = scoring::aggregate(&question_set, &corrected);

    attempts::mark_graded(&mut tx, &attempt.id, summary.percentage, teacher_id, now).await?;

    results::upsert(
        &mut tx,
        UpsertResult {
            id: &Uuid::new_v4().to_string(),
            exam_id,
            student_id,
            score: summary.percentage,
            submitted_at: attempt.submitted_at,
            graded_at: now,
        },
    )
    .await?;

    notifications::notify_grade_available(
        &mut tx,
        &student.id,
        exam_id,
        &exam.title,
        summary.percentage,
        now,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        exam_id = %exam_id,
        student_id = %student_id,
        teacher_id = %teacher_id,
        final_score = summary.percentage,
        "Attempt graded"
    );

    Ok(CorrectionOutcome { final_score: summary.percentage, status: AttemptStatus::Graded })
}

/// Every entry must target an open-type answer of this attempt and award
/// points within `[0, max_points]`; a single bad entry rejects the pass.
pub(crate) fn check_entries(
    entries: &HashMap<String, ScoreEntry>,
    open_answers: &[&StudentAnswer],
) -> Result<(), GradingError> {
    let known: HashSet<&str> = open_answers.iter().map(|answer| answer.id.as_str()).collect();

    for (answer_id, entry) in entries {
        if !known.contains(answer_id.as_str()) {
            return Err(GradingError::Validation(format!(
                "Score entry references an answer that is not open for correction: {answer_id}"
            )));
        }
        if entry.points < 0.0 || entry.points > entry.max_points {
            return Err(GradingError::Validation(format!(
                "Points for answer {answer_id} must be between 0 and {}",
                entry.max_points
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn open_answer(id: &str, question_id: &str) -> StudentAnswer {
        let at = datetime!(2025-03-01 09:00);
        StudentAnswer {
            id: id.to_string(),
            attempt_id: "attempt-1".to_string(),
            question_id: question_id.to_string(),
            selected_option_id: None,
            answer_text: Some("free text".to_string()),
            is_correct: None,
            points_earned: 0.0,
            feedback: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn entry(points: f64, max_points: f64) -> ScoreEntry {
        ScoreEntry { points, max_points, feedback: None }
    }

    #[test]
    fn entries_within_range_pass() {
        let a1 = open_answer("a1", "q1");
        let a2 = open_answer("a2", "q2");
        let open = vec![&a1, &a2];
        let entries = HashMap::from([
            ("a1".to_string(), entry(8.0, 10.0)),
            ("a2".to_string(), entry(0.0, 5.0)),
        ]);

        assert!(check_entries(&entries, &open).is_ok());
    }

    #[test]
    fn points_above_max_reject_the_pass() {
        let a1 = open_answer("a1", "q1");
        let open = vec![&a1];
        let entries = HashMap::from([("a1".to_string(), entry(12.0, 10.0))]);

        let err = check_entries(&entries, &open).expect_err("must reject");
        assert!(matches!(err, GradingError::Validation(_)));
    }

    #[test]
    fn negative_points_reject_the_pass() {
        let a1 = open_answer("a1", "q1");
        let open = vec![&a1];
        let entries = HashMap::from([("a1".to_string(), entry(-1.0, 10.0))]);

        assert!(matches!(check_entries(&entries, &open), Err(GradingError::Validation(_))));
    }

    #[test]
    fn entry_for_unknown_answer_rejects_the_pass() {
        let a1 = open_answer("a1", "q1");
        let open = vec![&a1];
        let entries = HashMap::from([("a9".to_string(), entry(5.0, 10.0))]);

        assert!(matches!(check_entries(&entries, &open), Err(GradingError::Validation(_))));
    }

    #[test]
    fn one_bad_entry_rejects_the_whole_batch() {
        let a1 = open_answer("a1", "q1");
        let a2 = open_answer("a2", "q2");
        let open = vec![&a1, &a2];
        let entries = HashMap::from([
            ("a1".to_string(), entry(5.0, 10.0)),
            ("a2".to_string(), entry(6.0, 5.0)),
        ]);

        assert!(matches!(check_entries(&entries, &open), Err(GradingError::Validation(_))));
    }

    #[test]
    fn awarding_the_maximum_is_allowed() {
        let a1 = open_answer("a1", "q1");
        let open = vec![&a1];
        let entries = HashMap::from([("a1".to_string(), entry(10.0, 10.0))]);

        assert!(check_entries(&entries, &open).is_ok());
    }
}
