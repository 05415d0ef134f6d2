use std::collections::HashMap;

use crate::db::models::StudentAnswer;
use crate::db::types::QuestionKind;
use crate::repositories::questions::QuestionWithKey;

/// Point totals for one attempt against one exam's full question set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoreSummary {
    pub(crate) total_points: f64,
    pub(crate) earned_points: f64,
    pub(crate) percentage: f64,
}

/// The shared aggregation rule used by both the submission and the correction
/// processors. An mcq answer earns the full question points iff the stored
/// selection matches the option flagged correct; open-type answers contribute
/// their stored `points_earned`; questions without an answer row contribute 0
/// earned and full value to the total.
pub(crate) fn aggregate(questions: &[QuestionWithKey], answers: &[StudentAnswer]) -> ScoreSummary {
    let by_question: HashMap<&str, &StudentAnswer> =
        answers.iter().map(|answer| (answer.question_id.as_str(), answer)).collect();

    let mut total_points = 0.0;
    let mut earned_points = 0.0;

    for question in questions {
        total_points += question.points;

        let Some(answer) = by_question.get(question.id.as_str()) else {
            continue;
        };

        match question.kind {
            QuestionKind::Mcq => {
                let correct = question.correct_option_id.is_some()
                    && question.correct_option_id == answer.selected_option_id;
                if correct {
                    earned_points += question.points;
                }
            }
            _ => earned_points += answer.points_earned,
        }
    }

    let percentage = if total_points > 0.0 {
        round_one_decimal(earned_points / total_points * 100.0)
    } else {
        0.0
    };

    ScoreSummary { total_points, earned_points, percentage }
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::QuestionKind;
    use time::macros::datetime;

    fn question(id: &str, kind: QuestionKind, points: f64, correct: Option<&str>) -> QuestionWithKey {
        QuestionWithKey {
            id: id.to_string(),
            kind,
            points,
            correct_option_id: correct.map(|value| value.to_string()),
        }
    }

    fn answer(
        question_id: &str,
        selected: Option<&str>,
        text: Option<&str>,
        points_earned: f64,
    ) -> StudentAnswer {
        let at = datetime!(2025-03-01 09:00);
        StudentAnswer {
            id: format!("ans-{question_id}"),
            attempt_id: "attempt-1".to_string(),
            question_id: question_id.to_string(),
            selected_option_id: selected.map(|value| value.to_string()),
            answer_text: text.map(|value| value.to_string()),
            is_correct: None,
            points_earned,
            feedback: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn two_correct_mcq_score_one_hundred() {
        let questions = vec![
            question("q1", QuestionKind::Mcq, 5.0, Some("o1")),
            question("q2", QuestionKind::Mcq, 5.0, Some("o2")),
        ];
        let answers =
            vec![answer("q1", Some("o1"), None, 5.0), answer("q2", Some("o2"), None, 5.0)];

        let summary = aggregate(&questions, &answers);
        assert_eq!(summary.total_points, 10.0);
        assert_eq!(summary.earned_points, 10.0);
        assert_eq!(summary.percentage, 100.0);
    }

    #[test]
    fn all_wrong_mcq_score_zero() {
        let questions = vec![
            question("q1", QuestionKind::Mcq, 5.0, Some("o1")),
            question("q2", QuestionKind::Mcq, 5.0, Some("o2")),
        ];
        let answers =
            vec![answer("q1", Some("wrong"), None, 0.0), answer("q2", Some("wrong"), None, 0.0)];

        let summary = aggregate(&questions, &answers);
        assert_eq!(summary.earned_points, 0.0);
        assert_eq!(summary.percentage, 0.0);
    }

    #[test]
    fn open_answer_contributes_stored_points() {
        let questions = vec![
            question("q1", QuestionKind::Open, 10.0, None),
            question("q2", QuestionKind::Mcq, 10.0, Some("o1")),
        ];

        // At submission time the open item has not been graded yet.
        let provisional =
            vec![answer("q1", None, Some("my essay"), 0.0), answer("q2", Some("o1"), None, 10.0)];
        assert_eq!(aggregate(&questions, &provisional).percentage, 50.0);

        // After correction awards 8/10 the combined figure includes both.
        let corrected =
            vec![answer("q1", None, Some("my essay"), 8.0), answer("q2", Some("o1"), None, 10.0)];
        let summary = aggregate(&questions, &corrected);
        assert_eq!(summary.earned_points, 18.0);
        assert_eq!(summary.percentage, 90.0);
    }

    #[test]
    fn unanswered_question_counts_toward_total_only() {
        let questions = vec![
            question("q1", QuestionKind::Mcq, 5.0, Some("o1")),
            question("q2", QuestionKind::Mcq, 5.0, Some("o2")),
        ];
        let answers = vec![answer("q1", Some("o1"), None, 5.0)];

        let summary = aggregate(&questions, &answers);
        assert_eq!(summary.total_points, 10.0);
        assert_eq!(summary.earned_points, 5.0);
        assert_eq!(summary.percentage, 50.0);
    }

    #[test]
    fn empty_question_set_scores_zero() {
        let summary = aggregate(&[], &[]);
        assert_eq!(summary.total_points, 0.0);
        assert_eq!(summary.percentage, 0.0);
    }

    #[test]
    fn percentage_is_rounded_to_one_decimal() {
        let questions = vec![
            question("q1", QuestionKind::Mcq, 1.0, Some("o1")),
            question("q2", QuestionKind::Mcq, 1.0, Some("o2")),
            question("q3", QuestionKind::Mcq, 1.0, Some("o3")),
        ];
        let answers = vec![answer("q1", Some("o1"), None, 1.0)];

        // 1/3 of the points: 33.333… rounds to 33.3
        assert_eq!(aggregate(&questions, &answers).percentage, 33.3);
    }

    #[test]
    fn percentage_stays_within_bounds() {
        let questions = vec![question("q1", QuestionKind::Open, 10.0, None)];
        for earned in [0.0, 2.5, 7.77, 10.0] {
            let answers = vec![answer("q1", None, Some("text"), earned)];
            let summary = aggregate(&questions, &answers);
            assert!(summary.percentage >= 0.0 && summary.percentage <= 100.0);
            assert_eq!(summary.percentage, round_one_decimal(earned / 10.0 * 100.0));
        }
    }

    #[test]
    fn aggregation_is_deterministic() {
        let questions = vec![
            question("q1", QuestionKind::Mcq, 4.0, Some("o1")),
            question("q2", QuestionKind::Essay, 6.0, None),
        ];
        let answers =
            vec![answer("q1", Some("o1"), None, 4.0), answer("q2", None, Some("essay"), 3.5)];

        let first = aggregate(&questions, &answers);
        let second = aggregate(&questions, &answers);
        assert_eq!(first, second);
    }

    #[test]
    fn mcq_without_correct_option_never_earns() {
        let questions = vec![question("q1", QuestionKind::Mcq, 5.0, None)];
        let answers = vec![answer("q1", Some("o1"), None, 0.0)];
        assert_eq!(aggregate(&questions, &answers).earned_points, 0.0);
    }
}
