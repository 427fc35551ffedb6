//! Submission grading.
//!
//! Pure over its inputs: callers load the test's questions and category
//! names, hand over the raw answers, and get back the overall score, the
//! per-category breakdown and one graded fact per answer. Nothing here
//! touches the database.

use std::collections::{BTreeMap, HashMap};

use crate::db::models::Question;
use crate::db::types::CategoryScore;

/// The opt-out choice shown to students alongside every question's real
/// options. Selecting it always grades as incorrect.
pub(crate) const ABSTAIN_OPTION: &str = "Не знаю";

#[derive(Debug, Clone)]
pub(crate) struct AnswerInput {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug)]
pub(crate) struct GradedAnswer {
    pub question_id: String,
    pub answer: String,
    pub is_correct: bool,
}

#[derive(Debug)]
pub(crate) struct ScoredSubmission {
    /// Percentage of submitted answers that were correct, 0.0 to 100.0.
    pub score: f64,
    /// Category name → bucket, ordered by name.
    pub breakdown: BTreeMap<String, CategoryScore>,
    pub answers: Vec<GradedAnswer>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum ScoringError {
    #[error("question {0} does not belong to this test")]
    UnknownQuestion(String),
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Grades a set of answers against a test's questions.
///
/// Answer matching is exact and case-sensitive. The overall score divides
/// by the number of answers actually submitted, so unanswered questions
/// neither help nor hurt; an empty submission scores 0. Category buckets
/// only count questions the student answered. A question whose category
/// id has no name in `category_names` is still graded but contributes to
/// no bucket.
pub(crate) fn score_submission(
    questions: &[Question],
    category_names: &HashMap<String, String>,
    answers: &[AnswerInput],
) -> Result<ScoredSubmission, ScoringError> {
    let by_id: HashMap<&str, &Question> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut graded = Vec::with_capacity(answers.len());
    let mut correct_total = 0u64;
    let mut buckets: BTreeMap<String, (i64, i64)> = BTreeMap::new();

    for input in answers {
        let question = by_id
            .get(input.question_id.as_str())
            .ok_or_else(|| ScoringError::UnknownQuestion(input.question_id.clone()))?;

        let is_correct = input.answer == question.correct_answer;
        if is_correct {
            correct_total += 1;
        }

        if let Some(name) = category_names.get(&question.category_id) {
            let bucket = buckets.entry(name.clone()).or_insert((0, 0));
            bucket.1 += 1;
            if is_correct {
                bucket.0 += 1;
            }
        }

        graded.push(GradedAnswer {
            question_id: input.question_id.clone(),
            answer: input.answer.clone(),
            is_correct,
        });
    }

    // The overall score stays exact; only the per-category percentages
    // are rounded for display.
    let score = if answers.is_empty() {
        0.0
    } else {
        correct_total as f64 / answers.len() as f64 * 100.0
    };

    let breakdown = buckets
        .into_iter()
        .map(|(name, (correct, total))| {
            let percentage = if total == 0 {
                0.0
            } else {
                round2(correct as f64 / total as f64 * 100.0)
            };
            (name, CategoryScore { correct, total, percentage })
        })
        .collect();

    Ok(ScoredSubmission { score, breakdown, answers: graded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use sqlx::types::Json;

    fn question(id: &str, category_id: &str, correct: &str) -> Question {
        Question {
            id: id.to_string(),
            test_id: "t1".to_string(),
            category_id: category_id.to_string(),
            text: format!("question {id}"),
            image_url: None,
            table_data: None,
            options: Json(vec![
                correct.to_string(),
                "Wrong A".to_string(),
                "Wrong B".to_string(),
            ]),
            correct_answer: correct.to_string(),
            created_at: primitive_now_utc(),
        }
    }

    fn answer(question_id: &str, answer: &str) -> AnswerInput {
        AnswerInput { question_id: question_id.to_string(), answer: answer.to_string() }
    }

    fn names(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(id, name)| (id.to_string(), name.to_string())).collect()
    }

    #[test]
    fn two_categories_half_right() {
        let questions = vec![
            question("q1", "c-gen", "AA x aa"),
            question("q2", "c-gen", "9:3:3:1"),
            question("q3", "c-eco", "Producer"),
            question("q4", "c-eco", "Biotic"),
        ];
        let category_names = names(&[("c-gen", "Genetics"), ("c-eco", "Ecology")]);
        let answers = vec![
            answer("q1", "AA x aa"),
            answer("q2", "1:2:1"),
            answer("q3", "Producer"),
            answer("q4", "Abiotic"),
        ];

        let scored = score_submission(&questions, &category_names, &answers).unwrap();

        assert_eq!(scored.score, 50.0);
        assert_eq!(scored.breakdown.len(), 2);
        let gen = &scored.breakdown["Genetics"];
        assert_eq!((gen.correct, gen.total, gen.percentage), (1, 2, 50.0));
        let eco = &scored.breakdown["Ecology"];
        assert_eq!((eco.correct, eco.total, eco.percentage), (1, 2, 50.0));
    }

    #[test]
    fn empty_submission_scores_zero() {
        let questions = vec![question("q1", "c1", "A")];
        let scored = score_submission(&questions, &names(&[("c1", "Genetics")]), &[]).unwrap();
        assert_eq!(scored.score, 0.0);
        assert!(scored.breakdown.is_empty());
        assert!(scored.answers.is_empty());
    }

    #[test]
    fn denominator_is_submitted_answers_not_question_count() {
        let questions = vec![
            question("q1", "c1", "A"),
            question("q2", "c1", "B"),
            question("q3", "c1", "C"),
            question("q4", "c1", "D"),
        ];
        let answers = vec![answer("q1", "A"), answer("q2", "B")];
        let scored = score_submission(&questions, &names(&[("c1", "Genetics")]), &answers).unwrap();
        assert_eq!(scored.score, 100.0);
        assert_eq!(scored.breakdown["Genetics"].total, 2);
    }

    #[test]
    fn abstain_grades_as_incorrect() {
        let questions = vec![question("q1", "c1", "Mitochondria")];
        let answers = vec![answer("q1", ABSTAIN_OPTION)];
        let scored = score_submission(&questions, &names(&[("c1", "Cell Biology")]), &answers).unwrap();
        assert_eq!(scored.score, 0.0);
        assert!(!scored.answers[0].is_correct);
        let bucket = &scored.breakdown["Cell Biology"];
        assert_eq!((bucket.correct, bucket.total), (0, 1));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let questions = vec![question("q1", "c1", "Photosynthesis")];
        let answers = vec![answer("q1", "photosynthesis")];
        let scored = score_submission(&questions, &names(&[("c1", "Biochemistry")]), &answers).unwrap();
        assert!(!scored.answers[0].is_correct);
        assert_eq!(scored.score, 0.0);
    }

    #[test]
    fn overall_score_exact_category_percentages_rounded() {
        let questions = vec![
            question("q1", "c1", "A"),
            question("q2", "c1", "B"),
            question("q3", "c1", "C"),
        ];
        let answers = vec![answer("q1", "A"), answer("q2", "x"), answer("q3", "x")];
        let scored = score_submission(&questions, &names(&[("c1", "Evolution")]), &answers).unwrap();
        assert!((scored.score - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(scored.breakdown["Evolution"].percentage, 33.33);
    }

    #[test]
    fn unknown_question_is_rejected() {
        let questions = vec![question("q1", "c1", "A")];
        let answers = vec![answer("q-missing", "A")];
        let err = score_submission(&questions, &names(&[("c1", "Genetics")]), &answers).unwrap_err();
        assert_eq!(err, ScoringError::UnknownQuestion("q-missing".to_string()));
    }

    #[test]
    fn unnamed_category_still_graded_but_unbucketed() {
        let questions = vec![question("q1", "c-orphan", "A"), question("q2", "c1", "B")];
        let answers = vec![answer("q1", "A"), answer("q2", "B")];
        let scored = score_submission(&questions, &names(&[("c1", "Ecology")]), &answers).unwrap();
        assert_eq!(scored.score, 100.0);
        assert_eq!(scored.breakdown.len(), 1);
        assert_eq!(scored.breakdown["Ecology"].total, 1);
    }

    #[test]
    fn breakdown_keys_are_sorted_by_name() {
        let questions = vec![
            question("q1", "c-z", "A"),
            question("q2", "c-a", "B"),
            question("q3", "c-m", "C"),
        ];
        let category_names = names(&[("c-z", "Zoology"), ("c-a", "Anatomy"), ("c-m", "Mycology")]);
        let answers = vec![answer("q1", "A"), answer("q2", "B"), answer("q3", "C")];
        let scored = score_submission(&questions, &category_names, &answers).unwrap();
        let keys: Vec<&String> = scored.breakdown.keys().collect();
        assert_eq!(keys, ["Anatomy", "Mycology", "Zoology"]);
    }
}
