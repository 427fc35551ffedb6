//! Post-submission review: a question-by-question account of what the
//! student answered, assembled for both the student's own detail view and
//! the teacher's per-student review.

use std::collections::HashMap;

use sqlx::PgPool;

use crate::db::models::{Question, Test, TestResult};
use crate::repositories::{answers, questions, results, tests};

#[derive(Debug, thiserror::Error)]
pub(crate) enum ReviewError {
    #[error("test not found")]
    TestNotFound,
    #[error("no result for this student and test")]
    ResultNotFound,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug)]
pub(crate) struct ReviewedQuestion {
    pub question: Question,
    /// None when the student skipped the question.
    pub given_answer: Option<String>,
    pub is_correct: Option<bool>,
}

#[derive(Debug)]
pub(crate) struct SubmissionReview {
    pub test: Test,
    pub result: TestResult,
    pub questions: Vec<ReviewedQuestion>,
}

/// Loads one student's graded submission for a test, questions in display
/// order with the recorded answer joined onto each.
pub(crate) async fn student_review(
    pool: &PgPool,
    student_id: &str,
    test_id: &str,
) -> Result<SubmissionReview, ReviewError> {
    let test = tests::find_by_id(pool, test_id)
        .await?
        .ok_or(ReviewError::TestNotFound)?;
    let result = results::find_by_user_and_test(pool, student_id, test_id)
        .await?
        .ok_or(ReviewError::ResultNotFound)?;

    let test_questions = questions::list_by_test(pool, test_id).await?;
    let recorded = answers::list_for_student_test(pool, student_id, test_id).await?;
    let by_question: HashMap<String, (String, bool)> = recorded
        .into_iter()
        .map(|a| (a.question_id, (a.answer, a.is_correct)))
        .collect();

    let reviewed = test_questions
        .into_iter()
        .map(|question| {
            let (given_answer, is_correct) = match by_question.get(&question.id) {
                Some((answer, correct)) => (Some(answer.clone()), Some(*correct)),
                None => (None, None),
            };
            ReviewedQuestion { question, given_answer, is_correct }
        })
        .collect();

    Ok(SubmissionReview { test, result, questions: reviewed })
}
