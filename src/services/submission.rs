//! The submit-test pipeline: validate, grade, then persist the answer
//! facts and the result row atomically.

use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::config::SubmissionPolicy;
use crate::core::time::primitive_now_utc;
use crate::db::models::TestResult;
use crate::repositories::{answers, categories, questions, results, tests};
use crate::services::scoring::{self, AnswerInput, ScoringError};

#[derive(Debug, thiserror::Error)]
pub(crate) enum SubmissionError {
    #[error("test not found")]
    TestNotFound,
    #[error("test already submitted")]
    AlreadySubmitted,
    #[error("question {0} does not belong to this test")]
    InvalidQuestion(String),
    #[error("every question must be answered")]
    Incomplete,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Grades and records one student's submission for a test.
///
/// A student submits a test at most once. The pre-check catches the common
/// retry; the UNIQUE constraint on (user_id, test_id) is what actually
/// decides a concurrent race, and the losing insert is reported as
/// `AlreadySubmitted`.
pub(crate) async fn submit_test(
    pool: &PgPool,
    policy: SubmissionPolicy,
    student_id: &str,
    test_id: &str,
    answers_in: &[AnswerInput],
) -> Result<TestResult, SubmissionError> {
    if tests::find_by_id(pool, test_id).await?.is_none() {
        return Err(SubmissionError::TestNotFound);
    }
    if results::exists_for_user_and_test(pool, student_id, test_id).await? {
        return Err(SubmissionError::AlreadySubmitted);
    }

    let test_questions = questions::list_by_test(pool, test_id).await?;

    // Foreign question ids are rejected before the coverage policy gets a
    // say, so the error names the offending id under either policy.
    let known: HashSet<&str> = test_questions.iter().map(|q| q.id.as_str()).collect();
    if let Some(foreign) =
        answers_in.iter().find(|a| !known.contains(a.question_id.as_str()))
    {
        return Err(SubmissionError::InvalidQuestion(foreign.question_id.clone()));
    }

    if policy == SubmissionPolicy::Strict
        && !covers_all_questions(&test_questions, answers_in)
    {
        return Err(SubmissionError::Incomplete);
    }

    let category_ids: Vec<String> = test_questions
        .iter()
        .map(|q| q.category_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let category_names = categories::names_by_ids(pool, &category_ids).await?;

    let scored = scoring::score_submission(&test_questions, &category_names, answers_in)
        .map_err(|ScoringError::UnknownQuestion(id)| SubmissionError::InvalidQuestion(id))?;

    let now = primitive_now_utc();
    let mut tx = pool.begin().await?;

    for graded in &scored.answers {
        answers::create(
            &mut *tx,
            answers::CreateAnswer {
                id: &Uuid::new_v4().to_string(),
                user_id: student_id,
                question_id: &graded.question_id,
                answer: &graded.answer,
                is_correct: graded.is_correct,
                answered_at: now,
            },
        )
        .await?;
    }

    let result = results::create(
        &mut *tx,
        results::CreateResult {
            id: &Uuid::new_v4().to_string(),
            user_id: student_id,
            test_id,
            score: scored.score,
            category_breakdown: scored.breakdown,
            created_at: now,
        },
    )
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => SubmissionError::AlreadySubmitted,
        _ => SubmissionError::Db(err),
    })?;

    tx.commit().await?;
    Ok(result)
}

/// Every question answered exactly once, no extras.
fn covers_all_questions(
    test_questions: &[crate::db::models::Question],
    answers_in: &[AnswerInput],
) -> bool {
    let wanted: HashSet<&str> = test_questions.iter().map(|q| q.id.as_str()).collect();
    let mut seen = HashSet::with_capacity(answers_in.len());
    for input in answers_in {
        if !seen.insert(input.question_id.as_str()) {
            return false;
        }
    }
    seen == wanted
}
