//! Student surface: browse available tests, take one, see results.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::question::QuestionStudentView;
use crate::schemas::result::{SubmissionReviewResponse, TestResultResponse, TestSubmission};
use crate::schemas::test::TestResponse;
use crate::services::review;
use crate::services::scoring::AnswerInput;
use crate::services::submission::{self, SubmissionError};

#[cfg(test)]
mod tests;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/available-tests", get(available_tests))
        .route("/tests/:test_id/questions", get(test_questions))
        .route("/submit-test", post(submit_test))
        .route("/results/:test_id", get(test_result))
        .route("/results/:test_id/detailed", get(detailed_result))
        .route("/my-results", get(my_results))
}

/// A test plus whether this student has already taken it.
#[derive(Debug, Serialize)]
struct AvailableTest {
    #[serde(flatten)]
    test: TestResponse,
    already_taken: bool,
}

async fn available_tests(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<AvailableTest>>, ApiError> {
    let tests = repositories::tests::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list tests"))?;

    let taken: std::collections::HashSet<String> =
        repositories::results::list_by_user(state.db(), &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load results"))?
            .into_iter()
            .map(|r| r.test_id)
            .collect();

    let available = tests
        .into_iter()
        .map(|test| {
            let already_taken = taken.contains(&test.id);
            AvailableTest { test: TestResponse::from_db(test), already_taken }
        })
        .collect();
    Ok(Json(available))
}

async fn test_questions(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Json<Vec<QuestionStudentView>>, ApiError> {
    if repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .is_none()
    {
        return Err(ApiError::NotFound("Test not found".to_string()));
    }

    let already = repositories::results::exists_for_user_and_test(state.db(), &student.id, &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check submission"))?;
    if already {
        return Err(ApiError::Conflict("You have already taken this test".to_string()));
    }

    let questions = repositories::questions::list_by_test(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    Ok(Json(questions.into_iter().map(QuestionStudentView::from_db).collect()))
}

async fn submit_test(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<TestSubmission>,
) -> Result<(StatusCode, Json<TestResultResponse>), ApiError> {
    let answers: Vec<AnswerInput> = payload
        .answers
        .into_iter()
        .map(|a| AnswerInput { question_id: a.question_id, answer: a.answer })
        .collect();

    let result = submission::submit_test(
        state.db(),
        state.settings().scoring().submission_policy,
        &student.id,
        &payload.test_id,
        &answers,
    )
    .await
    .map_err(|err| match err {
        SubmissionError::TestNotFound => ApiError::NotFound("Test not found".to_string()),
        SubmissionError::AlreadySubmitted => {
            ApiError::Conflict("You have already taken this test".to_string())
        }
        SubmissionError::InvalidQuestion(id) => {
            ApiError::BadRequest(format!("Question {id} does not belong to this test"))
        }
        SubmissionError::Incomplete => {
            ApiError::BadRequest("Every question must be answered".to_string())
        }
        SubmissionError::Db(e) => ApiError::internal(e, "Failed to record submission"),
    })?;

    Ok((StatusCode::CREATED, Json(TestResultResponse::from_db(result))))
}

async fn test_result(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Json<TestResultResponse>, ApiError> {
    let result = repositories::results::find_by_user_and_test(state.db(), &student.id, &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load result"))?
        .ok_or_else(|| ApiError::NotFound("No result for this test".to_string()))?;
    Ok(Json(TestResultResponse::from_db(result)))
}

async fn detailed_result(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Json<SubmissionReviewResponse>, ApiError> {
    let reviewed =
        review::student_review(state.db(), &student.id, &test_id).await.map_err(|err| match err {
            review::ReviewError::TestNotFound => ApiError::NotFound("Test not found".to_string()),
            review::ReviewError::ResultNotFound => {
                ApiError::NotFound("No result for this test".to_string())
            }
            review::ReviewError::Db(e) => ApiError::internal(e, "Failed to load detailed result"),
        })?;
    Ok(Json(SubmissionReviewResponse::from_review(reviewed)))
}

async fn my_results(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<TestResultResponse>>, ApiError> {
    let results = repositories::results::list_by_user(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load results"))?;
    Ok(Json(results.into_iter().map(TestResultResponse::from_db).collect()))
}
