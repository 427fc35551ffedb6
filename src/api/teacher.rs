//! Teacher-only surface: user administration, category and test
//! authoring, per-student review, recommendations and CSV export.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::validation;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::category::{CategoryCreate, CategoryResponse, CategoryUpdate};
use crate::schemas::question::{QuestionCreate, QuestionResponse, QuestionUpdate};
use crate::schemas::result::{
    RecommendationUpdate, SubmissionReviewResponse, TestResultResponse, TestResultSummary,
};
use crate::schemas::test::{TestCreate, TestResponse, TestUpdate};
use crate::schemas::user::{UserCreate, UserResponse};
use crate::services::{export, review};


pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:category_id",
            put(update_category).delete(delete_category),
        )
        .route("/tests", get(list_tests).post(create_test))
        .route("/tests/:test_id", get(get_test).put(update_test).delete(delete_test))
        .route("/tests/:test_id/results", get(list_test_results))
        .route("/tests/:test_id/export-results", get(export_results))
        .route("/questions", get(list_questions).post(create_question))
        .route(
            "/questions/:question_id",
            get(get_question).put(update_question).delete(delete_question),
        )
        .route("/students/:student_id/results", get(list_student_results))
        .route("/students/:student_id/tests/:test_id", get(review_student_submission))
        .route("/results/:result_id/recommendation", put(set_recommendation))
}

async fn list_users(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;
    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn create_user(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validation::validate_username(&payload.username)?;
    validation::validate_password_len(&payload.password)?;

    let existing = repositories::users::exists_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let now = primitive_now_utc();
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &payload.username,
            hashed_password,
            full_name: &payload.full_name,
            role: payload.role,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn list_categories(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = repositories::categories::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list categories"))?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from_db).collect()))
}

async fn create_category(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let category = repositories::categories::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
    )
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("Category with this name already exists".to_string())
        }
        _ => ApiError::internal(err, "Failed to create category"),
    })?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from_db(category))))
}

async fn update_category(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let updated =
        repositories::categories::update_name(state.db(), &category_id, payload.name.trim())
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    ApiError::Conflict("Category with this name already exists".to_string())
                }
                _ => ApiError::internal(err, "Failed to update category"),
            })?
            .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(CategoryResponse::from_db(updated)))
}

async fn delete_category(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::categories::delete_by_id(state.db(), &category_id)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => ApiError::Conflict(
                "Category is referenced by existing questions".to_string(),
            ),
            _ => ApiError::internal(err, "Failed to delete category"),
        })?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Category not found".to_string()))
    }
}

async fn list_tests(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<TestResponse>>, ApiError> {
    let tests = repositories::tests::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list tests"))?;
    Ok(Json(tests.into_iter().map(TestResponse::from_db).collect()))
}

async fn create_test(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<TestCreate>,
) -> Result<(StatusCode, Json<TestResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let test = repositories::tests::create(
        state.db(),
        repositories::tests::CreateTest {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            created_by: &teacher.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test"))?;

    Ok((StatusCode::CREATED, Json(TestResponse::from_db(test))))
}

async fn get_test(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Json<TestResponse>, ApiError> {
    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;
    Ok(Json(TestResponse::from_db(test)))
}

async fn update_test(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
    Json(payload): Json<TestUpdate>,
) -> Result<Json<TestResponse>, ApiError> {
    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title must not be empty".to_string()));
        }
    }

    let updated = repositories::tests::update(
        state.db(),
        &test_id,
        payload.title.as_deref(),
        payload.description.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update test"))?
    .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    Ok(Json(TestResponse::from_db(updated)))
}

async fn delete_test(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::tests::delete_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete test"))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Test not found".to_string()))
    }
}

#[derive(Deserialize)]
struct QuestionListParams {
    test_id: Option<String>,
}

async fn list_questions(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Query(params): Query<QuestionListParams>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let questions = match params.test_id {
        Some(test_id) => {
            if repositories::tests::find_by_id(state.db(), &test_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load test"))?
                .is_none()
            {
                return Err(ApiError::NotFound("Test not found".to_string()));
            }
            repositories::questions::list_by_test(state.db(), &test_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to list questions"))?
        }
        None => repositories::questions::list_all(state.db())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list questions"))?,
    };
    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

async fn create_question(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validation::validate_question_options(&payload.options, &payload.correct_answer)?;

    if repositories::tests::find_by_id(state.db(), &payload.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .is_none()
    {
        return Err(ApiError::NotFound("Test not found".to_string()));
    }
    if repositories::categories::find_by_id(state.db(), &payload.category_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load category"))?
        .is_none()
    {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            test_id: &payload.test_id,
            category_id: &payload.category_id,
            text: payload.text.trim(),
            image_url: payload.image_url.as_deref(),
            table_data: payload.table_data,
            options: payload.options,
            correct_answer: &payload.correct_answer,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

async fn get_question(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    Ok(Json(QuestionResponse::from_db(question)))
}

async fn update_question(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let current = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    // Validate against the options and answer as they will be after the update.
    let effective_options = payload.options.as_deref().unwrap_or(&current.options.0);
    let effective_answer =
        payload.correct_answer.as_deref().unwrap_or(&current.correct_answer);
    validation::validate_question_options(effective_options, effective_answer)?;

    if let Some(category_id) = &payload.category_id {
        if repositories::categories::find_by_id(state.db(), category_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load category"))?
            .is_none()
        {
            return Err(ApiError::NotFound("Category not found".to_string()));
        }
    }

    let updated = repositories::questions::update(
        state.db(),
        &question_id,
        repositories::questions::UpdateQuestion {
            category_id: payload.category_id,
            text: payload.text,
            image_url: payload.image_url,
            table_data: payload.table_data,
            options: payload.options,
            correct_answer: payload.correct_answer,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    Ok(Json(QuestionResponse::from_db(updated)))
}

async fn delete_question(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::questions::delete_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Question not found".to_string()))
    }
}

async fn list_test_results(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Json<Vec<TestResultSummary>>, ApiError> {
    if repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .is_none()
    {
        return Err(ApiError::NotFound("Test not found".to_string()));
    }

    let rows = repositories::results::list_by_test_with_students(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
    Ok(Json(rows.into_iter().map(TestResultSummary::from_row).collect()))
}

async fn list_student_results(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<TestResultResponse>>, ApiError> {
    if repositories::users::find_student_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .is_none()
    {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let results = repositories::results::list_by_user(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
    Ok(Json(results.into_iter().map(TestResultResponse::from_db).collect()))
}

async fn review_student_submission(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path((student_id, test_id)): Path<(String, String)>,
) -> Result<Json<SubmissionReviewResponse>, ApiError> {
    if repositories::users::find_student_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .is_none()
    {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let reviewed = review::student_review(state.db(), &student_id, &test_id)
        .await
        .map_err(map_review_error)?;
    Ok(Json(SubmissionReviewResponse::from_review(reviewed)))
}

async fn set_recommendation(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(result_id): Path<String>,
    Json(payload): Json<RecommendationUpdate>,
) -> Result<Json<TestResultResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let updated = repositories::results::set_recommendation(
        state.db(),
        &result_id,
        payload.recommendation.trim(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save recommendation"))?
    .ok_or_else(|| ApiError::NotFound("Result not found".to_string()))?;

    Ok(Json(TestResultResponse::from_db(updated)))
}

async fn export_results(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Response, ApiError> {
    let csv = export::export_test_results(state.db(), &test_id).await.map_err(|err| match err {
        export::ExportError::TestNotFound => ApiError::NotFound("Test not found".to_string()),
        export::ExportError::NoResults => {
            ApiError::NotFound("No results for this test yet".to_string())
        }
        export::ExportError::Db(e) => ApiError::internal(e, "Failed to export results"),
    })?;

    let disposition = format!("attachment; filename=\"{}\"", csv.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv.body,
    )
        .into_response())
}

fn map_review_error(err: review::ReviewError) -> ApiError {
    match err {
        review::ReviewError::TestNotFound => ApiError::NotFound("Test not found".to_string()),
        review::ReviewError::ResultNotFound => {
            ApiError::NotFound("No submission from this student".to_string())
        }
        review::ReviewError::Db(e) => ApiError::internal(e, "Failed to load submission review"),
    }
}
