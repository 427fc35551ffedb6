use std::collections::BTreeMap;

use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::TestResult;
use crate::db::types::CategoryScore;

const COLUMNS: &str =
    "id, user_id, test_id, score, category_breakdown, recommendation, created_at";

pub(crate) async fn find_by_user_and_test(
    pool: &PgPool,
    user_id: &str,
    test_id: &str,
) -> Result<Option<TestResult>, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!(
        "SELECT {COLUMNS} FROM test_results WHERE user_id = $1 AND test_id = $2"
    ))
    .bind(user_id)
    .bind(test_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn exists_for_user_and_test(
    pool: &PgPool,
    user_id: &str,
    test_id: &str,
) -> Result<bool, sqlx::Error> {
    let found: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM test_results WHERE user_id = $1 AND test_id = $2")
            .bind(user_id)
            .bind(test_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<TestResult>, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!(
        "SELECT {COLUMNS} FROM test_results WHERE user_id = $1 ORDER BY created_at, id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// One exported row: the student's identity joined onto their result.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ResultWithStudentRow {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) full_name: String,
    pub(crate) username: String,
    pub(crate) score: f64,
    pub(crate) category_breakdown: Json<BTreeMap<String, CategoryScore>>,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn list_by_test_with_students(
    pool: &PgPool,
    test_id: &str,
) -> Result<Vec<ResultWithStudentRow>, sqlx::Error> {
    sqlx::query_as::<_, ResultWithStudentRow>(
        "SELECT r.id, r.user_id, u.full_name, u.username, r.score,
                r.category_breakdown, r.created_at
         FROM test_results r
         JOIN users u ON u.id = r.user_id
         WHERE r.test_id = $1
         ORDER BY u.full_name, u.username",
    )
    .bind(test_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateResult<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub test_id: &'a str,
    pub score: f64,
    pub category_breakdown: BTreeMap<String, CategoryScore>,
    pub created_at: PrimitiveDateTime,
}

/// Executor-generic; the submission pipeline runs this inside its
/// transaction. A unique violation on (user_id, test_id) surfaces as a
/// database error the caller translates to a duplicate-submission failure.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResult<'_>,
) -> Result<TestResult, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!(
        "INSERT INTO test_results (id, user_id, test_id, score, category_breakdown, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.test_id)
    .bind(params.score)
    .bind(Json(params.category_breakdown))
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Overwrites any prior recommendation; idempotent by design.
pub(crate) async fn set_recommendation(
    pool: &PgPool,
    id: &str,
    recommendation: &str,
) -> Result<Option<TestResult>, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!(
        "UPDATE test_results SET recommendation = $1 WHERE id = $2 RETURNING {COLUMNS}"
    ))
    .bind(recommendation)
    .bind(id)
    .fetch_optional(pool)
    .await
}
