use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Question;

const COLUMNS: &str = "\
    id, test_id, category_id, text, image_url, table_data, options, correct_answer, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Questions of a test in insertion order (display order is significant).
pub(crate) async fn list_by_test(pool: &PgPool, test_id: &str) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE test_id = $1 ORDER BY created_at, id"
    ))
    .bind(test_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateQuestion<'a> {
    pub id: &'a str,
    pub test_id: &'a str,
    pub category_id: &'a str,
    pub text: &'a str,
    pub image_url: Option<&'a str>,
    pub table_data: Option<serde_json::Value>,
    pub options: Vec<String>,
    pub correct_answer: &'a str,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, test_id, category_id, text, image_url, table_data, options,
            correct_answer, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.test_id)
    .bind(params.category_id)
    .bind(params.text)
    .bind(params.image_url)
    .bind(params.table_data.map(Json))
    .bind(Json(params.options))
    .bind(params.correct_answer)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateQuestion {
    pub category_id: Option<String>,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub table_data: Option<serde_json::Value>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuestion,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            category_id = COALESCE($1, category_id),
            text = COALESCE($2, text),
            image_url = COALESCE($3, image_url),
            table_data = COALESCE($4, table_data),
            options = COALESCE($5, options),
            correct_answer = COALESCE($6, correct_answer)
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.category_id)
    .bind(params.text)
    .bind(params.image_url)
    .bind(params.table_data.map(Json))
    .bind(params.options.map(Json))
    .bind(params.correct_answer)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
