use std::collections::HashMap;

use sqlx::PgPool;

use crate::db::models::Category;

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
        .fetch_all(pool)
        .await
}

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM categories").fetch_one(pool).await
}

pub(crate) async fn create(pool: &PgPool, id: &str, name: &str) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING id, name",
    )
    .bind(id)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update_name(
    pool: &PgPool,
    id: &str,
    name: &str,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name",
    )
    .bind(name)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Id → name lookup for the categories referenced by a test's questions.
/// The scoring engine keys its breakdown by category name.
pub(crate) async fn names_by_ids(
    pool: &PgPool,
    ids: &[String],
) -> Result<HashMap<String, String>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT id, name FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().collect())
}

/// Distinct category names appearing across a test's questions, sorted
/// lexicographically so export columns stay stable between runs.
pub(crate) async fn names_for_test(pool: &PgPool, test_id: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT c.name
         FROM categories c
         JOIN questions q ON q.category_id = c.id
         WHERE q.test_id = $1
         ORDER BY c.name",
    )
    .bind(test_id)
    .fetch_all(pool)
    .await
}
