use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::StudentAnswer;

pub(crate) struct CreateAnswer<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub question_id: &'a str,
    pub answer: &'a str,
    pub is_correct: bool,
    pub answered_at: PrimitiveDateTime,
}

/// Executor-generic so the submission pipeline can write answer facts inside
/// the same transaction as the result row.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAnswer<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO student_answers (id, user_id, question_id, answer, is_correct, answered_at)
         VALUES ($1,$2,$3,$4,$5,$6)",
    )
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.question_id)
    .bind(params.answer)
    .bind(params.is_correct)
    .bind(params.answered_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// A student's answers across the questions of one test, in answer order.
pub(crate) async fn list_for_student_test(
    pool: &PgPool,
    user_id: &str,
    test_id: &str,
) -> Result<Vec<StudentAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(
        "SELECT sa.id, sa.user_id, sa.question_id, sa.answer, sa.is_correct, sa.answered_at
         FROM student_answers sa
         JOIN questions q ON q.id = sa.question_id
         WHERE sa.user_id = $1 AND q.test_id = $2
         ORDER BY sa.answered_at, sa.id",
    )
    .bind(user_id)
    .bind(test_id)
    .fetch_all(pool)
    .await
}
