use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Teacher,
    Student,
}

/// Fixed value shape of one category bucket in a result breakdown.
/// Stored as JSON inside `test_results.category_breakdown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CategoryScore {
    pub(crate) correct: i64,
    pub(crate) total: i64,
    pub(crate) percentage: f64,
}
