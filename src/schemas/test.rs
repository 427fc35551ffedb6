use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TestUpdate {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
}

impl TestResponse {
    pub(crate) fn from_db(test: crate::db::models::Test) -> Self {
        Self {
            id: test.id,
            title: test.title,
            description: test.description,
            created_by: test.created_by,
            created_at: format_primitive(test.created_at),
        }
    }
}
