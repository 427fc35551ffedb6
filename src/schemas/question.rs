use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Question;
use crate::services::scoring::ABSTAIN_OPTION;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "testId")]
    pub(crate) test_id: String,
    #[serde(alias = "categoryId")]
    pub(crate) category_id: String,
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "imageUrl")]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    #[serde(alias = "tableData")]
    pub(crate) table_data: Option<serde_json::Value>,
    pub(crate) options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[serde(alias = "categoryId")]
    pub(crate) category_id: Option<String>,
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    #[serde(alias = "imageUrl")]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    #[serde(alias = "tableData")]
    pub(crate) table_data: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<String>,
}

/// Full question as teachers see it, correct answer included.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) category_id: String,
    pub(crate) text: String,
    pub(crate) image_url: Option<String>,
    pub(crate) table_data: Option<serde_json::Value>,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: String,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            test_id: question.test_id,
            category_id: question.category_id,
            text: question.text,
            image_url: question.image_url,
            table_data: question.table_data.map(|d| d.0),
            options: question.options.0,
            correct_answer: question.correct_answer,
            created_at: format_primitive(question.created_at),
        }
    }
}

/// What a student taking the test sees. The correct answer is withheld
/// and the abstain choice is appended after the real options.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionStudentView {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) category_id: String,
    pub(crate) text: String,
    pub(crate) image_url: Option<String>,
    pub(crate) table_data: Option<serde_json::Value>,
    pub(crate) options: Vec<String>,
}

impl QuestionStudentView {
    pub(crate) fn from_db(question: Question) -> Self {
        let mut options = question.options.0;
        if !options.iter().any(|o| o == ABSTAIN_OPTION) {
            options.push(ABSTAIN_OPTION.to_string());
        }
        Self {
            id: question.id,
            test_id: question.test_id,
            category_id: question.category_id,
            text: question.text,
            image_url: question.image_url,
            table_data: question.table_data.map(|d| d.0),
            options,
        }
    }
}
