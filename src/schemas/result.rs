use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::TestResult;
use crate::db::types::CategoryScore;
use crate::services::review::SubmissionReview;

#[derive(Debug, Deserialize)]
pub(crate) struct SubmittedAnswer {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    pub(crate) answer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TestSubmission {
    #[serde(alias = "testId")]
    pub(crate) test_id: String,
    pub(crate) answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResultResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) test_id: String,
    pub(crate) score: f64,
    pub(crate) category_breakdown: BTreeMap<String, CategoryScore>,
    pub(crate) recommendation: Option<String>,
    pub(crate) created_at: String,
}

impl TestResultResponse {
    pub(crate) fn from_db(result: TestResult) -> Self {
        Self {
            id: result.id,
            user_id: result.user_id,
            test_id: result.test_id,
            score: result.score,
            category_breakdown: result.category_breakdown.0,
            recommendation: result.recommendation,
            created_at: format_primitive(result.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RecommendationUpdate {
    #[validate(length(min = 1, max = 2000, message = "recommendation must be 1-2000 characters"))]
    pub(crate) recommendation: String,
}

/// One question in a graded review, answer and verdict alongside.
#[derive(Debug, Serialize)]
pub(crate) struct ReviewedQuestionResponse {
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) image_url: Option<String>,
    pub(crate) table_data: Option<serde_json::Value>,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: String,
    pub(crate) given_answer: Option<String>,
    pub(crate) is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionReviewResponse {
    pub(crate) test_id: String,
    pub(crate) test_title: String,
    pub(crate) result: TestResultResponse,
    pub(crate) questions: Vec<ReviewedQuestionResponse>,
}

impl SubmissionReviewResponse {
    pub(crate) fn from_review(review: SubmissionReview) -> Self {
        let questions = review
            .questions
            .into_iter()
            .map(|rq| ReviewedQuestionResponse {
                question_id: rq.question.id,
                text: rq.question.text,
                image_url: rq.question.image_url,
                table_data: rq.question.table_data.map(|d| d.0),
                options: rq.question.options.0,
                correct_answer: rq.question.correct_answer,
                given_answer: rq.given_answer,
                is_correct: rq.is_correct,
            })
            .collect();
        Self {
            test_id: review.test.id,
            test_title: review.test.title,
            result: TestResultResponse::from_db(review.result),
            questions,
        }
    }
}

/// Teacher's roster view of who submitted a test.
#[derive(Debug, Serialize)]
pub(crate) struct TestResultSummary {
    pub(crate) result_id: String,
    pub(crate) user_id: String,
    pub(crate) full_name: String,
    pub(crate) username: String,
    pub(crate) score: f64,
    pub(crate) category_breakdown: BTreeMap<String, CategoryScore>,
    pub(crate) submitted_at: String,
}

impl TestResultSummary {
    pub(crate) fn from_row(row: crate::repositories::results::ResultWithStudentRow) -> Self {
        Self {
            result_id: row.id,
            user_id: row.user_id,
            full_name: row.full_name,
            username: row.username,
            score: row.score,
            category_breakdown: row.category_breakdown.0,
            submitted_at: format_primitive(row.created_at),
        }
    }
}
