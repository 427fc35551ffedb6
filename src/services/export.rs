//! CSV export of a test's results, one row per student.

use sqlx::PgPool;

use crate::repositories::results::ResultWithStudentRow;
use crate::repositories::{categories, results, tests};

#[derive(Debug, thiserror::Error)]
pub(crate) enum ExportError {
    #[error("test not found")]
    TestNotFound,
    #[error("no results to export")]
    NoResults,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub(crate) struct ResultsCsv {
    pub filename: String,
    pub body: String,
}

/// Builds the results CSV for a test. Category columns are the distinct
/// category names across the test's questions, sorted by name so repeated
/// exports line up; a student with no answers in a category gets a blank
/// cell there.
pub(crate) async fn export_test_results(
    pool: &PgPool,
    test_id: &str,
) -> Result<ResultsCsv, ExportError> {
    let test = tests::find_by_id(pool, test_id)
        .await?
        .ok_or(ExportError::TestNotFound)?;
    let rows = results::list_by_test_with_students(pool, test_id).await?;
    if rows.is_empty() {
        return Err(ExportError::NoResults);
    }
    let category_names = categories::names_for_test(pool, test_id).await?;

    Ok(ResultsCsv {
        filename: format!("{}_results.csv", sanitize_filename(&test.title)),
        body: render_csv(&category_names, &rows),
    })
}

fn render_csv(category_names: &[String], rows: &[ResultWithStudentRow]) -> String {
    let mut out = String::new();

    out.push_str("Name,Username,Overall Score (%)");
    for name in category_names {
        out.push(',');
        out.push_str(&csv_quote(&format!("{name} Score (%)")));
    }
    out.push('\n');

    for row in rows {
        out.push_str(&csv_quote(&row.full_name));
        out.push(',');
        out.push_str(&csv_quote(&row.username));
        out.push(',');
        out.push_str(&format!("{:.1}", row.score));
        for name in category_names {
            out.push(',');
            if let Some(bucket) = row.category_breakdown.0.get(name) {
                out.push_str(&format!("{:.1}", bucket.percentage));
            }
        }
        out.push('\n');
    }

    out
}

fn csv_quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Keeps alphanumerics, dashes and underscores; everything else becomes
/// an underscore so the attachment filename stays header-safe.
fn sanitize_filename(title: &str) -> String {
    let safe: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if safe.is_empty() { "test".to_string() } else { safe }
}
