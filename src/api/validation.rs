use crate::api::errors::ApiError;
use std::path::Path;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    let valid = (3..=50).contains(&username.chars().count())
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Username must be 3-50 characters of letters, digits, '_' or '.'".to_string(),
        ))
    }
}

/// A question must offer at least two distinct options, and its correct
/// answer must be one of them.
pub(crate) fn validate_question_options(
    options: &[String],
    correct_answer: &str,
) -> Result<(), ApiError> {
    if options.len() < 2 {
        return Err(ApiError::BadRequest(
            "A question needs at least two options".to_string(),
        ));
    }
    if options.iter().any(|o| o.trim().is_empty()) {
        return Err(ApiError::BadRequest("Options must not be empty".to_string()));
    }
    for (index, option) in options.iter().enumerate() {
        if options[..index].contains(option) {
            return Err(ApiError::BadRequest(format!("Duplicate option '{option}'")));
        }
    }
    if !options.iter().any(|o| o == correct_answer) {
        return Err(ApiError::BadRequest(
            "The correct answer must be one of the options".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_image_upload(
    filename: &str,
    content_type: &str,
    allowed_extensions: &[String],
) -> Result<(), ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    if mime_allowed_for_extension(&mime, &extension) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        "webp" => mime == "image/webp",
        "gif" => mime == "image/gif",
        "bmp" => matches!(mime, "image/bmp" | "image/x-ms-bmp"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn question_options_accept_valid_set() {
        assert!(validate_question_options(&opts(&["A", "B", "C"]), "B").is_ok());
    }

    #[test]
    fn question_options_reject_missing_correct_answer() {
        assert!(validate_question_options(&opts(&["A", "B"]), "C").is_err());
    }

    #[test]
    fn question_options_reject_duplicates_and_blanks() {
        assert!(validate_question_options(&opts(&["A", "A"]), "A").is_err());
        assert!(validate_question_options(&opts(&["A", "  "]), "A").is_err());
        assert!(validate_question_options(&opts(&["A"]), "A").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("maria_k").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("with space").is_err());
    }

    #[test]
    fn image_upload_checks_extension_and_mime() {
        let allowed = opts(&["jpg", "png"]);
        assert!(validate_image_upload("cell.png", "image/png", &allowed).is_ok());
        assert!(validate_image_upload("cell.png", "image/jpeg", &allowed).is_err());
        assert!(validate_image_upload("cell.svg", "image/svg+xml", &allowed).is_err());
        assert!(validate_image_upload("noext", "image/png", &allowed).is_err());
    }
}
