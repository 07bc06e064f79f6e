/// Input validation for posts and comments
use crate::error::{AppError, Result};
use crate::models::{Mood, UnknownMood, MAX_CONTENT_CHARS};

/// Trims `raw` and checks it is non-empty, free of NUL and within [`MAX_CONTENT_CHARS`]
///
/// `label` names the field in error messages ("Content", "Comment content").
pub fn validate_content(raw: Option<&str>, label: &str) -> Result<String> {
    let trimmed = raw.map(str::trim).unwrap_or_default();

    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", label)));
    }

    // Postgres TEXT cannot hold NUL
    if trimmed.contains('\0') {
        return Err(AppError::Validation(format!(
            "{} contains invalid characters",
            label
        )));
    }

    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            label, MAX_CONTENT_CHARS
        )));
    }

    Ok(trimmed.to_string())
}

/// Absent or blank mood falls back to neutral
pub fn parse_mood(raw: Option<&str>) -> Result<Mood> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Mood::default()),
        Some(value) => value
            .parse()
            .map_err(|e: UnknownMood| AppError::Validation(format!("Invalid mood: {}", e))),
    }
}
