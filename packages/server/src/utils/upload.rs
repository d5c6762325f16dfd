use common::storage::StorageKey;

use crate::error::AppError;
use crate::state::AppState;

/// Validates the client-supplied name of an uploaded file (no directory components).
pub fn validate_upload_filename(filename: &str) -> Result<&str, AppError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Filename cannot be empty".into()));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(AppError::Validation(
            "Invalid filename: control characters are not allowed".into(),
        ));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(AppError::Validation(
            "Invalid filename: path separators are not allowed".into(),
        ));
    }
    if trimmed.starts_with('.') {
        return Err(AppError::Validation(
            "Invalid filename: hidden files (starting with '.') are not allowed".into(),
        ));
    }
    if trimmed.chars().count() > 255 {
        return Err(AppError::Validation(
            "Filename must be at most 255 characters".into(),
        ));
    }
    Ok(trimmed)
}

/// Extension of a validated filename, without the dot. Empty when absent.
pub fn extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}

/// Whether the filename maps to an `image/*` MIME type.
pub fn is_image(filename: &str) -> bool {
    mime_guess::from_path(filename)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE)
}

pub fn require_image(filename: &str) -> Result<(), AppError> {
    if is_image(filename) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "'{filename}' is not an image file"
        )))
    }
}

/// Store an uploaded file and return its public URL.
pub async fn store_file(
    state: &AppState,
    key: &StorageKey,
    contents: &[u8],
) -> Result<String, AppError> {
    let key = key.to_string();
    state.files.put(&key, contents).await?;
    Ok(state.config.file_url(&key))
}

/// Remove a previously stored file, given the URL it was published under.
///
/// URLs that do not point into the file store are ignored. Failures are
/// logged and otherwise swallowed.
pub async fn discard_file(state: &AppState, url: &str) {
    let prefix = state.config.file_url("");
    let Some(key) = url.strip_prefix(&prefix) else {
        return;
    };
    if let Err(e) = state.files.delete(key).await {
        tracing::warn!(key, error = %e, "Failed to delete stored file");
    }
}
