use std::fmt;

use uuid::Uuid;

use super::error::StorageError;

/// Well-known locations inside the file store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKey {
    UserAvatar { user_id: Uuid, ext: String },
    TeamAvatar { participation_id: i32, ext: String },
    EventMedia { event_id: i32, file_id: Uuid, ext: String },
}

impl StorageKey {
    pub fn user_avatar(user_id: Uuid, ext: &str) -> Self {
        Self::UserAvatar {
            user_id,
            ext: normalize_extension(ext),
        }
    }

    pub fn team_avatar(participation_id: i32, ext: &str) -> Self {
        Self::TeamAvatar {
            participation_id,
            ext: normalize_extension(ext),
        }
    }

    /// A fresh media key; each upload gets its own file.
    pub fn event_media(event_id: i32, ext: &str) -> Self {
        Self::EventMedia {
            event_id,
            file_id: Uuid::now_v7(),
            ext: normalize_extension(ext),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserAvatar { user_id, ext } => write!(f, "avatars/users/{user_id}.{ext}"),
            Self::TeamAvatar {
                participation_id,
                ext,
            } => write!(f, "avatars/participations/{participation_id}.{ext}"),
            Self::EventMedia {
                event_id,
                file_id,
                ext,
            } => write!(f, "media/{event_id}/{file_id}.{ext}"),
        }
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext: String = ext
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(10)
        .collect::<String>()
        .to_ascii_lowercase();
    if ext.is_empty() { "bin".into() } else { ext }
}

/// Validates a storage key: a relative `/`-separated path of plain segments.
pub fn validate_key(key: &str) -> Result<&str, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key cannot be empty"));
    }
    if key.len() > 512 {
        return Err(StorageError::InvalidKey("key exceeds 512 characters"));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey("key must be a relative path"));
    }
    for segment in key.split('/') {
        if segment.is_empty() {
            return Err(StorageError::InvalidKey("key must not contain empty segments"));
        }
        // Covers `..` as well as hidden files.
        if segment.starts_with('.') {
            return Err(StorageError::InvalidKey(
                "key segments must not start with '.'",
            ));
        }
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return Err(StorageError::InvalidKey(
            "key contains invalid characters (allowed: a-zA-Z0-9, /, -, _, .)",
        ));
    }
    Ok(key)
}
