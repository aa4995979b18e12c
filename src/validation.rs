//! Request input validation. All checks return `AppError` variants that map
//! to 400 responses; handlers call these before touching the graph.

use crate::errors::{AppError, Result};

/// Upper bound on stored message content, in characters.
pub const MAX_CONTENT_CHARS: usize = 50_000;

/// Upper bound on any caller-supplied result limit.
pub const MAX_LIMIT: usize = 100;

/// User ids are opaque but must be non-empty and restricted to a safe
/// character set so they can appear in logs and lookups verbatim.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() || user_id.len() > 128 {
        return Err(AppError::InvalidUserId(
            "must be 1-128 characters".to_string(),
        ));
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '@' | '.'))
    {
        return Err(AppError::InvalidUserId(
            "only alphanumerics, '-', '_', '@', '.' are allowed".to_string(),
        ));
    }
    Ok(())
}

/// Message content must be non-empty after trimming and bounded in size.
pub fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::InvalidInput {
            field: "content".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::InvalidInput {
            field: "content".to_string(),
            reason: format!("exceeds {MAX_CONTENT_CHARS} characters"),
        });
    }
    Ok(())
}

/// Clamp-checked result limit; zero is rejected rather than silently treated
/// as "no results".
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::InvalidInput {
            field: "limit".to_string(),
            reason: format!("must be between 1 and {MAX_LIMIT}"),
        });
    }
    Ok(())
}
