use crate::backend::ApiError;

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;

/// Failures of room operations, grouped by how they reach the user
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// A required field was empty; no request was issued
    #[error("{0}")]
    Validation(String),

    /// A mutating call failed; nothing changed locally
    #[error("request failed: {0}")]
    Request(ApiError),

    /// A background poll or forced refresh failed; the last good snapshot is kept
    #[error("refresh failed: {0}")]
    Read(ApiError),

    /// A confirmation token was expired, invalid or already used
    #[error("confirmation rejected: {0}")]
    Token(ApiError),

    /// The control for this action is currently disabled
    #[error("action unavailable: {0}")]
    Disabled(&'static str),
}

impl RoomError {
    /// Text to show the user: the backend's own message when it sent one,
    /// otherwise `fallback`. Validation errors carry their own text.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            RoomError::Validation(message) => message.clone(),
            RoomError::Request(e) | RoomError::Token(e) => e
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
            RoomError::Read(_) | RoomError::Disabled(_) => fallback.to_string(),
        }
    }

    /// Whether this failure should be shown to the user at all
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, RoomError::Read(_))
    }
}
