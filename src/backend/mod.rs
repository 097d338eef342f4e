mod http;

use async_trait::async_trait;
use std::time::Duration;

use crate::protocol::{
    DrawResponse, RegisterRequest, ResendVerificationRequest, VerifyResponse,
};
use crate::types::{DrawState, Participant, RoomCode};

pub use http::HttpBackend;

/// Result type for backend calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur while talking to the room backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("backend returned status {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Status {
        status: u16,
        /// `message` field of the error body, when the backend sent one
        message: Option<String>,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("response parsing failed: {0}")]
    Parse(String),
}

impl ApiError {
    /// Message the backend attached to a rejection, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Contract of the remote room service.
///
/// Token validation, the draw algorithm, storage and mail delivery all live
/// behind this trait; the client only sees success or failure.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Create a room and return its code
    async fn create_room(&self) -> ApiResult<RoomCode>;

    /// Check that a room exists
    async fn join_room(&self, room_code: &str) -> ApiResult<()>;

    /// Register a new, unverified participant; the backend mails a verify link
    async fn register(&self, request: &RegisterRequest) -> ApiResult<()>;

    /// Ask the backend to send the verify link again
    async fn resend_verification(
        &self,
        request: &ResendVerificationRequest,
    ) -> ApiResult<Option<String>>;

    /// Verified roster of a room, in server insertion order
    async fn fetch_verified_participants(&self, room_code: &str) -> ApiResult<Vec<Participant>>;

    async fn fetch_draw_state(&self, room_code: &str) -> ApiResult<DrawState>;

    async fn run_draw(&self, room_code: &str) -> ApiResult<DrawResponse>;

    /// Re-send the assignment emails of the last completed draw
    async fn resend_draw_notification(&self, room_code: &str) -> ApiResult<Option<String>>;

    /// Redeem a verify token
    async fn verify_token(&self, token: &str, participant_id: &str) -> ApiResult<VerifyResponse>;

    /// Redeem a delete token, removing the participant
    async fn confirm_delete(&self, token: &str, participant_id: &str) -> ApiResult<()>;

    /// Ask the backend to mail a delete-confirmation link to a participant
    async fn request_removal(&self, participant_id: &str) -> ApiResult<()>;
}
