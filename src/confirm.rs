use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{RoomError, RoomResult};
use crate::types::RoomCode;

/// Issues token-bearing confirmation requests. Holds no state of its own.
///
/// The backend does not tell expired, invalid and already-used tokens apart,
/// and neither does this client: all of them come back as [`RoomError::Token`].
#[derive(Clone)]
pub struct ConfirmationClient {
    backend: Arc<dyn Backend>,
}

impl ConfirmationClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Redeem a verify token. Returns the room the backend says the
    /// participant belongs to, when it says so.
    pub async fn verify(&self, token: &str, participant_id: &str) -> RoomResult<Option<RoomCode>> {
        match self.backend.verify_token(token, participant_id).await {
            Ok(response) => Ok(response.room_code.filter(|code| !code.trim().is_empty())),
            Err(e) => {
                tracing::warn!("Verify token for participant {} rejected: {}", participant_id, e);
                Err(RoomError::Token(e))
            }
        }
    }

    /// Redeem a delete token, removing the participant from their room
    pub async fn confirm_delete(&self, token: &str, participant_id: &str) -> RoomResult<()> {
        self.backend
            .confirm_delete(token, participant_id)
            .await
            .map_err(|e| {
                tracing::warn!("Delete token for participant {} rejected: {}", participant_id, e);
                RoomError::Token(e)
            })
    }

    /// Ask for the assignment emails of the room's last draw to be sent again
    pub async fn resend_draw(&self, room_code: &str) -> RoomResult<Option<String>> {
        self.backend
            .resend_draw_notification(room_code)
            .await
            .map_err(|e| {
                tracing::warn!("Resending draw emails for room {} failed: {}", room_code, e);
                RoomError::Request(e)
            })
    }
}
