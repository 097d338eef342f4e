use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{RoomError, RoomResult};
use crate::flag::InFlight;
use crate::types::{Navigation, Notice, RoomCode};

/// Entry point before a room is chosen: create a room or join one by code
#[derive(Clone)]
pub struct Lobby {
    backend: Arc<dyn Backend>,
    creating: InFlight,
}

/// Normalize a typed room code: surrounding whitespace dropped, upper-cased
pub fn normalize_room_code(code: &str) -> RoomCode {
    code.trim().to_uppercase()
}

impl Lobby {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            creating: InFlight::new(),
        }
    }

    pub fn is_creating(&self) -> bool {
        self.creating.is_active()
    }

    /// Create a room; navigates into it on success
    pub async fn create_room(&self) -> RoomResult<(Navigation, Notice)> {
        let _guard = self
            .creating
            .try_begin()
            .ok_or(RoomError::Disabled("room creation already in progress"))?;

        let code = self.backend.create_room().await.map_err(|e| {
            tracing::error!("Create room failed: {}", e);
            RoomError::Request(e)
        })?;
        tracing::info!("Created room {}", code);

        let notice = Notice::success(format!("Room created: {}", code));
        Ok((Navigation::Room(code), notice))
    }

    /// Check that a room exists and navigate into it
    pub async fn join_room(&self, code: &str) -> RoomResult<Navigation> {
        let code = normalize_room_code(code);
        if code.is_empty() {
            return Err(RoomError::Validation("Enter room code".to_string()));
        }

        self.backend.join_room(&code).await.map_err(|e| {
            tracing::error!("Join room {} failed: {}", code, e);
            RoomError::Request(e)
        })?;

        Ok(Navigation::Room(code))
    }
}
