use serde::{Deserialize, Serialize};

use crate::draw::DrawPhase;

/// Opaque ID types for type safety
pub type RoomCode = String;
pub type ParticipantId = String;

/// A registered member of a room.
///
/// Identity is `id`, assigned by the backend. Entries of the verified roster
/// arrive without a `verified` field, so it defaults to `true` there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    #[serde(rename = "_id", alias = "id")]
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_verified")]
    pub verified: bool,
}

fn default_verified() -> bool {
    true
}

/// Draw status as reported by the backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DrawState {
    pub has_draw_run: bool,
    /// Verified-participant count the last successful draw was computed against
    pub last_count: u32,
}

/// Last-known server truth for one room.
///
/// Only [`crate::store::RoomSnapshotStore`] hands these out; a snapshot is always
/// built from a single fetch cycle and never patched afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_code: RoomCode,
    /// Server insertion order, no duplicate ids
    pub participants: Vec<Participant>,
    pub draw: DrawPhase,
    /// False until the first successful refresh
    pub loaded: bool,
}

impl RoomSnapshot {
    /// Placeholder held before the first refresh completes
    pub fn empty(room_code: impl Into<RoomCode>) -> Self {
        Self {
            room_code: room_code.into(),
            participants: Vec::new(),
            draw: DrawPhase::NotRun,
            loaded: false,
        }
    }

    /// Build a snapshot from one roster fetch and one draw-state fetch.
    ///
    /// Duplicate ids keep their first occurrence. The draw phase is reconciled
    /// against the deduplicated verified count, so a draw whose `last_count`
    /// no longer matches comes out as [`DrawPhase::Stale`].
    pub fn from_server(
        room_code: impl Into<RoomCode>,
        participants: Vec<Participant>,
        draw_state: DrawState,
    ) -> Self {
        let mut roster: Vec<Participant> = Vec::with_capacity(participants.len());
        for participant in participants {
            if roster.iter().any(|p| p.id == participant.id) {
                tracing::debug!("Dropping duplicate participant id {}", participant.id);
                continue;
            }
            roster.push(participant);
        }

        let verified = roster.iter().filter(|p| p.verified).count();
        Self {
            room_code: room_code.into(),
            participants: roster,
            draw: DrawPhase::reconcile(draw_state, verified),
            loaded: true,
        }
    }

    pub fn verified_count(&self) -> usize {
        self.participants.iter().filter(|p| p.verified).count()
    }

    /// Draw state as the backend would describe this snapshot
    pub fn draw_state(&self) -> DrawState {
        self.draw.to_wire()
    }

    pub fn draw_available(&self) -> bool {
        crate::draw::draw_available(&self.draw, self.verified_count())
    }
}

/// Where the presentation layer should go next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Home,
    Room(RoomCode),
}

impl Navigation {
    /// Route path as used by the web frontend
    pub fn path(&self) -> String {
        match self {
            Navigation::Home => "/".to_string(),
            Navigation::Room(code) => format!("/room/{}", code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-visible message, handed to whatever notification surface is in use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
