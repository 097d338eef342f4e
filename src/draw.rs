//! Draw Lifecycle Controller

use std::sync::Arc;

use crate::backend::Backend;
use crate::confirm::ConfirmationClient;
use crate::error::{RoomError, RoomResult};
use crate::flag::InFlight;
use crate::poller::Refresher;
use crate::store::RoomSnapshotStore;
use crate::types::{DrawState, Notice};

/// Fewest verified participants a draw may be requested for
pub const MIN_PARTICIPANTS: usize = 3;

/// Where a room's draw stands relative to its current roster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPhase {
    /// No draw has been run
    NotRun,
    /// A draw ran against exactly the current verified count
    Completed { last_count: u32 },
    /// A draw ran, but the verified count has moved since
    Stale { last_count: u32 },
}

impl DrawPhase {
    /// Derive the phase from the backend's draw state and the verified count
    pub fn reconcile(state: DrawState, verified_count: usize) -> Self {
        if !state.has_draw_run {
            return DrawPhase::NotRun;
        }
        DrawPhase::Completed {
            last_count: state.last_count,
        }
        .observe_count(verified_count)
    }

    /// Completed → Stale as soon as the count diverges; other phases are kept
    pub fn observe_count(self, verified_count: usize) -> Self {
        match self {
            DrawPhase::Completed { last_count } if last_count as usize != verified_count => {
                DrawPhase::Stale { last_count }
            }
            other => other,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DrawPhase::Completed { .. })
    }

    /// Count recorded by the last draw, if one ever ran
    pub fn last_count(&self) -> Option<u32> {
        match self {
            DrawPhase::NotRun => None,
            DrawPhase::Completed { last_count } | DrawPhase::Stale { last_count } => {
                Some(*last_count)
            }
        }
    }

    /// Wire form; a stale draw reports `has_draw_run = false`
    pub fn to_wire(&self) -> DrawState {
        DrawState {
            has_draw_run: self.is_completed(),
            last_count: self.last_count().unwrap_or(0),
        }
    }
}

/// Whether a new draw may be requested.
///
/// Needs at least [`MIN_PARTICIPANTS`] verified participants and no draw that
/// is still valid for the current count. Stale counts as not run.
pub fn draw_available(phase: &DrawPhase, verified_count: usize) -> bool {
    if verified_count < MIN_PARTICIPANTS {
        return false;
    }
    match phase {
        DrawPhase::Completed { last_count } => *last_count as usize != verified_count,
        DrawPhase::NotRun | DrawPhase::Stale { .. } => true,
    }
}

/// Runs draws and re-sends draw notifications for one room
#[derive(Clone)]
pub struct DrawController {
    backend: Arc<dyn Backend>,
    confirmations: ConfirmationClient,
    store: RoomSnapshotStore,
    refresher: Refresher,
    drawing: InFlight,
    resending: InFlight,
}

impl DrawController {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: RoomSnapshotStore,
        refresher: Refresher,
    ) -> Self {
        Self {
            confirmations: ConfirmationClient::new(backend.clone()),
            backend,
            store,
            refresher,
            drawing: InFlight::new(),
            resending: InFlight::new(),
        }
    }

    pub fn phase(&self) -> DrawPhase {
        self.store.current().draw
    }

    /// The single flag the draw control is bound to
    pub fn is_available(&self) -> bool {
        !self.drawing.is_active() && self.store.current().draw_available()
    }

    /// Whether the resend-notification control is enabled
    pub fn can_resend(&self) -> bool {
        !self.resending.is_active() && self.phase().is_completed()
    }

    /// Request a draw for the room.
    ///
    /// Never issued while the draw is unavailable. On success the draw is
    /// recorded as completed against the count the backend reports (or the
    /// local verified count when it reports none) and a refresh is forced.
    /// On failure nothing changes.
    pub async fn run_draw(&self) -> RoomResult<Notice> {
        let snapshot = self.store.current();
        if !snapshot.draw_available() {
            return Err(RoomError::Disabled("draw is not available"));
        }
        let _guard = self
            .drawing
            .try_begin()
            .ok_or(RoomError::Disabled("a draw is already in progress"))?;

        let room_code = self.store.room_code();
        let response = match self.backend.run_draw(room_code).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Draw for room {} failed: {}", room_code, e);
                return Err(RoomError::Request(e));
            }
        };

        let last_count = response
            .last_count
            .unwrap_or(snapshot.verified_count() as u32);
        self.store.record_draw_completed(last_count);
        tracing::info!(
            "Draw completed for room {} with {} participants",
            room_code,
            last_count
        );

        self.refresher.refresh().await;

        Ok(Notice::success(
            response
                .message
                .unwrap_or_else(|| "Draw complete".to_string()),
        ))
    }

    /// Ask the backend to mail the assignments of the completed draw again.
    ///
    /// No state changes; the control is only disabled while one request is
    /// outstanding, so repeated calls are allowed.
    pub async fn resend_notification(&self) -> RoomResult<Notice> {
        if !self.phase().is_completed() {
            return Err(RoomError::Disabled("no completed draw to resend"));
        }
        let _guard = self
            .resending
            .try_begin()
            .ok_or(RoomError::Disabled("a resend is already in progress"))?;

        let message = self
            .confirmations
            .resend_draw(self.store.room_code())
            .await?;
        Ok(Notice::success(
            message.unwrap_or_else(|| "Draw emails resent".to_string()),
        ))
    }
}
