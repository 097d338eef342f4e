use std::sync::Arc;
use tokio::sync::watch;

use crate::backend::Backend;
use crate::config::ClientConfig;
use crate::draw::DrawController;
use crate::membership::MembershipFlow;
use crate::poller::{Poller, PollerHandle, RefreshOutcome, Refresher};
use crate::store::RoomSnapshotStore;
use crate::types::{RoomCode, RoomSnapshot};

/// Everything a room view needs while it is open.
///
/// Entering a room creates a fresh store and starts its poller; leaving (or
/// dropping the session) stops the poller.
pub struct RoomSession {
    store: RoomSnapshotStore,
    refresher: Refresher,
    draw: DrawController,
    membership: MembershipFlow,
    poller: PollerHandle,
    app_origin: String,
}

impl RoomSession {
    /// Enter `room_code`. Must be called from within a tokio runtime.
    pub fn enter(
        backend: Arc<dyn Backend>,
        config: &ClientConfig,
        room_code: impl Into<RoomCode>,
    ) -> Self {
        let store = RoomSnapshotStore::new(room_code);
        let refresher = Refresher::new(backend.clone(), store.clone());
        let draw = DrawController::new(backend.clone(), store.clone(), refresher.clone());
        let membership = MembershipFlow::new(backend, store.clone(), refresher.clone());
        let poller = Poller::new(refresher.clone(), config.poll_interval).spawn();

        Self {
            store,
            refresher,
            draw,
            membership,
            poller,
            app_origin: config.app_origin.clone(),
        }
    }

    pub fn room_code(&self) -> &str {
        self.store.room_code()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        self.store.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<RoomSnapshot> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &RoomSnapshotStore {
        &self.store
    }

    pub fn draw_available(&self) -> bool {
        self.draw.is_available()
    }

    pub fn draw(&self) -> &DrawController {
        &self.draw
    }

    pub fn membership(&self) -> &MembershipFlow {
        &self.membership
    }

    /// Refresh now instead of waiting for the next poll
    pub async fn refresh(&self) -> RefreshOutcome {
        self.refresher.refresh().await
    }

    /// Shareable link to this room
    pub fn invite_link(&self) -> String {
        format!("{}/room/{}", self.app_origin, self.room_code())
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    /// Leave the room view, stopping the poller
    pub fn leave(mut self) {
        self.poller.stop();
    }
}
