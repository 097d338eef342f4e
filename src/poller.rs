//! Periodic and forced refresh of a room's snapshot.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::Backend;
use crate::error::RoomError;
use crate::flag::InFlight;
use crate::store::RoomSnapshotStore;
use crate::types::RoomSnapshot;

/// What became of one fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fresh snapshot is now held by the store
    Applied,
    /// The reads finished, but a newer snapshot was already held
    Discarded,
    /// A previous poll cycle was still in flight; nothing was issued
    Skipped,
    /// A read failed; the last good snapshot is kept
    Failed(RoomError),
}

/// Reads roster and draw state for one room and feeds them to its store
#[derive(Clone)]
pub struct Refresher {
    backend: Arc<dyn Backend>,
    store: RoomSnapshotStore,
    polling: InFlight,
}

impl Refresher {
    pub fn new(backend: Arc<dyn Backend>, store: RoomSnapshotStore) -> Self {
        Self {
            backend,
            store,
            polling: InFlight::new(),
        }
    }

    pub fn store(&self) -> &RoomSnapshotStore {
        &self.store
    }

    /// One background poll cycle, skipped while the previous one is in flight
    pub async fn poll_cycle(&self) -> RefreshOutcome {
        let Some(_guard) = self.polling.try_begin() else {
            tracing::debug!(
                "Skipping poll for room {}: previous cycle still in flight",
                self.store.room_code()
            );
            return RefreshOutcome::Skipped;
        };
        self.fetch_cycle().await
    }

    /// Refresh right away, regardless of the poll schedule.
    ///
    /// Used after local mutations. Runs alongside any background cycle; the
    /// store keeps whichever snapshot was issued last.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.fetch_cycle().await
    }

    async fn fetch_cycle(&self) -> RefreshOutcome {
        let room_code = self.store.room_code();
        let ticket = self.store.begin_fetch();

        let (participants, draw_state) = futures::future::join(
            self.backend.fetch_verified_participants(room_code),
            self.backend.fetch_draw_state(room_code),
        )
        .await;

        // Either read failing discards the whole cycle; halves are never mixed
        let (participants, draw_state) = match (participants, draw_state) {
            (Ok(participants), Ok(draw_state)) => (participants, draw_state),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Refresh of room {} failed: {}", room_code, e);
                return RefreshOutcome::Failed(RoomError::Read(e));
            }
        };

        let snapshot = RoomSnapshot::from_server(room_code, participants, draw_state);
        tracing::debug!(
            "Fetched room {}: {} verified, draw {:?}",
            room_code,
            snapshot.verified_count(),
            snapshot.draw
        );

        if self.store.replace(ticket, snapshot) {
            RefreshOutcome::Applied
        } else {
            RefreshOutcome::Discarded
        }
    }
}

/// Fixed-interval driver of [`Refresher::poll_cycle`]
pub struct Poller {
    refresher: Refresher,
    interval: Duration,
}

impl Poller {
    pub fn new(refresher: Refresher, interval: Duration) -> Self {
        Self {
            refresher,
            interval,
        }
    }

    /// Start polling. The first cycle runs immediately (the initial load).
    pub fn spawn(self) -> PollerHandle {
        let room_code = self.refresher.store().room_code().to_string();
        tracing::info!(
            "Polling room {} every {:?}",
            room_code,
            self.interval
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // A cycle that outlives the interval swallows the ticks it covered
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                self.refresher.poll_cycle().await;
            }
        });

        PollerHandle {
            room_code,
            task: Some(task),
        }
    }
}

/// Owner of a running poller. Stopping or dropping it cancels the timer and
/// any in-flight reads.
pub struct PollerHandle {
    room_code: String,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("Stopped polling room {}", self.room_code);
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
