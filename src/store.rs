//! Room Snapshot Store: the single owner of a room's last-known server truth.
//!
//! Writers never patch fields. A refresh takes a [`FetchTicket`] before it
//! issues its reads and hands the finished snapshot back with that ticket;
//! snapshots whose reads were issued before the currently held one are
//! discarded, so an older response can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::draw::DrawPhase;
use crate::types::{RoomCode, RoomSnapshot};

/// Issue-order stamp of one fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

struct StoreInner {
    room_code: RoomCode,
    snapshot: watch::Sender<RoomSnapshot>,
    next_ticket: AtomicU64,
    /// Ticket of the write backing the held snapshot
    held_ticket: AtomicU64,
}

/// Holder of one room's [`RoomSnapshot`], shared by handle.
///
/// One store exists per room session; cloning shares it.
#[derive(Clone)]
pub struct RoomSnapshotStore {
    inner: Arc<StoreInner>,
}

impl RoomSnapshotStore {
    /// Create a store holding an empty, not-yet-loaded snapshot for `room_code`
    pub fn new(room_code: impl Into<RoomCode>) -> Self {
        let room_code = room_code.into();
        let (tx, _rx) = watch::channel(RoomSnapshot::empty(room_code.clone()));
        Self {
            inner: Arc::new(StoreInner {
                room_code,
                snapshot: tx,
                next_ticket: AtomicU64::new(0),
                held_ticket: AtomicU64::new(0),
            }),
        }
    }

    pub fn room_code(&self) -> &str {
        &self.inner.room_code
    }

    /// Latest snapshot
    pub fn current(&self) -> RoomSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver notified on every change of the held snapshot
    pub fn subscribe(&self) -> watch::Receiver<RoomSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Stamp a fetch cycle before issuing its requests
    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket(self.inner.next_ticket.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Replace the held snapshot wholesale.
    ///
    /// Returns `false` without touching the store when the snapshot belongs to
    /// another room or its reads were issued before those backing the held
    /// snapshot. Otherwise the later completion wins: completion order decides
    /// whenever it agrees with issue order, and a reply issued earlier is never
    /// fresher than the one held. Readers never observe a half-applied
    /// snapshot: the check and the swap happen under the channel's write lock.
    pub fn replace(&self, ticket: FetchTicket, mut snapshot: RoomSnapshot) -> bool {
        if snapshot.room_code != self.inner.room_code {
            tracing::warn!(
                "Refusing snapshot for room {} in store for room {}",
                snapshot.room_code,
                self.inner.room_code
            );
            return false;
        }

        let mut applied = false;
        self.inner.snapshot.send_if_modified(|held| {
            let held_ticket = self.inner.held_ticket.load(Ordering::Acquire);
            if ticket.0 < held_ticket {
                tracing::debug!(
                    "Discarding snapshot for room {} (ticket {} older than held {})",
                    self.inner.room_code,
                    ticket.0,
                    held_ticket
                );
                return false;
            }

            // A completed draw is only valid for the count it was computed against
            snapshot.draw = snapshot.draw.observe_count(snapshot.verified_count());
            if held.draw.is_completed() && !snapshot.draw.is_completed() {
                tracing::info!(
                    "Draw for room {} is stale: {} verified participants now",
                    self.inner.room_code,
                    snapshot.verified_count()
                );
            }

            self.inner.held_ticket.store(ticket.0, Ordering::Release);
            applied = true;
            let changed = *held != snapshot;
            *held = snapshot;
            changed
        });
        applied
    }

    /// Record a draw the backend just accepted, ahead of the confirming refresh.
    ///
    /// Consumes a ticket so that reads issued before the draw cannot roll the
    /// room back to its pre-draw state.
    pub fn record_draw_completed(&self, last_count: u32) {
        let ticket = self.begin_fetch();
        self.inner.snapshot.send_modify(|held| {
            self.inner.held_ticket.store(ticket.0, Ordering::Release);
            held.draw = DrawPhase::Completed { last_count }.observe_count(held.verified_count());
        });
    }
}
