//! Registration & Membership Flow
//!
//! Every call here goes to the backend first; local state only moves through
//! the forced refresh that follows a successful mutation.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{RoomError, RoomResult};
use crate::flag::InFlight;
use crate::poller::Refresher;
use crate::protocol::{RegisterRequest, ResendVerificationRequest};
use crate::store::RoomSnapshotStore;
use crate::types::Notice;

/// Accepted registration, returned so the caller can clear its form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub notice: Notice,
}

#[derive(Clone)]
pub struct MembershipFlow {
    backend: Arc<dyn Backend>,
    store: RoomSnapshotStore,
    refresher: Refresher,
    resending: InFlight,
    removing: InFlight,
}

impl MembershipFlow {
    pub fn new(backend: Arc<dyn Backend>, store: RoomSnapshotStore, refresher: Refresher) -> Self {
        Self {
            backend,
            store,
            refresher,
            resending: InFlight::new(),
            removing: InFlight::new(),
        }
    }

    /// Register a participant in this room.
    ///
    /// The new participant stays off the verified roster until their verify
    /// link is redeemed; the forced refresh still picks up any roster change
    /// that happened meanwhile.
    pub async fn register(&self, name: &str, email: &str) -> RoomResult<Registration> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(RoomError::Validation("Enter name & email".to_string()));
        }

        let request = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            room_code: self.store.room_code().to_string(),
        };
        if let Err(e) = self.backend.register(&request).await {
            tracing::warn!("Registration in room {} failed: {}", request.room_code, e);
            return Err(RoomError::Request(e));
        }
        tracing::info!("Registered {} in room {}", request.email, request.room_code);

        self.refresher.refresh().await;

        Ok(Registration {
            name: request.name,
            email: request.email,
            notice: Notice::success("Verification email sent!"),
        })
    }

    pub fn is_resending(&self) -> bool {
        self.resending.is_active()
    }

    /// Send the verify link again. Only guarded against re-entry.
    pub async fn resend_verification(&self, email: &str, name: Option<&str>) -> RoomResult<Notice> {
        let email = email.trim();
        if email.is_empty() {
            return Err(RoomError::Validation("Enter email".to_string()));
        }
        let _guard = self
            .resending
            .try_begin()
            .ok_or(RoomError::Disabled("verification resend already in progress"))?;

        let request = ResendVerificationRequest {
            email: email.to_string(),
            room_code: self.store.room_code().to_string(),
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        };
        let message = self
            .backend
            .resend_verification(&request)
            .await
            .map_err(|e| {
                tracing::warn!("Resending verification to {} failed: {}", request.email, e);
                RoomError::Request(e)
            })?;

        Ok(Notice::success(
            message.unwrap_or_else(|| "Verification email resent".to_string()),
        ))
    }

    /// Removal is never offered once a valid draw exists
    pub fn removal_available(&self) -> bool {
        !self.removing.is_active() && !self.store.current().draw.is_completed()
    }

    /// Ask the backend to mail a delete-confirmation link to a participant.
    ///
    /// The participant only leaves the room once that link is redeemed.
    pub async fn request_removal(&self, participant_id: &str) -> RoomResult<Notice> {
        if participant_id.trim().is_empty() {
            return Err(RoomError::Validation("Missing participant".to_string()));
        }
        if self.store.current().draw.is_completed() {
            return Err(RoomError::Disabled(
                "participants cannot be removed after the draw",
            ));
        }
        let _guard = self
            .removing
            .try_begin()
            .ok_or(RoomError::Disabled("a removal request is already in progress"))?;

        if let Err(e) = self.backend.request_removal(participant_id).await {
            tracing::warn!("Removal request for {} failed: {}", participant_id, e);
            return Err(RoomError::Request(e));
        }

        self.refresher.refresh().await;

        Ok(Notice::success("Removal confirmation email sent"))
    }
}
