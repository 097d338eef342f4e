//! Confirmation Link Handler
//!
//! Emailed links carry a one-shot token in their query string. A link is
//! redeemed exactly once per page load; a failed redemption is final and a
//! fresh link is needed to try again.

use reqwest::Url;
use std::time::Duration;

use crate::confirm::ConfirmationClient;
use crate::error::{RoomError, RoomResult};
use crate::types::{Navigation, Notice, RoomCode};

/// Delay before navigating away after a successful confirmation
pub const SUCCESS_REDIRECT_DELAY: Duration = Duration::from_millis(1000);
/// Delay before navigating away after a failed confirmation
pub const FAILURE_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Action a confirmation link authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationKind {
    Verify,
    Delete,
    ResendDraw,
}

impl ConfirmationKind {
    /// Kind from the page path: `/verify`, `/delete` or `/draw/resend`
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        if path.ends_with("/draw/resend") {
            Some(ConfirmationKind::ResendDraw)
        } else if path.ends_with("/verify") {
            Some(ConfirmationKind::Verify)
        } else if path.ends_with("/delete") {
            Some(ConfirmationKind::Delete)
        } else {
            None
        }
    }
}

/// Inbound page parameters. Empty values count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkParams {
    pub token: Option<String>,
    /// Subject of the token (the participant id)
    pub id: Option<String>,
    pub room: Option<RoomCode>,
}

impl LinkParams {
    /// Collect parameters from query pairs; the first non-empty value wins
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = LinkParams::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "token" => &mut params.token,
                "id" | "subjectId" => &mut params.id,
                "room" | "roomCode" => &mut params.room,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        params
    }
}

/// A confirmation link awaiting its single redemption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationLink {
    pub kind: ConfirmationKind,
    pub params: LinkParams,
}

impl ConfirmationLink {
    pub fn new(kind: ConfirmationKind, params: LinkParams) -> Self {
        Self { kind, params }
    }

    /// Parse a full link such as `https://host/verify?token=..&id=..&room=..`
    pub fn parse(link: &str) -> RoomResult<Self> {
        let url = Url::parse(link.trim())
            .map_err(|e| RoomError::Validation(format!("Invalid link: {}", e)))?;
        let kind = ConfirmationKind::from_path(url.path()).ok_or_else(|| {
            RoomError::Validation(format!("Not a confirmation link: {}", url.path()))
        })?;
        Ok(Self::new(kind, LinkParams::from_pairs(url.query_pairs())))
    }
}

/// Result of redeeming a link, consumed once by the navigation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    pub kind: ConfirmationKind,
    /// The room the confirmation resolved to, or why it failed
    pub result: RoomResult<Option<RoomCode>>,
    pub notice: Notice,
    pub navigate_to: Navigation,
    pub redirect_after: Duration,
}

impl LinkOutcome {
    fn failed(
        kind: ConfirmationKind,
        error: RoomError,
        message: String,
        navigate_to: Navigation,
    ) -> Self {
        Self {
            kind,
            result: Err(error),
            notice: Notice::error(message),
            navigate_to,
            redirect_after: FAILURE_REDIRECT_DELAY,
        }
    }
}

fn room_or_home(room: Option<&RoomCode>) -> Navigation {
    room.map(|code| Navigation::Room(code.clone()))
        .unwrap_or(Navigation::Home)
}

pub struct ConfirmationLinkHandler {
    client: ConfirmationClient,
}

impl ConfirmationLinkHandler {
    pub fn new(client: ConfirmationClient) -> Self {
        Self { client }
    }

    /// Redeem `link`. Missing `token` or `id` fails without any request.
    pub async fn handle(&self, link: ConfirmationLink) -> LinkOutcome {
        let ConfirmationLink { kind, params } = link;

        let (token, id) = match (params.token.as_deref(), params.id.as_deref()) {
            (Some(token), Some(id)) => (token, id),
            _ => {
                let message = match kind {
                    ConfirmationKind::Verify => "Invalid verification link",
                    ConfirmationKind::Delete => "Invalid delete link",
                    ConfirmationKind::ResendDraw => "Invalid resend link",
                };
                tracing::warn!("{:?} link without token or id", kind);
                return LinkOutcome::failed(
                    kind,
                    RoomError::Validation(message.to_string()),
                    message.to_string(),
                    Navigation::Home,
                );
            }
        };

        match kind {
            ConfirmationKind::Verify => self.verify(token, id, params.room.as_ref()).await,
            ConfirmationKind::Delete => self.delete(token, id, params.room.as_ref()).await,
            ConfirmationKind::ResendDraw => self.resend_draw(params.room.as_ref()).await,
        }
    }

    async fn verify(&self, token: &str, id: &str, url_room: Option<&RoomCode>) -> LinkOutcome {
        let kind = ConfirmationKind::Verify;
        match self.client.verify(token, id).await {
            Ok(backend_room) => {
                let room = backend_room.or_else(|| url_room.cloned());
                tracing::info!("Participant {} verified (room {:?})", id, room);
                LinkOutcome {
                    kind,
                    navigate_to: room_or_home(room.as_ref()),
                    result: Ok(room),
                    notice: Notice::success("Email verified!"),
                    redirect_after: SUCCESS_REDIRECT_DELAY,
                }
            }
            Err(e) => {
                let message = e.user_message("Verification failed");
                LinkOutcome::failed(kind, e, message, Navigation::Home)
            }
        }
    }

    async fn delete(&self, token: &str, id: &str, url_room: Option<&RoomCode>) -> LinkOutcome {
        let kind = ConfirmationKind::Delete;
        match self.client.confirm_delete(token, id).await {
            Ok(()) => {
                tracing::info!("Participant {} removed", id);
                LinkOutcome {
                    kind,
                    result: Ok(url_room.cloned()),
                    notice: Notice::success("You have been removed from the room"),
                    navigate_to: room_or_home(url_room),
                    redirect_after: Duration::ZERO,
                }
            }
            Err(e) => LinkOutcome::failed(
                kind,
                e,
                "Delete failed or expired".to_string(),
                room_or_home(url_room),
            ),
        }
    }

    async fn resend_draw(&self, url_room: Option<&RoomCode>) -> LinkOutcome {
        let kind = ConfirmationKind::ResendDraw;
        let Some(room) = url_room else {
            return LinkOutcome::failed(
                kind,
                RoomError::Validation("Invalid resend link".to_string()),
                "Invalid resend link".to_string(),
                Navigation::Home,
            );
        };

        match self.client.resend_draw(room).await {
            Ok(message) => LinkOutcome {
                kind,
                result: Ok(Some(room.clone())),
                notice: Notice::success(
                    message.unwrap_or_else(|| "Draw emails resent".to_string()),
                ),
                navigate_to: Navigation::Room(room.clone()),
                redirect_after: SUCCESS_REDIRECT_DELAY,
            },
            Err(e) => {
                let message = e.user_message("Resend failed or expired");
                LinkOutcome::failed(kind, e, message, Navigation::Room(room.clone()))
            }
        }
    }
}
