//! In-memory stand-in for the room backend

#![allow(dead_code)]

use async_trait::async_trait;
use santa_room::backend::{ApiError, ApiResult, Backend};
use santa_room::protocol::{
    DrawResponse, RegisterRequest, ResendVerificationRequest, VerifyResponse,
};
use santa_room::types::{DrawState, Participant, RoomCode};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const ROOM: &str = "XMAS1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Verify,
    Delete,
}

#[derive(Default)]
struct FakeState {
    participants: Vec<Participant>,
    draw: DrawState,
    /// token -> (kind, participant id); removed on first redemption
    tokens: HashMap<String, (TokenKind, String)>,
    next_id: usize,
    calls: Vec<&'static str>,
    fail_reads: bool,
    fail_draw: bool,
    verify_omits_room: bool,
    draw_resends: usize,
    /// Delays handed out to successive roster fetches
    roster_delays: VecDeque<Duration>,
}

fn rejected(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: Some(message.to_string()),
    }
}

pub struct FakeBackend {
    state: Mutex<FakeState>,
    roster_in_flight: AtomicUsize,
    max_roster_in_flight: AtomicUsize,
}

impl FakeBackend {
    /// A room whose verified roster holds `names`
    pub fn with_verified(names: &[&str]) -> Self {
        let backend = Self {
            state: Mutex::new(FakeState::default()),
            roster_in_flight: AtomicUsize::new(0),
            max_roster_in_flight: AtomicUsize::new(0),
        };
        for name in names {
            backend.add_participant(name, true);
        }
        backend
    }

    fn add_participant(&self, name: &str, verified: bool) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("p{}", state.next_id);
        state.participants.push(Participant {
            id: id.clone(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            verified,
        });
        id
    }

    /// Id of the participant registered under `email`
    pub fn id_of(&self, email: &str) -> String {
        let state = self.state.lock().unwrap();
        state
            .participants
            .iter()
            .find(|p| p.email == email)
            .map(|p| p.id.clone())
            .expect("participant registered")
    }

    /// Token the backend would have mailed for verifying `id`
    pub fn verify_token_for(&self, id: &str) -> String {
        format!("verify-{}", id)
    }

    /// Token the backend would have mailed for deleting `id`
    pub fn delete_token_for(&self, id: &str) -> String {
        format!("delete-{}", id)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn set_fail_draw(&self, fail: bool) {
        self.state.lock().unwrap().fail_draw = fail;
    }

    pub fn set_verify_omits_room(&self, omit: bool) {
        self.state.lock().unwrap().verify_omits_room = omit;
    }

    pub fn push_roster_delay(&self, delay: Duration) {
        self.state.lock().unwrap().roster_delays.push_back(delay);
    }

    pub fn draw_state(&self) -> DrawState {
        self.state.lock().unwrap().draw
    }

    pub fn draw_resends(&self) -> usize {
        self.state.lock().unwrap().draw_resends
    }

    pub fn roster_in_flight(&self) -> usize {
        self.roster_in_flight.load(Ordering::SeqCst)
    }

    pub fn max_roster_in_flight(&self) -> usize {
        self.max_roster_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: &'static str) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn verified_count(state: &FakeState) -> u32 {
        state.participants.iter().filter(|p| p.verified).count() as u32
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn create_room(&self) -> ApiResult<RoomCode> {
        self.record("create_room");
        Ok(ROOM.to_string())
    }

    async fn join_room(&self, room_code: &str) -> ApiResult<()> {
        self.record("join_room");
        if room_code == ROOM {
            Ok(())
        } else {
            Err(rejected(404, "Room not found"))
        }
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<()> {
        self.record("register");
        {
            let state = self.state.lock().unwrap();
            if state.participants.iter().any(|p| p.email == request.email) {
                return Err(rejected(409, "Email already registered"));
            }
        }
        let id = self.add_participant(&request.name, false);
        let mut state = self.state.lock().unwrap();
        let email = request.email.clone();
        if let Some(p) = state.participants.iter_mut().find(|p| p.id == id) {
            p.email = email;
        }
        state
            .tokens
            .insert(format!("verify-{}", id), (TokenKind::Verify, id));
        Ok(())
    }

    async fn resend_verification(
        &self,
        _request: &ResendVerificationRequest,
    ) -> ApiResult<Option<String>> {
        self.record("resend_verification");
        Ok(Some("Verification email resent".to_string()))
    }

    async fn fetch_verified_participants(&self, _room_code: &str) -> ApiResult<Vec<Participant>> {
        self.record("fetch_participants");
        // Capture at issue time so a delayed reply carries old data
        let (roster, fail, delay) = {
            let mut state = self.state.lock().unwrap();
            let roster: Vec<Participant> = state
                .participants
                .iter()
                .filter(|p| p.verified)
                .cloned()
                .collect();
            let delay = state.roster_delays.pop_front().unwrap_or_default();
            (roster, state.fail_reads, delay)
        };

        let now = self.roster_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_roster_in_flight.fetch_max(now, Ordering::SeqCst);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.roster_in_flight.fetch_sub(1, Ordering::SeqCst);

        if fail {
            Err(rejected(500, "database unavailable"))
        } else {
            Ok(roster)
        }
    }

    async fn fetch_draw_state(&self, _room_code: &str) -> ApiResult<DrawState> {
        self.record("fetch_draw_state");
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            Err(ApiError::Transport("connection reset".to_string()))
        } else {
            Ok(state.draw)
        }
    }

    async fn run_draw(&self, _room_code: &str) -> ApiResult<DrawResponse> {
        self.record("run_draw");
        let mut state = self.state.lock().unwrap();
        if state.fail_draw {
            return Err(rejected(500, "Mail server down"));
        }
        let count = Self::verified_count(&state);
        if count < 3 {
            return Err(rejected(400, "Need at least 3 verified participants"));
        }
        if state.draw.has_draw_run && state.draw.last_count == count {
            return Err(rejected(400, "Draw already completed"));
        }
        state.draw = DrawState {
            has_draw_run: true,
            last_count: count,
        };
        Ok(DrawResponse {
            message: Some("Secret Santa draw complete!".to_string()),
            last_count: None,
        })
    }

    async fn resend_draw_notification(&self, _room_code: &str) -> ApiResult<Option<String>> {
        self.record("resend_draw");
        let mut state = self.state.lock().unwrap();
        if !state.draw.has_draw_run {
            return Err(rejected(400, "No completed draw"));
        }
        state.draw_resends += 1;
        Ok(Some("Assignments resent".to_string()))
    }

    async fn verify_token(&self, token: &str, participant_id: &str) -> ApiResult<VerifyResponse> {
        self.record("verify_token");
        let mut state = self.state.lock().unwrap();
        match state.tokens.get(token) {
            Some((TokenKind::Verify, id)) if id == participant_id => {}
            _ => return Err(rejected(400, "Invalid or expired link")),
        }
        state.tokens.remove(token);
        if let Some(p) = state
            .participants
            .iter_mut()
            .find(|p| p.id == participant_id)
        {
            p.verified = true;
        }
        let room_code = (!state.verify_omits_room).then(|| ROOM.to_string());
        Ok(VerifyResponse { room_code })
    }

    async fn confirm_delete(&self, token: &str, participant_id: &str) -> ApiResult<()> {
        self.record("confirm_delete");
        let mut state = self.state.lock().unwrap();
        match state.tokens.get(token) {
            Some((TokenKind::Delete, id)) if id == participant_id => {}
            _ => return Err(rejected(400, "Invalid or expired link")),
        }
        state.tokens.remove(token);
        state.participants.retain(|p| p.id != participant_id);
        Ok(())
    }

    async fn request_removal(&self, participant_id: &str) -> ApiResult<()> {
        self.record("request_removal");
        let mut state = self.state.lock().unwrap();
        if !state.participants.iter().any(|p| p.id == participant_id) {
            return Err(rejected(404, "Participant not found"));
        }
        state.tokens.insert(
            format!("delete-{}", participant_id),
            (TokenKind::Delete, participant_id.to_string()),
        );
        Ok(())
    }
}
