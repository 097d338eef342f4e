use super::*;
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};

use crate::protocol::{
    CreateRoomResponse, ErrorBody, MessageResponse, ParticipantsResponse, RemovalRequest,
    RoomCodeRequest,
};

/// JSON-over-HTTP implementation of [`Backend`]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a backend client rooted at `base_url` (trailing `/` is ignored)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and turn non-2xx replies into [`ApiError::Status`]
    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout)
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // The error body is optional and may not even be JSON
        let message = response
            .bytes()
            .await
            .ok()
            .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok())
            .and_then(|body| body.message);

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Decode a JSON body; an empty or `null` body yields `T::default()`
    async fn read_json<T: DeserializeOwned + Default>(response: Response) -> ApiResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        serde_json::from_slice::<Option<T>>(&bytes)
            .map(Option::unwrap_or_default)
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let response = self.send(self.client.get(self.url(path)).query(query)).await?;
        Self::read_json(response).await
    }

    /// POST whose reply is informational (`{message}` and the like).
    ///
    /// The status decides success; a success body that is not the expected
    /// JSON yields `T::default()` instead of failing an accepted request.
    async fn post_lenient<B: Serialize + ?Sized, T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(self.client.post(self.url(path)).json(body))
            .await?;
        match Self::read_json(response).await {
            Err(ApiError::Parse(e)) => {
                tracing::debug!("Ignoring unexpected success body from {}: {}", path, e);
                Ok(T::default())
            }
            other => other,
        }
    }

    /// POST where only the status matters; the body is not inspected
    async fn post_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        self.send(self.client.post(self.url(path)).json(body))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_room(&self) -> ApiResult<RoomCode> {
        let response = self
            .send(self.client.post(self.url("/rooms/create")))
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body: CreateRoomResponse =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(body.room_code)
    }

    async fn join_room(&self, room_code: &str) -> ApiResult<()> {
        self.post_ack(
            "/rooms/join",
            &RoomCodeRequest {
                room_code: room_code.to_string(),
            },
        )
        .await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<()> {
        self.post_ack("/participants/register", request).await
    }

    async fn resend_verification(
        &self,
        request: &ResendVerificationRequest,
    ) -> ApiResult<Option<String>> {
        let body: MessageResponse = self
            .post_lenient("/participants/resend-verification", request)
            .await?;
        Ok(body.message)
    }

    async fn fetch_verified_participants(&self, room_code: &str) -> ApiResult<Vec<Participant>> {
        let body: ParticipantsResponse = self
            .get_json("/participants/verified/all", &[("roomCode", room_code)])
            .await?;
        Ok(body.participants)
    }

    async fn fetch_draw_state(&self, room_code: &str) -> ApiResult<DrawState> {
        self.get_json("/draw/state", &[("roomCode", room_code)])
            .await
    }

    async fn run_draw(&self, room_code: &str) -> ApiResult<DrawResponse> {
        self.post_lenient(
            "/draw",
            &RoomCodeRequest {
                room_code: room_code.to_string(),
            },
        )
        .await
    }

    async fn resend_draw_notification(&self, room_code: &str) -> ApiResult<Option<String>> {
        let body: MessageResponse = self
            .post_lenient(
                "/draw/resend",
                &RoomCodeRequest {
                    room_code: room_code.to_string(),
                },
            )
            .await?;
        Ok(body.message)
    }

    async fn verify_token(&self, token: &str, participant_id: &str) -> ApiResult<VerifyResponse> {
        self.get_json(
            "/participants/verify",
            &[("token", token), ("id", participant_id)],
        )
        .await
    }

    async fn confirm_delete(&self, token: &str, participant_id: &str) -> ApiResult<()> {
        self.send(
            self.client
                .get(self.url("/participants/confirm-delete"))
                .query(&[("token", token), ("id", participant_id)]),
        )
        .await
        .map(|_| ())
    }

    async fn request_removal(&self, participant_id: &str) -> ApiResult<()> {
        self.post_ack(
            "/participants/request-delete",
            &RemovalRequest {
                participant_id: participant_id.to_string(),
            },
        )
        .await
    }
}
