#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for integration tests.
//!
//! Provides a scripted [`MockHttpClient`], a scripted [`ScriptedConnector`]
//! and helpers for building API response bodies.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use room_session_client::model::{AnonymousLoginResponse, RegisterResponse};
use room_session_client::{
    BootstrapError, ConnectError, HttpClient, RoomConnector, RoomParams,
};

// ── MockHttpClient ──────────────────────────────────────────────────

/// One recorded `POST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Option<String>,
}

/// An [`HttpClient`] that replays scripted responses in order and records
/// every request. Running out of script is a transport error.
pub struct MockHttpClient {
    responses: StdMutex<VecDeque<Result<String, BootstrapError>>>,
    pub requests: Arc<StdMutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    pub fn new(
        responses: Vec<Result<String, BootstrapError>>,
    ) -> (Arc<Self>, Arc<StdMutex<Vec<RecordedRequest>>>) {
        let requests = Arc::new(StdMutex::new(Vec::new()));
        let client = Arc::new(Self {
            responses: StdMutex::new(VecDeque::from(responses)),
            requests: Arc::clone(&requests),
        });
        (client, requests)
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(&self, url: &str, body: Option<String>) -> Result<String, BootstrapError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BootstrapError::Transport("script exhausted".into())))
    }
}

// ── ScriptedConnector ───────────────────────────────────────────────

/// Outcome of one scripted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Fail,
    Succeed,
    Hang,
}

/// Handle returned by a successful [`ScriptedConnector`] attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeConnection {
    /// 1-based index of the attempt that produced this handle.
    pub attempt: usize,
    pub auth_token: String,
}

/// A [`RoomConnector`] that follows a script and records each attempt's inputs.
pub struct ScriptedConnector {
    script: StdMutex<VecDeque<Attempt>>,
    pub attempts: Arc<StdMutex<Vec<(String, RoomParams)>>>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Attempt>) -> Self {
        Self {
            script: StdMutex::new(VecDeque::from(script)),
            attempts: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

#[async_trait]
impl RoomConnector for ScriptedConnector {
    type Connection = FakeConnection;

    async fn open(
        &self,
        auth_token: &str,
        params: &RoomParams,
    ) -> Result<FakeConnection, ConnectError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push((auth_token.to_string(), params.clone()));
            attempts.len()
        };
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Attempt::Hang);
        match step {
            Attempt::Succeed => Ok(FakeConnection {
                attempt,
                auth_token: auth_token.to_string(),
            }),
            Attempt::Fail => Err(ConnectError::Transport(format!(
                "attempt {attempt}: connection refused"
            ))),
            Attempt::Hang => std::future::pending().await,
        }
    }
}

// ── JSON helper functions ───────────────────────────────────────────

/// Body of a successful `/register` response.
pub fn register_json(
    user: &str,
    token: &str,
    org: &str,
    world: &str,
    room: &str,
    map: &str,
) -> String {
    serde_json::to_string(&RegisterResponse {
        user_uuid: user.into(),
        auth_token: token.into(),
        organization_slug: org.into(),
        world_slug: world.into(),
        room_slug: room.into(),
        map_url_start: map.into(),
    })
    .expect("register_json serialization")
}

/// Body of a successful `/anonymLogin` response.
pub fn anonymous_login_json(user: &str, token: &str) -> String {
    serde_json::to_string(&AnonymousLoginResponse {
        user_uuid: user.into(),
        auth_token: token.into(),
    })
    .expect("anonymous_login_json serialization")
}
