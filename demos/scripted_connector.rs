//! # Scripted Connector Example
//!
//! Shows how to implement [`RoomConnector`] for an in-process fake room
//! server and watch the establisher retry through failures. Useful for:
//!
//! - **Testing**: exercise reconnect handling without a real server
//! - **Custom backends**: adapt any transport (QUIC, WebRTC, TCP)
//!
//! ## Running
//!
//! ```sh
//! RUST_LOG=debug cargo run --example scripted_connector
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use room_session_client::{
    CancelToken, ConnectError, ConnectionEstablisher, LocalUser, RetryPolicy, RoomConnector,
    RoomParams,
};

// ─────────────────────────────────────────────────────────────────────
// Step 1: A connector whose server is down for the first few attempts
// ─────────────────────────────────────────────────────────────────────

/// Refuses the first `failures` attempts, then accepts.
struct FlakyConnector {
    failures: u32,
    attempts: AtomicU32,
}

/// What a successful attempt hands back.
#[derive(Debug)]
struct FakeRoom {
    room_id: String,
    attempt: u32,
}

#[async_trait]
impl RoomConnector for FlakyConnector {
    type Connection = FakeRoom;

    async fn open(&self, auth_token: &str, params: &RoomParams) -> Result<FakeRoom, ConnectError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(attempt, token = auth_token, "fake server: handshake");
        if attempt <= self.failures {
            return Err(ConnectError::Transport("fake server is restarting".into()));
        }
        Ok(FakeRoom {
            room_id: params.room_id.clone(),
            attempt,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: Drive it with a short retry window
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let connector = FlakyConnector {
        failures: 3,
        attempts: AtomicU32::new(0),
    };
    // Shrink the 4–6s production window so the demo finishes quickly.
    let establisher = ConnectionEstablisher::new(
        RetryPolicy::default()
            .with_base_delay(Duration::from_millis(200))
            .with_jitter(Duration::from_millis(100)),
    );

    let room = establisher
        .connect(
            &connector,
            &LocalUser::benchmark(),
            &RoomParams::new("demo-room", "Scripted"),
            &CancelToken::new(),
        )
        .await?;

    tracing::info!("Done: joined {} on attempt {}", room.room_id, room.attempt);
    Ok(())
}
