//! # Anonymous Session Example
//!
//! Runs the full client startup against real servers:
//!
//! 1. Bootstrap an anonymous identity from a `/_/` URL path
//! 2. Open a WebSocket room connection, retrying until it succeeds
//! 3. Print incoming frames until Ctrl+C
//!
//! ## Running
//!
//! ```sh
//! API_URL=http://api.workadventure.localhost \
//! PUSHER_URL=ws://pusher.workadventure.localhost \
//! ROOM_PATH=/_/global/maps.workadventure.localhost/Floor0/floor0.json \
//!     cargo run --example anonymous_session
//! ```

use std::sync::Arc;

use room_session_client::{
    CancelToken, ConnectionEstablisher, ConnectionManager, MemoryCredentialStore, PathRouter,
    ReqwestHttpClient, RoomParams, SessionBootstrapper, SessionConfig, WebSocketConnector,
};

/// Room server URL when `PUSHER_URL` is not set.
const DEFAULT_PUSHER_URL: &str = "ws://pusher.workadventure.localhost";

/// Path used when `ROOM_PATH` is not set.
const DEFAULT_ROOM_PATH: &str = "/_/global/maps.workadventure.localhost/Floor0/floor0.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` to see every attempt and backoff.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let pusher_url =
        std::env::var("PUSHER_URL").unwrap_or_else(|_| DEFAULT_PUSHER_URL.to_string());
    let path = std::env::var("ROOM_PATH").unwrap_or_else(|_| DEFAULT_ROOM_PATH.to_string());

    let bootstrapper = SessionBootstrapper::new(
        SessionConfig::from_env(),
        Arc::new(ReqwestHttpClient::new()?),
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(PathRouter::new("http:", path)),
    );
    let mut manager = ConnectionManager::new(
        bootstrapper,
        ConnectionEstablisher::default(),
        WebSocketConnector::new(pusher_url),
    );

    // ── Bootstrap ───────────────────────────────────────────────────
    let room = match manager.init_game_connection().await {
        Ok(room) => room,
        Err(e) => {
            tracing::error!("{} ({e})", e.kind().description());
            return Err(e.into());
        }
    };
    tracing::info!(path = %room.path, map = %room.map_url, "room resolved");

    // ── Connect ─────────────────────────────────────────────────────
    // Ctrl+C cancels a connect that is still retrying.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let params = RoomParams::new(room.path.trim_start_matches('/'), "RustPlayer")
        .with_character_layers(vec!["male1".into()]);
    let mut socket = manager.connect_to_room(&params, &cancel).await?;
    tracing::info!("connected; waiting for frames");

    // ── Frame loop ──────────────────────────────────────────────────
    loop {
        tokio::select! {
            frame = socket.recv() => match frame {
                Some(Ok(bytes)) => tracing::info!(len = bytes.len(), "frame received"),
                Some(Err(e)) => {
                    tracing::warn!("socket error: {e}");
                    break;
                }
                None => {
                    tracing::info!("server closed the connection");
                    break;
                }
            },
            () = cancel.cancelled() => {
                tracing::info!("Ctrl+C received, closing");
                break;
            }
        }
    }

    socket.close().await?;
    Ok(())
}
