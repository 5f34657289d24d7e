//! WebSocket room connector using `tokio-tungstenite`.
//!
//! Every [`WebSocketConnector::open`] call dials a fresh socket at
//! `{base}/room?…` with the auth token and player state in the query string.
//! A completed handshake is the success signal; a handshake failure is the
//! error signal. Both `ws://` and `wss://` are supported via
//! [`MaybeTlsStream`](tokio_tungstenite::MaybeTlsStream).
//!
//! # Feature gate
//!
//! Only available with the `transport-websocket` feature (enabled by default).

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message;
use url::Url;

use crate::connector::RoomConnector;
use crate::error::ConnectError;
use crate::model::RoomParams;

/// Type alias for the underlying WebSocket stream.
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Dials room servers over WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    base_url: String,
    handshake_timeout: Option<Duration>,
}

impl WebSocketConnector {
    /// Create a connector for the room server at `base_url` (e.g. `wss://pusher.example.org`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            handshake_timeout: None,
        }
    }

    /// Fail an attempt whose handshake takes longer than `timeout`.
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// The URL one attempt dials.
    ///
    /// # Errors
    ///
    /// [`ConnectError::Transport`] if the base URL does not parse.
    pub fn room_url(&self, auth_token: &str, params: &RoomParams) -> Result<Url, ConnectError> {
        let mut url = Url::parse(&format!("{}/room", self.base_url))
            .map_err(|e| ConnectError::Transport(format!("invalid room server URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("roomId", &params.room_id)
                .append_pair("token", auth_token)
                .append_pair("name", &params.name);
            for layer in &params.character_layers {
                query.append_pair("characterLayers", layer);
            }
            query
                .append_pair("x", &params.position.x.to_string())
                .append_pair("y", &params.position.y.to_string())
                .append_pair("direction", &params.position.direction)
                .append_pair("moving", &params.position.moving.to_string())
                .append_pair("top", &params.viewport.top.to_string())
                .append_pair("bottom", &params.viewport.bottom.to_string())
                .append_pair("left", &params.viewport.left.to_string())
                .append_pair("right", &params.viewport.right.to_string());
        }
        Ok(url)
    }

    async fn dial(&self, url: &str) -> Result<WsStream, ConnectError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| match e {
                tokio_tungstenite::tungstenite::Error::Io(io) => ConnectError::Io(io),
                other => ConnectError::Transport(other.to_string()),
            })?;
        Ok(stream)
    }
}

#[async_trait]
impl RoomConnector for WebSocketConnector {
    type Connection = RoomSocket;

    async fn open(&self, auth_token: &str, params: &RoomParams) -> Result<RoomSocket, ConnectError> {
        let url = self.room_url(auth_token, params)?;
        tracing::debug!(base = %self.base_url, room_id = %params.room_id, "dialing room server");

        let stream = match self.handshake_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.dial(url.as_str()))
                .await
                .map_err(|_| ConnectError::Transport("handshake timed out".into()))??,
            None => self.dial(url.as_str()).await?,
        };

        tracing::info!(base = %self.base_url, room_id = %params.room_id, "room socket established");
        Ok(RoomSocket::from_stream(stream))
    }
}

// ── RoomSocket ──────────────────────────────────────────────────────

/// A live room connection.
///
/// The room protocol itself is opaque here: frames are exchanged as raw
/// bytes. Text frames are delivered as their UTF-8 bytes.
///
/// # Cancel Safety
///
/// [`recv`](Self::recv) is cancel-safe.
#[derive(Debug)]
pub struct RoomSocket {
    stream: WsStream,
    closed: bool,
}

impl RoomSocket {
    /// Wrap an already-established stream.
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }

    /// Send one binary frame.
    ///
    /// # Errors
    ///
    /// [`ConnectError::Transport`] if the socket is closed or the write fails.
    pub async fn send(&mut self, payload: Vec<u8>) -> Result<(), ConnectError> {
        if self.closed {
            return Err(ConnectError::Transport("socket closed".into()));
        }
        self.stream
            .send(Message::Binary(payload.into()))
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))
    }

    /// Receive the next data frame. `None` once the server closes the socket.
    pub async fn recv(&mut self) -> Option<Result<Vec<u8>, ConnectError>> {
        loop {
            let msg = match self.stream.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Some(Err(ConnectError::Transport(e.to_string()))),
                None => return None,
            };

            match msg {
                Message::Binary(bytes) => return Some(Ok(bytes.to_vec())),
                Message::Text(text) => return Some(Ok(text.as_str().as_bytes().to_vec())),
                Message::Close(frame) => {
                    tracing::debug!(?frame, "received close frame");
                    return None;
                }
                // tungstenite answers pings itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    /// Close the socket. Idempotent.
    ///
    /// # Errors
    ///
    /// [`ConnectError::Transport`] if the close handshake fails.
    pub async fn close(&mut self) -> Result<(), ConnectError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::model::{Position, Viewport};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    fn params() -> RoomParams {
        RoomParams::new("_/global/maps.test/map.json", "Zoé B")
            .with_character_layers(vec!["male1".into(), "hat&cap".into()])
            .with_position(Position {
                x: 10.0,
                y: 20.5,
                direction: "down".into(),
                moving: false,
            })
            .with_viewport(Viewport {
                left: 0.0,
                top: 0.0,
                right: 800.0,
                bottom: 600.0,
            })
    }

    /// Accept one WebSocket, report the request URI, then run `handler`.
    async fn start_mock_server<F, Fut>(handler: F) -> (String, oneshot::Receiver<String>)
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (uri_tx, uri_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let _ = uri_tx.send(req.uri().to_string());
                Ok(resp)
            };
            let ws = tokio_tungstenite::accept_hdr_async(tcp, callback)
                .await
                .unwrap();
            handler(ws).await;
        });

        (format!("ws://{addr}"), uri_rx)
    }

    #[test]
    fn room_socket_is_send_and_debug() {
        fn assert_send_debug<T: Send + std::fmt::Debug>() {}
        assert_send_debug::<RoomSocket>();
    }

    #[test]
    fn room_url_encodes_every_parameter() {
        let connector = WebSocketConnector::new("ws://pusher.test/");
        let url = connector.room_url("a.b+c", &params()).unwrap();
        assert_eq!(
            url.as_str(),
            "ws://pusher.test/room?roomId=_%2Fglobal%2Fmaps.test%2Fmap.json&token=a.b%2Bc\
             &name=Zo%C3%A9+B&characterLayers=male1&characterLayers=hat%26cap\
             &x=10&y=20.5&direction=down&moving=false&top=0&bottom=600&left=0&right=800"
        );

        // Every value decodes back to exactly what the caller passed.
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let layers: Vec<&str> = pairs
            .iter()
            .filter(|(k, _)| k == "characterLayers")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(layers, ["male1", "hat&cap"]);
        assert!(pairs.contains(&("name".into(), "Zoé B".into())));
        assert!(pairs.contains(&("token".into(), "a.b+c".into())));
    }

    #[test]
    fn room_url_rejects_unparseable_base() {
        let connector = WebSocketConnector::new("not-a-valid-url");
        let err = connector.room_url("t", &params()).unwrap_err();
        assert!(matches!(err, ConnectError::Transport(ref m) if m.contains("invalid room server URL")));
    }

    #[tokio::test]
    async fn open_fails_with_unreachable_host() {
        let connector = WebSocketConnector::new("ws://127.0.0.1:1");
        let err = connector.open("t", &params()).await.unwrap_err();
        assert!(matches!(err, ConnectError::Io(_)), "{err:?}");
    }

    #[tokio::test]
    async fn open_fails_with_invalid_url() {
        let connector = WebSocketConnector::new("not-a-valid-url");
        let err = connector.open("t", &params()).await.unwrap_err();
        assert!(matches!(err, ConnectError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn handshake_timeout_is_a_transport_error() {
        // Non-routable address, guaranteed not to answer.
        let connector =
            WebSocketConnector::new("ws://192.0.2.1:1").with_handshake_timeout(Duration::from_millis(50));
        let err = connector.open("t", &params()).await.unwrap_err();
        assert!(matches!(err, ConnectError::Transport(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn open_sends_token_in_query_and_exchanges_frames() {
        let (base, uri_rx) = start_mock_server(|mut ws| async move {
            if let Some(Ok(Message::Binary(bytes))) = ws.next().await {
                ws.send(Message::Binary(bytes)).await.unwrap();
            }
            ws.send(Message::Text("hello".into())).await.unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let connector = WebSocketConnector::new(base);
        let mut socket = connector.open("jwt-1", &params()).await.unwrap();

        let uri = uri_rx.await.unwrap();
        assert!(uri.starts_with("/room?roomId="), "{uri}");
        assert!(uri.contains("token=jwt-1"), "{uri}");

        socket.send(vec![1, 2, 3]).await.unwrap();
        assert_eq!(socket.recv().await.unwrap().unwrap(), vec![1, 2, 3]);
        assert_eq!(socket.recv().await.unwrap().unwrap(), b"hello".to_vec());
        assert!(socket.recv().await.is_none());
    }

    #[tokio::test]
    async fn send_after_close_fails_and_close_is_idempotent() {
        let (base, _uri_rx) =
            start_mock_server(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} })
                .await;

        let mut socket = WebSocketConnector::new(base)
            .open("t", &params())
            .await
            .unwrap();
        socket.close().await.unwrap();
        socket.close().await.unwrap();

        let err = socket.send(vec![0]).await.unwrap_err();
        assert!(matches!(err, ConnectError::Transport(_)));
    }
}
