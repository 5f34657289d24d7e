//! [`RoomConnector`](crate::connector::RoomConnector) implementations.
//!
//! | Feature                | Connector               |
//! |------------------------|-------------------------|
//! | `transport-websocket`  | [`WebSocketConnector`]  |
//!
//! # Example
//!
//! ```rust,ignore
//! # async fn example() -> Result<(), room_session_client::ConnectError> {
//! use room_session_client::{RoomConnector, RoomParams, WebSocketConnector};
//!
//! let connector = WebSocketConnector::new("ws://pusher.example.org");
//! let mut socket = connector.open("jwt", &RoomParams::new("room-1", "Alice")).await?;
//! socket.send(vec![0x01]).await?;
//! socket.close().await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "transport-websocket")]
pub mod websocket;

#[cfg(feature = "transport-websocket")]
pub use websocket::{RoomSocket, WebSocketConnector};
