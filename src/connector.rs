//! Room transport abstraction.
//!
//! A [`RoomConnector`] opens one real-time connection to a room server. Each
//! call to [`open`](RoomConnector::open) must construct a **fresh** transport
//! resource; its future resolving to `Ok` is the connection's success signal
//! and resolving to `Err` is its error signal. Each fires at most once per
//! resource, and a failed resource is dropped before the next attempt.
//!
//! The retry loop lives in [`ConnectionEstablisher`](crate::establish::ConnectionEstablisher);
//! connectors make a single attempt and never retry on their own.
//!
//! # Implementing a Custom Connector
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use room_session_client::connector::RoomConnector;
//! use room_session_client::error::ConnectError;
//! use room_session_client::model::RoomParams;
//!
//! struct MyConnector;
//! struct MyConnection;
//!
//! #[async_trait]
//! impl RoomConnector for MyConnector {
//!     type Connection = MyConnection;
//!
//!     async fn open(
//!         &self,
//!         auth_token: &str,
//!         params: &RoomParams,
//!     ) -> Result<MyConnection, ConnectError> {
//!         // Dial the room server and wait for its handshake.
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::ConnectError;
use crate::model::RoomParams;

/// Opens real-time connections to a room server.
///
/// # Cancel Safety
///
/// [`open`](RoomConnector::open) **MUST** be cancel-safe: the establisher
/// drops the future when the caller cancels, and dropping it must release the
/// half-open resource.
#[async_trait]
pub trait RoomConnector: Send + Sync {
    /// Live connection handle yielded on success.
    type Connection: Send;

    /// Make one connection attempt with the given token and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Transport`] or [`ConnectError::Io`] when the
    /// attempt fails. The establisher retries both.
    async fn open(
        &self,
        auth_token: &str,
        params: &RoomParams,
    ) -> Result<Self::Connection, ConnectError>;
}
