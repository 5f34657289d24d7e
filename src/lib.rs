//! # Room Session Client
//!
//! Session bootstrap and resilient room connection for multiplayer world clients.
//!
//! Two phases, strictly in order:
//!
//! 1. **Bootstrap**: [`SessionBootstrapper`] turns the URL's [`ConnectionIntent`]
//!    into a [`LocalUser`] and a [`Room`], registering or logging in against the
//!    authentication API when needed and caching the identity in a
//!    [`CredentialStore`].
//! 2. **Connect**: [`ConnectionEstablisher`] opens a real-time connection through
//!    a [`RoomConnector`], retrying failed attempts after a 4–6 second jittered
//!    delay until it succeeds or its [`CancelToken`] fires.
//!
//! [`ConnectionManager`] bundles both for callers that want the identity kept
//! for them.
//!
//! ## Features
//!
//! - **`transport-websocket`** (default): [`WebSocketConnector`] over `tokio-tungstenite`
//! - **`http-reqwest`** (default): [`ReqwestHttpClient`] over `reqwest`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use room_session_client::*;
//!
//! let bootstrapper = SessionBootstrapper::new(
//!     SessionConfig::from_env(),
//!     Arc::new(ReqwestHttpClient::new()?),
//!     Arc::new(MemoryCredentialStore::new()),
//!     Arc::new(PathRouter::new("https:", "/_/global/maps.example.org/floor.json")),
//! );
//! let session = bootstrapper.bootstrap_from_url().await?;
//!
//! let socket = ConnectionEstablisher::default()
//!     .connect(
//!         &WebSocketConnector::new("wss://pusher.example.org"),
//!         &session.local_user,
//!         &RoomParams::new(session.room.path.clone(), "Alice"),
//!         &CancelToken::new(),
//!     )
//!     .await?;
//! ```

pub mod bootstrap;
pub mod clients;
pub mod config;
pub mod connector;
pub mod connectors;
pub mod error;
pub mod establish;
pub mod http;
pub mod manager;
pub mod model;
pub mod router;
pub mod store;

// Re-export primary types for ergonomic imports.
pub use bootstrap::SessionBootstrapper;
pub use config::{RetryPolicy, SessionConfig};
pub use connector::RoomConnector;
pub use error::{BootstrapError, ConnectError, ErrorKind};
pub use establish::{CancelToken, ConnectionEstablisher};
pub use http::HttpClient;
pub use manager::ConnectionManager;
pub use model::{ConnectionIntent, LocalUser, Position, Room, RoomParams, Session, Viewport};
pub use router::{PathRouter, UrlRouter};
pub use store::{CredentialStore, MemoryCredentialStore};

#[cfg(feature = "http-reqwest")]
pub use clients::ReqwestHttpClient;
#[cfg(feature = "transport-websocket")]
pub use connectors::{RoomSocket, WebSocketConnector};
