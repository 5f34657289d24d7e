//! High-level facade tying bootstrap and connection together.
//!
//! [`ConnectionManager`] owns the identity between the two phases so callers
//! that do not want to thread a [`LocalUser`] by hand can write:
//!
//! ```rust,ignore
//! let room = manager.init_game_connection().await?;
//! let params = RoomParams::new(room.path.clone(), "Alice");
//! let socket = manager.connect_to_room(&params, &CancelToken::new()).await?;
//! ```

use tracing::{debug, error};

use crate::bootstrap::SessionBootstrapper;
use crate::connector::RoomConnector;
use crate::error::{ConnectError, Result};
use crate::establish::{CancelToken, ConnectionEstablisher};
use crate::model::{LocalUser, Room, RoomParams};

/// Owns the local identity and opens room connections with it.
#[derive(Debug)]
pub struct ConnectionManager<C> {
    bootstrapper: SessionBootstrapper,
    establisher: ConnectionEstablisher,
    connector: C,
    local_user: Option<LocalUser>,
}

impl<C: RoomConnector> ConnectionManager<C> {
    pub fn new(
        bootstrapper: SessionBootstrapper,
        establisher: ConnectionEstablisher,
        connector: C,
    ) -> Self {
        Self {
            bootstrapper,
            establisher,
            connector,
            local_user: None,
        }
    }

    /// Resolve identity from the current URL and return the room to load.
    ///
    /// On success the identity is kept for [`connect_to_room`](Self::connect_to_room).
    /// On failure any previously held identity is left untouched.
    ///
    /// # Errors
    ///
    /// Any [`BootstrapError`](crate::error::BootstrapError) from the bootstrapper.
    pub async fn init_game_connection(&mut self) -> Result<Room> {
        let session = self.bootstrapper.bootstrap_from_url().await?;
        self.local_user = Some(session.local_user);
        Ok(session.room)
    }

    /// Install the placeholder benchmark identity. No network traffic.
    pub fn init_benchmark(&mut self) {
        debug!("installing benchmark identity");
        self.local_user = Some(LocalUser::benchmark());
    }

    /// The identity connections will use, if resolved.
    pub fn local_user(&self) -> Option<&LocalUser> {
        self.local_user.as_ref()
    }

    /// Open a room connection, retrying per the establisher's policy.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::MissingIdentity`] immediately, without touching the
    ///   transport, when neither [`init_game_connection`](Self::init_game_connection)
    ///   nor [`init_benchmark`](Self::init_benchmark) has succeeded.
    /// - [`ConnectError::Cancelled`] / [`ConnectError::RetriesExhausted`] from the
    ///   establisher.
    pub async fn connect_to_room(
        &self,
        params: &RoomParams,
        cancel: &CancelToken,
    ) -> std::result::Result<C::Connection, ConnectError> {
        let Some(user) = self.local_user.as_ref() else {
            error!("connect_to_room called before an identity was resolved");
            return Err(ConnectError::MissingIdentity);
        };
        self.establisher
            .connect(&self.connector, user, params, cancel)
            .await
    }
}
