//! Error types for session bootstrap and room connection.

use thiserror::Error;

/// Errors that can occur while resolving identity and target room.
///
/// None of these are retried by the bootstrapper; they propagate straight to
/// the caller, who can branch on [`BootstrapError::kind`].
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The HTTP request could not be completed (DNS, connect, TLS, read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A recognized intent whose flow is not supported yet.
    #[error("not implemented: {0}")]
    Unimplemented(&'static str),

    /// Organization intent without a cached identity to fall back on.
    #[error("could not find a cached user identity")]
    NoCachedIdentity,

    /// The URL did not describe any known connection intent.
    #[error("invalid connection intent: unrecognized URL")]
    InvalidConnectionIntent,
}

impl BootstrapError {
    /// Stable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::HttpStatus { .. } => ErrorKind::Transport,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Unimplemented(_) => ErrorKind::Unimplemented,
            Self::NoCachedIdentity => ErrorKind::NoCachedIdentity,
            Self::InvalidConnectionIntent => ErrorKind::InvalidConnectionIntent,
        }
    }
}

impl From<serde_json::Error> for BootstrapError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Category of a [`BootstrapError`], for presenting an actionable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    MalformedResponse,
    Unimplemented,
    NoCachedIdentity,
    InvalidConnectionIntent,
}

impl ErrorKind {
    /// Human-readable description suitable for display to a player.
    pub fn description(self) -> &'static str {
        match self {
            Self::Transport => "The server could not be reached. Check your connection and try again.",
            Self::MalformedResponse => "The server sent an unexpected response.",
            Self::Unimplemented => "This kind of link is not supported yet.",
            Self::NoCachedIdentity => "No saved identity was found. Open your invitation link again.",
            Self::InvalidConnectionIntent => "This URL does not point to a valid world.",
        }
    }
}

/// Errors that end a room connect call.
///
/// Individual attempt failures ([`Transport`](ConnectError::Transport),
/// [`Io`](ConnectError::Io)) are retried internally and only surface wrapped in
/// [`RetriesExhausted`](ConnectError::RetriesExhausted) when a retry ceiling is
/// configured.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Connect was invoked before an identity was resolved.
    #[error("no local user: bootstrap must complete before connecting")]
    MissingIdentity,

    /// The room server rejected or dropped the connection attempt.
    #[error("room transport error: {0}")]
    Transport(String),

    /// An I/O error occurred while opening the connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the connect call.
    #[error("connect cancelled")]
    Cancelled,

    /// The configured attempt ceiling was reached.
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<ConnectError>,
    },
}

/// A specialized [`Result`] type for bootstrap operations.
pub type Result<T> = std::result::Result<T, BootstrapError>;
