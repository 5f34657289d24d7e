//! HTTP boundary used by the session bootstrapper.
//!
//! The bootstrapper only ever issues JSON `POST` requests and parses the
//! response body itself, so the [`HttpClient`] trait is deliberately narrow:
//! send a body (or none) to a URL, get the body text back.
//!
//! # Implementing a Custom Client
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use room_session_client::error::BootstrapError;
//! use room_session_client::http::HttpClient;
//!
//! struct MyClient { /* ... */ }
//!
//! #[async_trait]
//! impl HttpClient for MyClient {
//!     async fn post(&self, url: &str, body: Option<String>) -> Result<String, BootstrapError> {
//!         // Issue the request; map failures to BootstrapError::Transport
//!         // and non-2xx answers to BootstrapError::HttpStatus.
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::BootstrapError;

/// A minimal asynchronous HTTP client.
///
/// This trait is object-safe; the bootstrapper holds it as `Arc<dyn HttpClient>`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// `POST` to `url` with an optional JSON body and return the response body.
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::Transport`] if the request could not be completed.
    /// - [`BootstrapError::HttpStatus`] if the server answered with a non-2xx status.
    async fn post(&self, url: &str, body: Option<String>) -> Result<String, BootstrapError>;
}
