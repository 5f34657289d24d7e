//! [`HttpClient`](crate::http::HttpClient) implementations.
//!
//! | Feature        | Client                  |
//! |----------------|-------------------------|
//! | `http-reqwest` | [`ReqwestHttpClient`]   |

#[cfg(feature = "http-reqwest")]
pub mod reqwest;

#[cfg(feature = "http-reqwest")]
pub use self::reqwest::ReqwestHttpClient;
