//! Configuration for the bootstrap API and the connection retry loop.

use std::num::NonZeroU32;
use std::time::Duration;

use rand::Rng;

/// Environment variable holding the authentication API base URL.
pub const API_URL_ENV: &str = "API_URL";

/// API base URL used when [`API_URL_ENV`] is not set.
pub const DEFAULT_API_URL: &str = "http://api.workadventure.localhost";

/// Fixed part of every backoff delay.
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(4000);

/// Width of the random window added to the base delay.
const DEFAULT_JITTER: Duration = Duration::from_millis(2000);

// ── SessionConfig ───────────────────────────────────────────────────

/// Where the authentication API lives.
///
/// # Example
///
/// ```
/// use room_session_client::config::SessionConfig;
///
/// let config = SessionConfig::new("https://api.example.org/");
/// assert_eq!(config.register_url(), "https://api.example.org/register");
/// assert_eq!(config.anonymous_login_url(), "https://api.example.org/anonymLogin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL of the authentication API, without trailing slash.
    pub api_url: String,
}

impl SessionConfig {
    /// Create a configuration for the given API base URL.
    ///
    /// Trailing slashes are trimmed.
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the API base URL from [`API_URL_ENV`], falling back to
    /// [`DEFAULT_API_URL`] when it is unset or blank.
    pub fn from_env() -> Self {
        let api_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(api_url)
    }

    /// `POST` target for organization-member registration.
    pub fn register_url(&self) -> String {
        format!("{}/register", self.api_url)
    }

    /// `POST` target for anonymous login.
    pub fn anonymous_login_url(&self) -> String {
        format!("{}/anonymLogin", self.api_url)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

// ── RetryPolicy ─────────────────────────────────────────────────────

/// Backoff between failed room connection attempts.
///
/// Every delay is `base_delay + uniform(0..jitter)` in whole milliseconds,
/// drawn independently per backoff. The window never grows with the attempt
/// count. By default there is no attempt ceiling.
///
/// # Example
///
/// ```
/// use room_session_client::config::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// let delay = policy.next_delay();
/// assert!(delay >= Duration::from_millis(4000));
/// assert!(delay < Duration::from_millis(6000));
/// assert!(policy.max_attempts.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Minimum wait before the next attempt.
    ///
    /// Defaults to **4 seconds**.
    pub base_delay: Duration,
    /// Width of the random window added on top of `base_delay`.
    ///
    /// Defaults to **2 seconds**. Zero disables jitter.
    pub jitter: Duration,
    /// Maximum number of attempts. `None` retries until success or cancellation.
    pub max_attempts: Option<NonZeroU32>,
}

impl RetryPolicy {
    /// Set the fixed part of the delay.
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the random window width.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Stop after `max_attempts` failed attempts. Zero means unbounded.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = NonZeroU32::new(max_attempts);
        self
    }

    /// Draw the delay for the next backoff.
    pub fn next_delay(&self) -> Duration {
        let window = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if window == 0 {
            return self.base_delay;
        }
        let extra = rand::rng().random_range(0..window);
        self.base_delay + Duration::from_millis(extra)
    }

    /// Whether `attempts` failed attempts have used up the ceiling.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max.get())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            jitter: DEFAULT_JITTER,
            max_attempts: None,
        }
    }
}
