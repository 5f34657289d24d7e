//! Connection establishment with jittered retry.
//!
//! [`ConnectionEstablisher::connect`] drives a small state machine:
//!
//! ```text
//!            ┌──────────── error ────────────┐
//!            ▼                               │
//!      Attempting ── success ──▶ Connected   │
//!            │                               │
//!            └──── error ──▶ Backoff ────────┘
//!                         (base + jitter)
//! ```
//!
//! Attempts are strictly sequential. The parameter tuple is captured once and
//! lent to every attempt. The loop ends on success, on cancellation through a
//! [`CancelToken`], or, when the [`RetryPolicy`] sets a ceiling, after the
//! last permitted attempt.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::connector::RoomConnector;
use crate::error::ConnectError;
use crate::model::{LocalUser, RoomParams};

// ── CancelToken ─────────────────────────────────────────────────────

/// Cooperative cancellation for an in-progress connect call.
///
/// Clones share state: cancelling any clone cancels them all. Cancelling is
/// idempotent and cannot be undone.
///
/// # Example
///
/// ```
/// use room_session_client::establish::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Cancel every connect call observing this token.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

// ── ConnectionEstablisher ───────────────────────────────────────────

/// Opens a room connection, retrying failed attempts after a jittered delay.
#[derive(Debug, Clone, Default)]
pub struct ConnectionEstablisher {
    policy: RetryPolicy,
}

impl ConnectionEstablisher {
    /// Create an establisher with the given retry policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Open a connection for `params`, authenticating with `user`.
    ///
    /// Every attempt receives the same `user.auth_token` and `params`. Failed
    /// attempts are logged and retried; they are never returned while the
    /// policy is unbounded.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::Cancelled`] once `cancel` fires, whether during an
    ///   attempt or a backoff.
    /// - [`ConnectError::RetriesExhausted`] when a ceiling is configured and
    ///   reached.
    pub async fn connect<C>(
        &self,
        connector: &C,
        user: &LocalUser,
        params: &RoomParams,
        cancel: &CancelToken,
    ) -> Result<C::Connection, ConnectError>
    where
        C: RoomConnector + ?Sized,
    {
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(attempts, "connect cancelled");
                return Err(ConnectError::Cancelled);
            }

            // Attempting
            attempts = attempts.saturating_add(1);
            debug!(attempt = attempts, room_id = %params.room_id, "opening room connection");
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(attempt = attempts, "connect cancelled during attempt");
                    return Err(ConnectError::Cancelled);
                }
                outcome = connector.open(&user.auth_token, params) => outcome,
            };

            let error = match outcome {
                Ok(connection) => {
                    info!(attempt = attempts, room_id = %params.room_id, "connected to room");
                    return Ok(connection);
                }
                Err(error) => error,
            };
            warn!(
                attempt = attempts,
                error = %error,
                "an error occurred while connecting to the room server, retrying"
            );

            if self.policy.is_exhausted(attempts) {
                return Err(ConnectError::RetriesExhausted {
                    attempts,
                    last_error: Box::new(error),
                });
            }

            // Backoff
            let delay = self.policy.next_delay();
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            debug!(delay_ms, "backing off before next attempt");
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(attempts, "connect cancelled during backoff");
                    return Err(ConnectError::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
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
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::time::Instant;

    // ── Scripted connector ──────────────────────────────────────────

    /// Fails or succeeds per a script; records every attempt.
    struct ScriptedConnector {
        script: StdMutex<VecDeque<bool>>,
        attempts: StdMutex<Vec<(String, RoomParams)>>,
    }

    impl ScriptedConnector {
        fn new(script: Vec<bool>) -> Self {
            Self {
                script: StdMutex::new(VecDeque::from(script)),
                attempts: StdMutex::new(Vec::new()),
            }
        }

        fn attempt_count(&self) -> usize {
            self.attempts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RoomConnector for ScriptedConnector {
        type Connection = usize;

        async fn open(&self, auth_token: &str, params: &RoomParams) -> Result<usize, ConnectError> {
            let n = {
                let mut attempts = self.attempts.lock().unwrap();
                attempts.push((auth_token.to_string(), params.clone()));
                attempts.len()
            };
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(true) => Ok(n),
                Some(false) => Err(ConnectError::Transport(format!("attempt {n} refused"))),
                None => std::future::pending().await,
            }
        }
    }

    fn params() -> RoomParams {
        RoomParams::new("room-1", "Alice").with_character_layers(vec!["male1".into()])
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_needs_no_backoff() {
        let connector = ScriptedConnector::new(vec![true]);
        let start = Instant::now();

        let conn = ConnectionEstablisher::default()
            .connect(&connector, &LocalUser::new("u", "t"), &params(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(conn, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_third_attempt_succeeds() {
        let connector = ScriptedConnector::new(vec![false, false, true]);
        let user = LocalUser::new("u", "tok");
        let params = params();
        let start = Instant::now();

        let conn = ConnectionEstablisher::default()
            .connect(&connector, &user, &params, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(conn, 3, "handle comes from the third attempt");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(8000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(12000), "{elapsed:?}");

        let attempts = connector.attempts.lock().unwrap();
        assert_eq!(attempts.len(), 3);
        for (token, seen) in attempts.iter() {
            assert_eq!(token, "tok");
            assert_eq!(seen, &params);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ceiling_stops_with_last_error() {
        let connector = ScriptedConnector::new(vec![false, false, false, true]);
        let establisher = ConnectionEstablisher::new(RetryPolicy::default().with_max_attempts(2));

        let err = establisher
            .connect(&connector, &LocalUser::new("u", "t"), &params(), &CancelToken::new())
            .await
            .unwrap_err();

        match err {
            ConnectError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 2);
                assert!(last_error.to_string().contains("attempt 2 refused"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(connector.attempt_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_backoff_stops_retrying() {
        let connector = Arc::new(ScriptedConnector::new(vec![false, true]));
        let cancel = CancelToken::new();

        let task = {
            let connector = Arc::clone(&connector);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                ConnectionEstablisher::default()
                    .connect(&*connector, &LocalUser::new("u", "t"), &params(), &cancel)
                    .await
            })
        };

        // First attempt fails immediately; we are now inside the >= 4s backoff.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        cancel.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ConnectError::Cancelled));
        assert_eq!(connector.attempt_count(), 1, "no attempt after cancel");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_attempt_drops_it() {
        // Empty script: the first attempt hangs forever.
        let connector = Arc::new(ScriptedConnector::new(vec![]));
        let cancel = CancelToken::new();

        let task = {
            let connector = Arc::clone(&connector);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                ConnectionEstablisher::default()
                    .connect(&*connector, &LocalUser::new("u", "t"), &params(), &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ConnectError::Cancelled));
        assert_eq!(connector.attempt_count(), 1);
    }

    #[tokio::test]
    async fn precancelled_token_makes_no_attempt() {
        let connector = ScriptedConnector::new(vec![true]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = ConnectionEstablisher::default()
            .connect(&connector, &LocalUser::new("u", "t"), &params(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectError::Cancelled));
        assert_eq!(connector.attempt_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_loop_stays_pending() {
        let connector = ScriptedConnector::new(vec![false; 50]);
        let establisher = ConnectionEstablisher::default();
        let user = LocalUser::new("u", "t");
        let params = params();
        let cancel = CancelToken::new();

        let mut fut = tokio_test::task::spawn(establisher.connect(&connector, &user, &params, &cancel));
        tokio_test::assert_pending!(fut.poll());

        // Far more failures than any sane ceiling, still no error surfaced.
        tokio::time::advance(Duration::from_secs(6 * 20)).await;
        tokio_test::assert_pending!(fut.poll());
        assert!(connector.attempt_count() >= 2);
    }

    #[test]
    fn connect_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}
        let connector = ScriptedConnector::new(vec![true]);
        let user = LocalUser::new("u", "t");
        let params = params();
        let cancel = CancelToken::new();
        let establisher = ConnectionEstablisher::default();
        let fut = establisher.connect(&connector, &user, &params, &cancel);
        assert_send(&fut);
        assert_send(&connector.open("t", &params));
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancelToken::default();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
