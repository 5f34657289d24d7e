//! Session bootstrap: turn a [`ConnectionIntent`] into an identity and a room.
//!
//! | Intent         | Cached identity | Network                    | Result                         |
//! |----------------|-----------------|----------------------------|--------------------------------|
//! | `Register`     | ignored         | `POST /register`           | new identity, URL rewritten    |
//! | `Anonymous`    | reused          | none                       | cached identity                |
//! | `Anonymous`    | absent          | `POST /anonymLogin`        | new identity                   |
//! | `Organization` | present         | none                       | `Unimplemented`                |
//! | `Organization` | absent          | none                       | `NoCachedIdentity`             |
//! | `Invalid`      | n/a             | none                       | `InvalidConnectionIntent`      |
//!
//! Failures are never retried here.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::{BootstrapError, Result};
use crate::http::HttpClient;
use crate::model::{
    AnonymousLoginResponse, ConnectionIntent, LocalUser, RegisterRequest, RegisterResponse, Room,
    Session,
};
use crate::router::UrlRouter;
use crate::store::CredentialStore;

/// Message carried by [`BootstrapError::Unimplemented`] for organization links.
pub const ORGANIZATION_UNIMPLEMENTED: &str = "need to resolve room URL from organization slug";

/// Resolves identity and target room before any room connection is opened.
///
/// Holds its collaborators behind `Arc<dyn _>` so one bootstrapper can be
/// shared with the rest of the client.
#[derive(Clone)]
pub struct SessionBootstrapper {
    config: SessionConfig,
    http: Arc<dyn HttpClient>,
    store: Arc<dyn CredentialStore>,
    router: Arc<dyn UrlRouter>,
}

impl SessionBootstrapper {
    pub fn new(
        config: SessionConfig,
        http: Arc<dyn HttpClient>,
        store: Arc<dyn CredentialStore>,
        router: Arc<dyn UrlRouter>,
    ) -> Self {
        Self {
            config,
            http,
            store,
            router,
        }
    }

    /// Classify the current URL and bootstrap from it.
    ///
    /// # Errors
    ///
    /// See [`bootstrap`](Self::bootstrap).
    pub async fn bootstrap_from_url(&self) -> Result<Session> {
        self.bootstrap(self.router.connection_intent()).await
    }

    /// Resolve `intent` into a [`Session`].
    ///
    /// Newly obtained identities are saved to the credential store before
    /// returning.
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::Transport`] / [`BootstrapError::HttpStatus`] when an API call fails.
    /// - [`BootstrapError::MalformedResponse`] when an API response lacks a required field.
    /// - [`BootstrapError::Unimplemented`] for an organization link with a cached identity.
    /// - [`BootstrapError::NoCachedIdentity`] for an organization link without one.
    /// - [`BootstrapError::InvalidConnectionIntent`] for an unrecognized URL.
    pub async fn bootstrap(&self, intent: ConnectionIntent) -> Result<Session> {
        debug!(intent = intent.label(), "bootstrapping session");
        match intent {
            ConnectionIntent::Register { organization_token } => {
                self.register(organization_token).await
            }
            ConnectionIntent::Anonymous => self.anonymous().await,
            ConnectionIntent::Organization => self.organization(),
            ConnectionIntent::Invalid => Err(BootstrapError::InvalidConnectionIntent),
        }
    }

    async fn register(&self, organization_member_token: String) -> Result<Session> {
        let body = serde_json::to_string(&RegisterRequest {
            organization_member_token,
        })?;

        let text = self
            .http
            .post(&self.config.register_url(), Some(body))
            .await?;
        let data: RegisterResponse = serde_json::from_str(&text)?;

        let local_user = LocalUser::new(data.user_uuid, data.auth_token);
        self.store.save_user(&local_user);
        info!(
            organization = %data.organization_slug,
            world = %data.world_slug,
            room = %data.room_slug,
            "registered organization member"
        );

        self.router
            .edit_url_for_room(&data.room_slug, &data.organization_slug, &data.world_slug);

        let room = Room::new(self.router.current_path(), data.map_url_start);
        Ok(Session { local_user, room })
    }

    async fn anonymous(&self) -> Result<Session> {
        let local_user = match self.store.local_user() {
            Some(user) => {
                debug!("reusing cached identity");
                user
            }
            None => {
                let text = self
                    .http
                    .post(&self.config.anonymous_login_url(), None)
                    .await?;
                let data: AnonymousLoginResponse = serde_json::from_str(&text)?;
                let user = LocalUser::new(data.user_uuid, data.auth_token);
                self.store.save_user(&user);
                info!("logged in anonymously");
                user
            }
        };

        let room = Room::new(
            self.router.current_path(),
            self.router.anonymous_map_url_start(),
        );
        Ok(Session { local_user, room })
    }

    fn organization(&self) -> Result<Session> {
        match self.store.local_user() {
            // TODO: resolve the start map from the organization slug once the API exposes it.
            Some(_) => Err(BootstrapError::Unimplemented(ORGANIZATION_UNIMPLEMENTED)),
            None => Err(BootstrapError::NoCachedIdentity),
        }
    }
}

impl std::fmt::Debug for SessionBootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBootstrapper")
            .field("config", &self.config)
            .finish_non_exhaustive()
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
    use crate::error::ErrorKind;
    use crate::router::PathRouter;
    use crate::store::MemoryCredentialStore;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    // ── Mock HTTP client ────────────────────────────────────────────

    /// Replays one scripted response and records every request.
    struct MockHttp {
        response: StdMutex<Option<Result<String>>>,
        calls: Arc<StdMutex<Vec<(String, Option<String>)>>>,
    }

    impl MockHttp {
        fn new(response: Result<String>) -> (Arc<Self>, Arc<StdMutex<Vec<(String, Option<String>)>>>) {
            let calls = Arc::new(StdMutex::new(Vec::new()));
            let http = Arc::new(Self {
                response: StdMutex::new(Some(response)),
                calls: Arc::clone(&calls),
            });
            (http, calls)
        }

        fn unused() -> (Arc<Self>, Arc<StdMutex<Vec<(String, Option<String>)>>>) {
            Self::new(Err(BootstrapError::Transport("unexpected call".into())))
        }
    }

    #[async_trait]
    impl HttpClient for MockHttp {
        async fn post(&self, url: &str, body: Option<String>) -> Result<String> {
            self.calls.lock().unwrap().push((url.to_string(), body));
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(BootstrapError::Transport("no more responses".into())))
        }
    }

    fn bootstrapper(
        http: Arc<MockHttp>,
        store: Arc<MemoryCredentialStore>,
        path: &str,
    ) -> (SessionBootstrapper, Arc<PathRouter>) {
        let router = Arc::new(PathRouter::new("https:", path));
        let boot = SessionBootstrapper::new(
            SessionConfig::new("http://api.test"),
            http,
            store,
            router.clone(),
        );
        (boot, router)
    }

    #[tokio::test]
    async fn register_posts_token_and_persists_identity() {
        let (http, calls) = MockHttp::new(Ok(r#"{"userUuid":"u1","authToken":"t1","organizationSlug":"o","worldSlug":"w","roomSlug":"r","mapUrlStart":"m"}"#.into()));
        let store = Arc::new(MemoryCredentialStore::with_user(LocalUser::new("old", "x")));
        let (boot, router) = bootstrapper(http, store.clone(), "/register/tok");

        let session = boot
            .bootstrap(ConnectionIntent::Register {
                organization_token: "tok".into(),
            })
            .await
            .unwrap();

        assert_eq!(session.local_user, LocalUser::new("u1", "t1"));
        assert_eq!(store.local_user(), Some(LocalUser::new("u1", "t1")));
        assert_eq!(session.room, Room::new("/@/o/w/r", "m"));
        assert_eq!(router.current_path(), "/@/o/w/r");

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "http://api.test/register");
        assert_eq!(
            calls[0].1.as_deref(),
            Some(r#"{"organizationMemberToken":"tok"}"#)
        );
    }

    #[test]
    fn json_errors_are_malformed_not_transport() {
        let err: BootstrapError = serde_json::from_str::<RegisterResponse>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn register_with_missing_field_is_malformed() {
        let (http, _calls) = MockHttp::new(Ok(r#"{"userUuid":"u1","authToken":"t1"}"#.into()));
        let store = Arc::new(MemoryCredentialStore::new());
        let (boot, _router) = bootstrapper(http, store.clone(), "/register/tok");

        let err = boot
            .bootstrap(ConnectionIntent::Register {
                organization_token: "tok".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert!(store.local_user().is_none(), "nothing persisted on failure");
    }

    #[tokio::test]
    async fn register_http_failure_propagates() {
        let (http, calls) = MockHttp::new(Err(BootstrapError::HttpStatus {
            url: "http://api.test/register".into(),
            status: 403,
        }));
        let store = Arc::new(MemoryCredentialStore::new());
        let (boot, router) = bootstrapper(http, store, "/register/tok");

        let err = boot
            .bootstrap(ConnectionIntent::Register {
                organization_token: "tok".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::HttpStatus { status: 403, .. }));
        assert_eq!(calls.lock().unwrap().len(), 1, "no retry");
        assert_eq!(router.current_path(), "/register/tok", "URL untouched");
    }

    #[tokio::test]
    async fn anonymous_reuses_cached_identity_without_network() {
        let (http, calls) = MockHttp::unused();
        let store = Arc::new(MemoryCredentialStore::with_user(LocalUser::new("u2", "t2")));
        let (boot, _router) = bootstrapper(http, store, "/_/global/maps.test/map.json");

        let session = boot.bootstrap(ConnectionIntent::Anonymous).await.unwrap();

        assert_eq!(session.local_user, LocalUser::new("u2", "t2"));
        assert_eq!(
            session.room,
            Room::new("/_/global/maps.test/map.json", "https://maps.test/map.json")
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn anonymous_logs_in_once_when_store_is_empty() {
        let (http, calls) = MockHttp::new(Ok(r#"{"userUuid":"u3","authToken":"t3"}"#.into()));
        let store = Arc::new(MemoryCredentialStore::new());
        let (boot, _router) = bootstrapper(http, store.clone(), "/_/global/maps.test/map.json");

        let session = boot.bootstrap(ConnectionIntent::Anonymous).await.unwrap();

        assert_eq!(session.local_user, LocalUser::new("u3", "t3"));
        assert_eq!(store.local_user(), Some(LocalUser::new("u3", "t3")));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("http://api.test/anonymLogin".to_string(), None));
    }

    #[tokio::test]
    async fn organization_with_cached_identity_is_unimplemented() {
        let (http, calls) = MockHttp::unused();
        let store = Arc::new(MemoryCredentialStore::with_user(LocalUser::new("u", "t")));
        let (boot, _router) = bootstrapper(http, store, "/@/acme/hq/lobby");

        let err = boot
            .bootstrap(ConnectionIntent::Organization)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::Unimplemented(ORGANIZATION_UNIMPLEMENTED)
        ));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn organization_without_identity_has_no_fallback() {
        let (http, calls) = MockHttp::unused();
        let store = Arc::new(MemoryCredentialStore::new());
        let (boot, _router) = bootstrapper(http, store, "/@/acme/hq/lobby");

        let err = boot
            .bootstrap(ConnectionIntent::Organization)
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::NoCachedIdentity));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_intent_is_rejected() {
        let (http, _calls) = MockHttp::unused();
        let store = Arc::new(MemoryCredentialStore::new());
        let (boot, _router) = bootstrapper(http, store, "/nowhere");

        let err = boot.bootstrap_from_url().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConnectionIntent);
    }
}
