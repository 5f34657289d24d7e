//! End-to-end tests of the bootstrap → connect flow through the public API.
//!
//! Uses the scripted mocks from `tests/common` for the HTTP boundary and the
//! room transport, with real [`MemoryCredentialStore`] and [`PathRouter`]
//! collaborators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use room_session_client::{
    BootstrapError, CancelToken, ConnectError, ConnectionEstablisher, ConnectionIntent,
    ConnectionManager, CredentialStore, ErrorKind, LocalUser, MemoryCredentialStore, PathRouter,
    Position, RetryPolicy, Room, RoomParams, SessionBootstrapper, SessionConfig, UrlRouter,
    Viewport,
};
use tokio::time::Instant;

use common::{
    anonymous_login_json, register_json, Attempt, MockHttpClient, RecordedRequest,
    ScriptedConnector,
};

const ANON_PATH: &str = "/_/global/maps.test/Floor0/floor0.json";

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

struct Harness {
    bootstrapper: SessionBootstrapper,
    store: Arc<MemoryCredentialStore>,
    router: Arc<PathRouter>,
}

fn harness(http: Arc<MockHttpClient>, store: MemoryCredentialStore, path: &str) -> Harness {
    let store = Arc::new(store);
    let router = Arc::new(PathRouter::new("https:", path));
    let bootstrapper = SessionBootstrapper::new(
        SessionConfig::new("http://api.test/"),
        http,
        store.clone(),
        router.clone(),
    );
    Harness {
        bootstrapper,
        store,
        router,
    }
}

fn player_params() -> RoomParams {
    RoomParams::new("_/global/maps.test/Floor0/floor0.json", "Alice")
        .with_character_layers(vec!["male1".into(), "hat3".into()])
        .with_position(Position {
            x: 320.0,
            y: 240.0,
            direction: "left".into(),
            moving: true,
        })
        .with_viewport(Viewport {
            left: 0.0,
            top: 0.0,
            right: 1024.0,
            bottom: 768.0,
        })
}

// ════════════════════════════════════════════════════════════════════
// Bootstrap
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn register_persists_identity_and_returns_current_path() {
    let (http, requests) =
        MockHttpClient::new(vec![Ok(register_json("u1", "t1", "o", "w", "r", "m"))]);
    let h = harness(http, MemoryCredentialStore::new(), "/register/member-token");

    let intent = h.router.connection_intent();
    let session = h.bootstrapper.bootstrap(intent).await.expect("register");

    assert_eq!(h.store.local_user(), Some(LocalUser::new("u1", "t1")));
    assert_eq!(session.local_user, LocalUser::new("u1", "t1"));
    assert_eq!(session.room, Room::new(h.router.current_path(), "m"));
    assert_eq!(session.room.path, "/@/o/w/r");

    let requests = requests.lock().unwrap();
    assert_eq!(
        *requests,
        vec![RecordedRequest {
            url: "http://api.test/register".into(),
            body: Some(r#"{"organizationMemberToken":"member-token"}"#.into()),
        }]
    );
}

#[tokio::test]
async fn anonymous_with_cached_identity_makes_no_http_call() {
    let (http, requests) = MockHttpClient::new(vec![]);
    let h = harness(
        http,
        MemoryCredentialStore::with_user(LocalUser::new("u2", "t2")),
        ANON_PATH,
    );

    let session = h.bootstrapper.bootstrap_from_url().await.expect("anonymous");

    assert_eq!(session.local_user, LocalUser::new("u2", "t2"));
    assert_eq!(
        session.room,
        Room::new(ANON_PATH, "https://maps.test/Floor0/floor0.json")
    );
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_without_identity_logs_in_exactly_once() {
    let (http, requests) = MockHttpClient::new(vec![Ok(anonymous_login_json("u3", "t3"))]);
    let h = harness(http, MemoryCredentialStore::new(), ANON_PATH);

    let session = h.bootstrapper.bootstrap_from_url().await.expect("anonymous");

    assert_eq!(h.store.local_user(), Some(LocalUser::new("u3", "t3")));
    assert_eq!(session.room.path, ANON_PATH);
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://api.test/anonymLogin");
    assert_eq!(requests[0].body, None);
}

#[tokio::test]
async fn second_anonymous_bootstrap_reuses_saved_identity() {
    let (http, requests) = MockHttpClient::new(vec![Ok(anonymous_login_json("u3", "t3"))]);
    let h = harness(http, MemoryCredentialStore::new(), ANON_PATH);

    let first = h.bootstrapper.bootstrap_from_url().await.expect("first");
    let second = h.bootstrapper.bootstrap_from_url().await.expect("second");

    assert_eq!(first.local_user, second.local_user);
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn organization_without_identity_rejects_without_http() {
    let (http, requests) = MockHttpClient::new(vec![]);
    let h = harness(http, MemoryCredentialStore::new(), "/@/acme/hq/lobby");

    let err = h.bootstrapper.bootstrap_from_url().await.unwrap_err();

    assert!(matches!(err, BootstrapError::NoCachedIdentity));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn organization_with_identity_is_a_typed_unimplemented_error() {
    let (http, _requests) = MockHttpClient::new(vec![]);
    let h = harness(
        http,
        MemoryCredentialStore::with_user(LocalUser::new("u", "t")),
        "/@/acme/hq/lobby",
    );

    let err = h
        .bootstrapper
        .bootstrap(ConnectionIntent::Organization)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unimplemented);
    assert!(err.to_string().contains("organization slug"));
}

#[tokio::test]
async fn anonymous_login_failure_keeps_store_empty() {
    let (http, _requests) = MockHttpClient::new(vec![Err(BootstrapError::HttpStatus {
        url: "http://api.test/anonymLogin".into(),
        status: 503,
    })]);
    let h = harness(http, MemoryCredentialStore::new(), ANON_PATH);

    let err = h.bootstrapper.bootstrap_from_url().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(h.store.local_user().is_none());
}

#[tokio::test]
async fn anonymous_login_with_garbage_body_is_malformed() {
    let (http, _requests) = MockHttpClient::new(vec![Ok("<html>oops</html>".into())]);
    let h = harness(http, MemoryCredentialStore::new(), ANON_PATH);

    let err = h.bootstrapper.bootstrap_from_url().await.unwrap_err();
    assert!(matches!(err, BootstrapError::MalformedResponse(_)));
}

// ════════════════════════════════════════════════════════════════════
// Connect
// ════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn connect_succeeds_on_third_attempt_with_identical_parameters() {
    let connector = ScriptedConnector::new(vec![Attempt::Fail, Attempt::Fail, Attempt::Succeed]);
    let user = LocalUser::new("u1", "t1");
    let params = player_params();
    let snapshot = params.clone();
    let start = Instant::now();

    let conn = ConnectionEstablisher::default()
        .connect(&connector, &user, &params, &CancelToken::new())
        .await
        .expect("eventually connects");

    let elapsed = start.elapsed();
    assert_eq!(conn.attempt, 3);
    assert_eq!(conn.auth_token, "t1");
    assert!(elapsed >= Duration::from_millis(8000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(12000), "{elapsed:?}");

    let attempts = connector.attempts.lock().unwrap();
    assert_eq!(attempts.len(), 3);
    assert!(attempts
        .iter()
        .all(|(token, seen)| token == "t1" && *seen == snapshot));
    assert_eq!(params, snapshot, "caller's tuple is untouched");
}

#[tokio::test]
async fn manager_connect_before_bootstrap_fails_fast() {
    let (http, requests) = MockHttpClient::new(vec![]);
    let h = harness(http, MemoryCredentialStore::new(), ANON_PATH);
    let manager = ConnectionManager::new(
        h.bootstrapper,
        ConnectionEstablisher::default(),
        ScriptedConnector::new(vec![Attempt::Succeed]),
    );

    let err = manager
        .connect_to_room(&player_params(), &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectError::MissingIdentity));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn manager_full_flow_uses_bootstrapped_token() {
    let (http, _requests) = MockHttpClient::new(vec![Ok(anonymous_login_json("u9", "t9"))]);
    let h = harness(http, MemoryCredentialStore::new(), ANON_PATH);
    let mut manager = ConnectionManager::new(
        h.bootstrapper,
        ConnectionEstablisher::default(),
        ScriptedConnector::new(vec![Attempt::Fail, Attempt::Succeed]),
    );

    let room = manager.init_game_connection().await.expect("bootstrap");
    let params = RoomParams::new(room.path.trim_start_matches('/'), "Alice");
    let conn = manager
        .connect_to_room(&params, &CancelToken::new())
        .await
        .expect("connect");

    assert_eq!(conn.attempt, 2);
    assert_eq!(conn.auth_token, "t9");
}

#[tokio::test(start_paused = true)]
async fn cancel_aborts_the_retry_loop() {
    let connector = Arc::new(ScriptedConnector::new(vec![Attempt::Fail; 100]));
    let cancel = CancelToken::new();

    let task = {
        let connector = Arc::clone(&connector);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            ConnectionEstablisher::default()
                .connect(&*connector, &LocalUser::new("u", "t"), &player_params(), &cancel)
                .await
        })
    };

    // Long enough for a handful of attempts (each backoff is < 6s).
    tokio::time::sleep(Duration::from_secs(20)).await;
    cancel.cancel();

    let err = task.await.expect("join").unwrap_err();
    assert!(matches!(err, ConnectError::Cancelled));
    let attempts = connector.attempt_count();
    assert!((4..=6).contains(&attempts), "attempts = {attempts}");
}

#[tokio::test(start_paused = true)]
async fn bounded_policy_reports_exhaustion() {
    let connector = ScriptedConnector::new(vec![Attempt::Fail; 5]);
    let establisher = ConnectionEstablisher::new(
        RetryPolicy::default()
            .with_base_delay(Duration::from_millis(100))
            .with_jitter(Duration::ZERO)
            .with_max_attempts(5),
    );
    let start = Instant::now();

    let err = establisher
        .connect(&connector, &LocalUser::new("u", "t"), &player_params(), &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectError::RetriesExhausted { attempts: 5, .. }));
    // Four backoffs between five attempts, none after the last.
    assert_eq!(start.elapsed(), Duration::from_millis(400));
}
