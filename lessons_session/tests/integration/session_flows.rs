//! End-to-end session flows: HTTP identity client + file-backed store

use axum::http::StatusCode;
use lessons_session::{
    Access, AccessRequirement, FilePersistentStore, PersistentStore, RetryOutcome, RetryPolicy,
    Session, SessionConfig, SessionManager, SessionStatus,
};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{
    MockIdentityServer, http_client, init_test_tracing, manual_config, temp_store_path,
    user_json, user_record,
};

fn manager_on(
    path: &std::path::Path,
    server: &MockIdentityServer,
    config: SessionConfig,
) -> SessionManager {
    SessionManager::start(
        Arc::new(FilePersistentStore::new(path)),
        Arc::new(http_client(server)),
        config,
    )
}

#[tokio::test]
async fn test_sign_in_survives_reload() {
    init_test_tracing();
    let server = MockIdentityServer::start().await;
    server.state.add_user("tok-1", user_json("u-1", false));
    let path = temp_store_path();

    // Given a user signing in through the identity endpoint
    let first = manager_on(&path, &server, manual_config());
    let session = first.sign_in_with_token("tok-1").await.unwrap();
    assert_eq!(session.status, SessionStatus::Authenticated);

    // When the application restarts on the same store
    let reloaded = manager_on(&path, &server, manual_config());

    // Then the session is back without a network round-trip
    let restored = reloaded.session();
    assert_eq!(restored.status, SessionStatus::Authenticated);
    assert_eq!(restored.token.as_deref(), Some("tok-1"));
    assert_eq!(restored.user, Some(user_record("u-1", false)));
    assert_eq!(server.state.request_count(), 1);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_corrupt_store_file_does_not_block_sign_in() {
    init_test_tracing();
    let server = MockIdentityServer::start().await;
    let path = temp_store_path();

    // Given a store file that was left corrupt
    std::fs::write(&path, "{ not json").unwrap();
    let manager = manager_on(&path, &server, manual_config());
    assert_eq!(manager.session().status, SessionStatus::Unauthenticated);

    // When the user signs in
    manager.login("tok-1", user_record("u-1", false)).unwrap();

    // Then the next start restores the new session
    let reloaded = manager_on(&path, &server, manual_config());
    assert_eq!(reloaded.session().status, SessionStatus::Authenticated);
    assert_eq!(reloaded.session().user, Some(user_record("u-1", false)));

    std::fs::remove_file(&path).ok();
    let mut aside = path.clone().into_os_string();
    aside.push(".corrupt");
    std::fs::remove_file(aside).ok();
}

#[tokio::test]
async fn test_restore_revalidates_in_background() {
    init_test_tracing();
    let server = MockIdentityServer::start().await;
    server.state.add_user("tok-1", user_json("u-1", false));
    let path = temp_store_path();
    manager_on(&path, &server, manual_config())
        .login("tok-1", user_record("u-1", false))
        .unwrap();

    // The backend has since upgraded the account
    server.state.add_user("tok-1", user_json("u-1", true));
    let manager = manager_on(&path, &server, SessionConfig::default());
    assert!(manager.session().is_authenticated());

    let settled = manager.refresh().await;

    assert_eq!(settled.status, SessionStatus::Authenticated);
    assert!(settled.is_premium());
    assert_eq!(server.state.request_count(), 1);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_revoked_token_signs_out_and_clears_store() {
    init_test_tracing();
    let server = MockIdentityServer::start().await;
    server.state.add_user("tok-1", user_json("u-1", false));
    let path = temp_store_path();
    let manager = manager_on(&path, &server, manual_config());
    manager.sign_in_with_token("tok-1").await.unwrap();

    // When the backend revokes the token
    server.state.revoke("tok-1");
    let session = manager.refresh().await;

    // Then the session is gone in memory and on disk
    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert_eq!(
        manager.check_access(AccessRequirement::Authenticated),
        Access::RedirectToLogin
    );
    let store = FilePersistentStore::new(&path);
    assert_eq!(store.get("lessons:token").unwrap(), None);
    assert_eq!(store.get("lessons:user").unwrap(), None);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_backend_outage_keeps_user_signed_in() {
    init_test_tracing();
    let server = MockIdentityServer::start().await;
    server.state.add_user("tok-1", user_json("u-1", false));
    let path = temp_store_path();
    let manager = manager_on(&path, &server, manual_config());
    manager.sign_in_with_token("tok-1").await.unwrap();

    server.state.force_status(Some(StatusCode::SERVICE_UNAVAILABLE));
    let session = manager.refresh().await;

    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.user, Some(user_record("u-1", false)));
    assert_eq!(
        FilePersistentStore::new(&path).get("lessons:token").unwrap(),
        Some("tok-1".to_string())
    );

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_premium_sync_after_payment_redirect() {
    init_test_tracing();
    let server = MockIdentityServer::start().await;
    server.state.add_user("tok-1", user_json("u-1", false));
    let path = temp_store_path();
    let config = SessionConfig {
        revalidate_on_start: false,
        premium_sync: RetryPolicy::new(5, Duration::from_millis(20)),
        ..SessionConfig::default()
    };
    let manager = manager_on(&path, &server, config);
    manager.sign_in_with_token("tok-1").await.unwrap();
    assert_eq!(
        manager.check_access(AccessRequirement::Premium),
        Access::Forbidden
    );

    // Given the payment callback lands after the third identity request
    server.state.grant_premium_after("tok-1", 4);

    // When waiting for the premium flag
    let outcome = manager.spawn_premium_sync().outcome().await;

    // Then the wait ends as soon as the flag shows up
    assert!(outcome.is_satisfied());
    assert_eq!(
        manager.check_access(AccessRequirement::Premium),
        Access::Granted
    );
    // One sign-in lookup plus three polls
    assert_eq!(server.state.request_count(), 4);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_premium_sync_gives_up_quietly() {
    init_test_tracing();
    let server = MockIdentityServer::start().await;
    server.state.add_user("tok-1", user_json("u-1", false));
    let path = temp_store_path();
    let manager = manager_on(&path, &server, manual_config());
    manager.login("tok-1", user_record("u-1", false)).unwrap();

    let outcome = manager
        .refresh_until(&RetryPolicy::new(3, Duration::from_millis(10)), Session::is_premium)
        .await;

    match outcome {
        RetryOutcome::Pending(session) => {
            assert_eq!(session.status, SessionStatus::Authenticated);
            assert!(!session.is_premium());
        }
        other => panic!("Expected Pending, got {other:?}"),
    }
    assert_eq!(server.state.request_count(), 3);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_two_tabs_share_the_store() {
    init_test_tracing();
    let server = MockIdentityServer::start().await;
    server.state.add_user("tok-1", user_json("u-1", false));
    let path = temp_store_path();

    let tab_a = manager_on(&path, &server, manual_config());
    tab_a.sign_in_with_token("tok-1").await.unwrap();
    let tab_b = manager_on(&path, &server, manual_config());
    assert!(tab_b.session().is_authenticated());

    // Tab A signs out; tab B keeps its in-memory session until it re-reads
    tab_a.logout().unwrap();
    assert!(tab_b.session().is_authenticated());

    tab_b.restore();
    assert_eq!(tab_b.session().status, SessionStatus::Unauthenticated);

    std::fs::remove_file(&path).ok();
}
