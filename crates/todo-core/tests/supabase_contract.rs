//! Supabase Contract Tests
//!
//! Verify the exact HTTP requests sent to the auth (GoTrue) and PostgREST
//! endpoints and how their responses and errors are interpreted.

use std::sync::{Arc, Mutex};

use serde_json::json;
use todo_core::repository::supabase::{SignUpOutcome, SupabaseClient};
use todo_core::repository::{auth_callback, MemorySessionStore, SessionStore};
use todo_core::{
    AuthEvent, AuthState, DomainError, IdentityService, NewTodo, Session, SessionManager,
    SupabaseConfig, TodoList, TodoRepository, User, UserId,
};
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-key";

fn client_for(server: &MockServer, store: Arc<MemorySessionStore>) -> SupabaseClient {
    let config = SupabaseConfig::new(&server.uri(), ANON_KEY).expect("valid config");
    SupabaseClient::new(config, store)
}

fn token_body(user_id: &str, access_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": format!("refresh-{}", user_id),
        "user": {"id": user_id, "email": "user@example.com"}
    })
}

/// Store a never-expiring session as if a previous page load had signed in
fn persisted_session(store: &MemorySessionStore, user_id: &str, access_token: &str) {
    let mut session = Session::for_user(User::new(user_id));
    session.access_token = access_token.to_string();
    session.refresh_token = format!("refresh-{}", user_id);
    store.save(&serde_json::to_string(&session).unwrap()).unwrap();
}

fn recorded_events(client: &SupabaseClient) -> (Arc<Mutex<Vec<AuthEvent>>>, todo_core::Subscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let subscription = client
        .identity()
        .on_auth_state_change(auth_callback(move |event, _| sink.lock().unwrap().push(event)));
    (events, subscription)
}

// ────────────────────────────────────────────────────────────────────────────
// Auth
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_password_sign_in_stores_session_and_emits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .and(body_json(json!({"email": "user@example.com", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("u1", "jwt-1")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let client = client_for(&server, store.clone());
    let (events, _subscription) = recorded_events(&client);

    let session = client
        .auth()
        .sign_in_with_password("user@example.com", "hunter22")
        .await
        .expect("sign in");

    assert_eq!(session.user_id(), &UserId::from("u1"));
    assert!(session.expires_at.is_some());
    assert!(store.load().expect("persisted").contains("jwt-1"));
    assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedIn]);
}

#[tokio::test]
async fn test_bad_credentials_surface_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    let err = client
        .auth()
        .sign_in_with_password("user@example.com", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err, DomainError::service(400, "Invalid login credentials"));
    assert!(client.identity().get_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_sign_up_pending_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(body_partial_json(json!({"email": "new@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u9",
            "email": "new@example.com",
            "confirmation_sent_at": "2024-03-01T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    let outcome = client.auth().sign_up("new@example.com", "secret1").await.unwrap();

    match outcome {
        SignUpOutcome::ConfirmationSent(user) => assert_eq!(user.id, UserId::from("u9")),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(client.identity().get_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_sign_up_auto_confirmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("u9", "jwt-9")))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    let outcome = client.auth().sign_up("new@example.com", "secret1").await.unwrap();

    assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
    let session = client.identity().get_session().await.unwrap().expect("session");
    assert_eq!(session.access_token, "jwt-9");
}

#[tokio::test]
async fn test_oauth_redirect_fragment_completes_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer jwt-gh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "gh-user", "email": null})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    let (events, _subscription) = recorded_events(&client);

    let session = client
        .auth()
        .session_from_url_fragment(
            "#access_token=jwt-gh&expires_in=3600&refresh_token=r-gh&token_type=bearer&type=signup",
        )
        .await
        .unwrap()
        .expect("session from fragment");

    assert_eq!(session.user_id(), &UserId::from("gh-user"));
    assert_eq!(session.refresh_token, "r-gh");
    assert_eq!(session.expires_in, 3600);
    assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedIn]);
}

#[tokio::test]
async fn test_expired_session_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({"refresh_token": "refresh-u1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("u1", "jwt-new")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let mut expired = Session::for_user(User::new("u1"));
    expired.refresh_token = "refresh-u1".to_string();
    expired.expires_at = Some(1);
    store.save(&serde_json::to_string(&expired).unwrap()).unwrap();

    let client = client_for(&server, store);
    let (events, _subscription) = recorded_events(&client);

    let session = client.identity().get_session().await.unwrap().expect("session");
    assert_eq!(session.access_token, "jwt-new");
    assert_eq!(*events.lock().unwrap(), vec![AuthEvent::TokenRefreshed]);
}

#[tokio::test]
async fn test_failed_refresh_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid Refresh Token: Refresh Token Not Found"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let mut expired = Session::for_user(User::new("u1"));
    expired.refresh_token = "stale".to_string();
    expired.expires_at = Some(1);
    store.save(&serde_json::to_string(&expired).unwrap()).unwrap();

    let client = client_for(&server, store.clone());
    let (events, _subscription) = recorded_events(&client);

    assert!(client.identity().get_session().await.is_err());
    assert!(store.load().is_none());
    assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedOut]);
}

fn expired_session(store: &MemorySessionStore, refresh_token: &str) {
    let mut expired = Session::for_user(User::new("u1"));
    expired.access_token = "jwt-old".to_string();
    expired.refresh_token = refresh_token.to_string();
    expired.expires_at = Some(1);
    store.save(&serde_json::to_string(&expired).unwrap()).unwrap();
}

#[tokio::test]
async fn test_unreachable_refresh_keeps_session() {
    let config = SupabaseConfig::new("http://127.0.0.1:1", ANON_KEY).unwrap();
    let store = Arc::new(MemorySessionStore::new());
    expired_session(&store, "r1");
    let client = SupabaseClient::new(config, store.clone());
    let (events, _subscription) = recorded_events(&client);

    let err = client.identity().get_session().await.unwrap_err();

    assert!(matches!(err, DomainError::Network(_)), "got {:?}", err);
    assert!(store.load().is_some());
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_server_error_fails_request_without_anon_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    expired_session(&store, "r1");
    let client = client_for(&server, store.clone());

    let err = client.todos().list_for_user(&UserId::from("u1")).await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(store.load().is_some());
}

#[tokio::test]
async fn test_concurrent_requests_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(body_json(json!({"refresh_token": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("u1", "jwt-new")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    // A second use of the same refresh token is rejected
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid Refresh Token: Already Used"
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/todos"))
        .and(header("authorization", "Bearer jwt-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    expired_session(&store, "r1");
    let client = client_for(&server, store.clone());
    let repo = client.todos();
    let user = UserId::from("u1");

    let (first, second) = tokio::join!(repo.list_for_user(&user), repo.list_for_user(&user));

    assert!(first.is_ok());
    assert!(second.is_ok());
    let stored: Session = serde_json::from_str(&store.load().expect("session kept")).unwrap();
    assert_eq!(stored.access_token, "jwt-new");
}

#[tokio::test]
async fn test_sign_out_revokes_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    persisted_session(&store, "u1", "jwt-1");
    let client = client_for(&server, store.clone());

    let manager = SessionManager::new(client.identity(), |_| {});
    manager.resolve_initial().await;
    assert_eq!(manager.current_user(), Some(User::new("u1")));

    client.identity().sign_out().await.expect("sign out");

    assert!(store.load().is_none());
    assert_eq!(manager.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_sign_out_of_unknown_session_still_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"msg": "Session not found"})))
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    persisted_session(&store, "u1", "jwt-1");
    let client = client_for(&server, store.clone());

    client.identity().sign_out().await.expect("treated as signed out");
    assert!(store.load().is_none());
}

#[tokio::test]
async fn test_sign_out_server_error_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    persisted_session(&store, "u1", "jwt-1");
    let client = client_for(&server, store.clone());

    let err = client.identity().sign_out().await.unwrap_err();
    assert_eq!(err, DomainError::service(500, "boom"));
    assert!(store.load().is_some());
}

#[tokio::test]
async fn test_manager_releases_listener_on_shutdown() {
    let server = MockServer::start().await;
    let client = client_for(&server, Arc::new(MemorySessionStore::new()));

    let manager = SessionManager::new(client.identity(), |_| {});
    assert_eq!(client.auth().listener_count(), 1);
    manager.shutdown();
    assert_eq!(client.auth().listener_count(), 0);
}

// ────────────────────────────────────────────────────────────────────────────
// PostgREST
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_filters_and_orders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/todos"))
        .and(query_param("select", "*"))
        .and(query_param("user_id", "eq.u1"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "task": "newer", "is_complete": true, "user_id": "u1",
             "created_at": "2024-03-01T10:00:01+00:00"},
            {"id": 1, "task": "older", "is_complete": false, "user_id": "u1",
             "created_at": "2024-03-01T10:00:00+00:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    persisted_session(&store, "u1", "jwt-1");
    let client = client_for(&server, store);

    let todos = client.todos().list_for_user(&UserId::from("u1")).await.unwrap();
    let tasks: Vec<&str> = todos.iter().map(|t| t.task.as_str()).collect();
    assert_eq!(tasks, vec!["newer", "older"]);
}

#[tokio::test]
async fn test_anonymous_requests_use_anon_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/todos"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    let todos = client.todos().list_for_user(&UserId::from("u1")).await.unwrap();
    assert!(todos.is_empty());
}

#[tokio::test]
async fn test_insert_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/todos"))
        .and(header("prefer", "return=minimal"))
        .and(body_json(json!([{"task": "Buy milk", "user_id": "u1"}])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    client
        .todos()
        .insert(&NewTodo::new("Buy milk", UserId::from("u1")))
        .await
        .expect("insert");
}

#[tokio::test]
async fn test_update_request() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/todos"))
        .and(query_param("id", "eq.5"))
        .and(body_json(json!({"is_complete": true})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    client.todos().set_complete(5, true).await.expect("update");
}

#[tokio::test]
async fn test_delete_request() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/todos"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    client.todos().delete(5).await.expect("delete");
}

#[tokio::test]
async fn test_postgrest_error_is_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/todos"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301",
            "message": "JWT expired",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    let err = client.todos().list_for_user(&UserId::from("u1")).await.unwrap_err();
    assert_eq!(err, DomainError::service(401, "JWT expired"));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let config = SupabaseConfig::new("http://127.0.0.1:1", ANON_KEY).unwrap();
    let client = SupabaseClient::new(config, Arc::new(MemorySessionStore::new()));
    let err = client.todos().delete(1).await.unwrap_err();
    assert!(matches!(err, DomainError::Network(_)));
}

// ────────────────────────────────────────────────────────────────────────────
// View-model against HTTP
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_todo_list_failed_fetch_keeps_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "task": "kept", "is_complete": false, "user_id": "u1"}
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/todos"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    let list = TodoList::new(client.todos(), client.identity(), UserId::from("u1"));

    list.fetch_all().await;
    let before = list.todos();
    assert_eq!(before.len(), 1);

    list.fetch_all().await;
    assert_eq!(list.todos(), before);
}

#[tokio::test]
async fn test_todo_list_add_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/todos"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "task": "Buy milk", "is_complete": false, "user_id": "u1"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemorySessionStore::new()));
    let list = TodoList::new(client.todos(), client.identity(), UserId::from("u1"));
    list.set_draft("Buy milk");

    list.add("Buy milk").await;

    assert_eq!(list.draft(), "");
    assert_eq!(list.todos()[0].task, "Buy milk");
}
