use super::*;

use shared::domain::ReminderPriority;

use crate::test_support::{sample_reminder, signed_in_transport, spawn_backend, TEST_PASSWORD};

#[tokio::test]
async fn login_stores_token_and_caches_current_user() {
    let (server_url, backend) = spawn_backend(Vec::new()).await;
    let session = Arc::new(Session::in_memory());
    let transport =
        ApiTransport::with_client(Client::new(), &server_url, session.clone(), EventBus::new());

    let user = transport.login("dana", TEST_PASSWORD).await.expect("login");
    assert_eq!(user.username, "dana");
    assert!(session.is_authenticated().await);

    let again = transport.current_user().await.expect("who am i");
    assert_eq!(again, user);
    assert_eq!(backend.lock().await.me_calls, 1);
}

#[tokio::test]
async fn bad_credentials_surface_backend_detail_without_login_event() {
    let (server_url, _backend) = spawn_backend(Vec::new()).await;
    let events = EventBus::new();
    let mut rx = events.subscribe();
    let transport = ApiTransport::with_client(
        Client::new(),
        &server_url,
        Arc::new(Session::in_memory()),
        events,
    );

    let err = transport.login("dana", "wrong").await.expect_err("must fail");
    match &err {
        ClientError::Rejected { status, detail, .. } => {
            assert_eq!(*status, 401);
            assert_eq!(detail.as_deref(), Some("Incorrect username or password"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unauthorized_response_clears_session_and_requests_login() {
    let (server_url, _backend) = spawn_backend(vec![sample_reminder(1, ReminderPriority::Low, 1)]).await;
    let session = Arc::new(Session::in_memory());
    session.set_token("expired".into()).await.expect("token");
    let events = EventBus::new();
    let mut rx = events.subscribe();
    let transport = ApiTransport::with_client(Client::new(), &server_url, session.clone(), events);

    let err = transport
        .get_json::<Vec<shared::protocol::Reminder>, _>("/reminders", &())
        .await
        .expect_err("must fail");

    assert!(matches!(err, ClientError::Unauthorized));
    assert!(!session.is_authenticated().await);
    assert_eq!(rx.recv().await.expect("event"), ClientEvent::LoginRequired);
}

#[tokio::test]
async fn who_am_i_with_expired_token_does_not_deadlock() {
    let (server_url, _backend) = spawn_backend(Vec::new()).await;
    let session = Arc::new(Session::in_memory());
    session.set_token("expired".into()).await.expect("token");
    let transport =
        ApiTransport::with_client(Client::new(), &server_url, session.clone(), EventBus::new());

    let err = tokio::time::timeout(std::time::Duration::from_secs(5), transport.current_user())
        .await
        .expect("no deadlock")
        .expect_err("must fail");
    assert!(matches!(err, ClientError::Unauthorized));
}

#[tokio::test]
async fn requests_without_token_fail_before_hitting_network() {
    let transport = ApiTransport::with_client(
        Client::new(),
        "http://127.0.0.1:9",
        Arc::new(Session::in_memory()),
        EventBus::new(),
    );
    let err = transport
        .get_json::<serde_json::Value, _>("/reminders", &())
        .await
        .expect_err("must fail");
    assert!(matches!(err, ClientError::NotLoggedIn));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let (server_url, _backend) = spawn_backend(Vec::new()).await;
    let (transport, _events) = signed_in_transport(&server_url).await;
    transport.logout().await.expect("logout");
    assert!(!transport.session().is_authenticated().await);
}
