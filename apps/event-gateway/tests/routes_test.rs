mod common;

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;

use event_gateway::gateway::ConnectionHandle;

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_directory_size() {
    let (app, state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (handle, _rx) = ConnectionHandle::channel(4);
    state.directory.register(common::ALICE, handle);

    let resp = server.get("/health").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["users"], 1);
    assert_eq!(body["connections"], 1);
}

// ---------------------------------------------------------------------------
// POST /internal/events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn raise_event_fans_out_to_connected_members() {
    let (app, state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (handle, mut rx) = ConnectionHandle::channel(4);
    state.directory.register(common::BOB, handle);

    let resp = server
        .post("/internal/events")
        .json(&serde_json::json!({
            "event_type": "MessageEdited",
            "subject": common::GENERAL,
            "related": "msg_7",
        }))
        .await;

    resp.assert_status(StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["recipients"], 1);
    assert_eq!(body["connections"], 1);

    let frame = rx.recv().await.expect("delivered frame");
    let text = frame.into_text().expect("text frame");
    let event: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(event["event_type"], 2);
    assert_eq!(event["message"], "msg_7");
}

#[tokio::test]
async fn raise_event_with_nobody_connected_is_still_accepted() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/internal/events")
        .json(&serde_json::json!({
            "event_type": "UsernameChanged",
            "subject": common::ALICE,
        }))
        .await;

    resp.assert_status(StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["recipients"], 0);
}

#[tokio::test]
async fn raise_event_with_wrong_arity_is_bad_request() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/internal/events")
        .json(&serde_json::json!({
            "event_type": "MessageSent",
            "subject": common::GENERAL,
        }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn raise_event_with_unknown_name_is_rejected() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/internal/events")
        .json(&serde_json::json!({
            "event_type": "ServerExploded",
            "subject": common::GENERAL,
        }))
        .await;

    resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn detached_raise_returns_before_delivery_completes() {
    let (app, state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (handle, mut rx) = ConnectionHandle::channel(4);
    state.directory.register(common::ALICE, handle);

    let resp = server
        .post("/internal/events")
        .add_query_param("detach", "true")
        .json(&serde_json::json!({
            "event_type": "ChannelCreated",
            "subject": common::GENERAL,
        }))
        .await;
    resp.assert_status(StatusCode::ACCEPTED);

    let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout")
        .expect("delivered frame");
    let text = frame.into_text().expect("text frame");
    let event: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(event["event_type"], 3);
    assert_eq!(event["channel"], common::GENERAL);
}

#[tokio::test]
async fn detached_raise_still_checks_arity() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/internal/events")
        .add_query_param("detach", "true")
        .json(&serde_json::json!({
            "event_type": "MessageSent",
            "subject": common::GENERAL,
        }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// POST /internal/users/{user_id}/events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notify_user_reaches_only_that_user() {
    let (app, state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (alice, mut alice_rx) = ConnectionHandle::channel(4);
    let (bob, mut bob_rx) = ConnectionHandle::channel(4);
    state.directory.register(common::ALICE, alice);
    state.directory.register(common::BOB, bob);

    let resp = server
        .post(&format!("/internal/users/{}/events", common::BOB))
        .json(&serde_json::json!({
            "event_type": "ChannelDeleted",
            "channel": common::GENERAL,
        }))
        .await;

    resp.assert_status(StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["recipients"], 1);
    assert_eq!(body["connections"], 1);

    let frame = bob_rx.recv().await.expect("delivered frame");
    let text = frame.into_text().expect("text frame");
    let event: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(
        event,
        serde_json::json!({ "event_type": 4, "channel": common::GENERAL })
    );

    tokio::task::yield_now().await;
    assert!(alice_rx.try_recv().is_err());
}

#[tokio::test]
async fn notify_disconnected_user_reaches_nobody() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/internal/users/usr_nobody/events")
        .json(&serde_json::json!({ "event_type": "RefreshKeystore" }))
        .await;

    resp.assert_status(StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["recipients"], 0);
    assert_eq!(body["connections"], 0);
}

// ---------------------------------------------------------------------------
// DELETE /internal/connections/{user_id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disconnect_user_drops_every_handle() {
    let (app, state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let (first, _rx1) = ConnectionHandle::channel(4);
    let (second, _rx2) = ConnectionHandle::channel(4);
    state.directory.register(common::ALICE, first.clone());
    state.directory.register(common::ALICE, second.clone());

    let resp = server
        .delete(&format!("/internal/connections/{}", common::ALICE))
        .await;
    resp.assert_status(StatusCode::NO_CONTENT);

    assert!(!state.directory.contains(common::ALICE));
    assert!(!first.is_open());
    assert!(!second.is_open());
}

#[tokio::test]
async fn disconnect_unknown_user_is_a_no_op() {
    let (app, state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.delete("/internal/connections/usr_nobody").await;
    resp.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(state.directory.user_count(), 0);
}
