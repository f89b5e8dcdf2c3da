//! End-to-end controller tests over real HTTP
//!
//! Wires `ChatController` to `HttpChatClient` and a `wiremock` server to
//! check the whole path from a user action to the request on the wire and
//! back into controller state.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nexuschat::auth::StaticCredentialProvider;
use nexuschat::client::HttpChatClient;
use nexuschat::config::ApiConfig;
use nexuschat::session::{ChatMessage, ERROR_PREFIX};
use nexuschat::{ChatController, HistoryLoad, SendOutcome};

mod common;

fn make_controller(server: &MockServer, token: Option<&str>) -> ChatController {
    let client = HttpChatClient::new(&ApiConfig {
        base_url: server.uri(),
        timeout_ms: Some(5000),
    })
    .expect("valid client config");
    let credentials = match token {
        Some(token) => StaticCredentialProvider::new(token),
        None => StaticCredentialProvider::anonymous(),
    };
    ChatController::new(Arc::new(client), Arc::new(credentials))
}

async fn mount_history(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/chat/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::history_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_history_load_groups_and_orders_sessions() {
    let server = MockServer::start().await;
    mount_history(&server).await;
    let controller = make_controller(&server, Some("tok"));

    assert_eq!(
        controller.load_history().await,
        HistoryLoad::Loaded { sessions: 2 }
    );

    let sessions = controller.sessions();
    assert_eq!(sessions[0].id, "interview");
    assert_eq!(sessions[0].message_count, 4);
    assert_eq!(
        sessions[0].title,
        "How should I prepare for a system design interview..."
    );
    assert_eq!(sessions[1].id, "resume");
    assert!(controller.current_session_id().is_none());
}

#[tokio::test]
async fn test_send_in_selected_session_carries_session_id() {
    let server = MockServer::start().await;
    mount_history(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"content": "And formatting?", "session_id": "resume"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "Keep it to one page."})))
        .expect(1)
        .mount(&server)
        .await;
    let controller = make_controller(&server, Some("tok"));

    controller.load_history().await;
    assert!(controller.select_session("resume"));
    assert_eq!(controller.messages().len(), 2);

    let outcome = controller.send_message("And formatting?").await;
    assert_eq!(
        outcome,
        SendOutcome::Delivered {
            reply: "Keep it to one page.".to_string()
        }
    );

    let sessions = controller.sessions();
    assert_eq!(sessions[0].id, "resume");
    assert_eq!(sessions[0].message_count, 4);
    assert_eq!(
        controller.messages().last(),
        Some(&ChatMessage::assistant("Keep it to one page."))
    );
}

#[tokio::test]
async fn test_server_error_becomes_single_error_notice() {
    let server = MockServer::start().await;
    mount_history(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .mount(&server)
        .await;
    let controller = make_controller(&server, Some("tok"));

    controller.load_history().await;
    controller.select_session("interview");
    let sessions_before = controller.sessions();

    let outcome = controller.send_message("test").await;
    assert_eq!(
        outcome,
        SendOutcome::Failed {
            error: "Server error".to_string()
        }
    );

    let messages = controller.messages();
    let notices: Vec<_> = messages.iter().filter(|m| m.is_error()).collect();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].content, format!("{}Server error", ERROR_PREFIX));
    assert_eq!(messages[messages.len() - 2], ChatMessage::user("test"));
    assert_eq!(controller.sessions(), sessions_before);
    assert!(!controller.is_pending());
}

#[tokio::test]
async fn test_rejected_credential_shows_body_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;
    let controller = make_controller(&server, Some("stale"));

    let outcome = controller.send_message("hello").await;
    assert_eq!(
        outcome,
        SendOutcome::Failed {
            error: "token expired".to_string()
        }
    );
    assert_eq!(
        controller.messages().last(),
        Some(&ChatMessage::error("token expired"))
    );
}

#[tokio::test]
async fn test_anonymous_user_can_chat_but_not_load_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::history_body()))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "Welcome!"})))
        .expect(1)
        .mount(&server)
        .await;
    let controller = make_controller(&server, None);

    assert_eq!(controller.load_history().await, HistoryLoad::Unauthenticated);
    let outcome = controller.send_message("Hi").await;
    assert!(matches!(outcome, SendOutcome::Delivered { .. }));
    assert_eq!(controller.sessions().len(), 1);
}

#[tokio::test]
async fn test_history_auth_failure_leaves_sessions_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/history"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;
    let controller = make_controller(&server, Some("bad"));

    match controller.load_history().await {
        HistoryLoad::Failed(message) => assert!(message.contains("invalid token")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(controller.sessions().is_empty());
}

#[tokio::test]
async fn test_slow_history_does_not_clobber_new_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/history"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::history_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "quick reply"})))
        .mount(&server)
        .await;
    let controller = make_controller(&server, Some("tok"));

    let load = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.load_history().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    controller.send_message("typed before history arrived").await;

    assert_eq!(load.await.unwrap(), HistoryLoad::Stale);
    let sessions = controller.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].title, "typed before history arrived");
    assert_eq!(controller.current_session_id(), Some(sessions[0].id.clone()));
}
