use llmtrans::config::{Config, ConnectionMode, Endpoint, RequestParams};
use llmtrans::{ChatBackend, ChatMessage, ErrorKind, Role, TranslateError, TranslationClient};
use mockito::{Matcher, Server, ServerGuard};
use reqwest::Url;
use serde_json::json;
use std::time::Duration;

const PATH: &str = "/v1/chat/completions";

fn endpoint(server: &ServerGuard, api_key: Option<&str>, model: Option<&str>) -> Endpoint {
    Endpoint {
        url: Url::parse(&format!("{}{}", server.url(), PATH)).unwrap(),
        api_key: api_key.map(str::to_string),
        model: model.map(str::to_string),
    }
}

fn client(ep: Endpoint) -> TranslationClient {
    TranslationClient::new(ep, RequestParams::default(), Duration::from_secs(5)).unwrap()
}

fn messages() -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(Role::System, "Translate."),
        ChatMessage::new(Role::User, "Hello"),
        ChatMessage::new(Role::Assistant, "Привет"),
        ChatMessage::new(Role::User, "Good morning"),
    ]
}

fn reply(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn posts_wire_contract_and_returns_sanitized_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("authorization", "Bearer sk-test")
        .match_header("content-type", Matcher::Regex("application/json".into()))
        .match_body(Matcher::Json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.0,
            "max_tokens": 1024,
            "stream": false,
            "tool_choice": "none",
            "enable_thinking": false,
            "messages": [
                {"role": "system", "content": "Translate."},
                {"role": "user", "content": "Hello"},
                {"role": "assistant", "content": "Привет"},
                {"role": "user", "content": "Good morning"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(reply("<think>\nThe user wants Russian.\n</think>\n\nДоброе утро"))
        .expect(1)
        .create_async()
        .await;

    let c = client(endpoint(&server, Some("sk-test"), Some("gpt-4o-mini")));
    let text = c.send(&messages()).await.unwrap();
    assert_eq!(text, "Доброе утро");
    mock.assert_async().await;
}

#[tokio::test]
async fn no_authorization_header_without_key() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(reply("ok"))
        .create_async()
        .await;

    let c = client(endpoint(&server, Some(""), None));
    assert_eq!(c.send(&messages()).await.unwrap(), "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn non_200_is_transport_error_without_retry() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(503)
        .with_body("model is loading")
        .expect(1)
        .create_async()
        .await;

    let err = client(endpoint(&server, None, None)).send(&messages()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    match err {
        TranslateError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "model is loading");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn other_success_codes_are_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(201)
        .with_body(reply("created?"))
        .create_async()
        .await;

    let err = client(endpoint(&server, None, None)).send(&messages()).await.unwrap_err();
    assert!(matches!(err, TranslateError::Status { status: 201, .. }));
}

#[tokio::test]
async fn undecodable_body_is_protocol_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let err = client(endpoint(&server, None, None)).send(&messages()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn empty_choices_is_empty_response() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(json!({"choices": []}).to_string())
        .create_async()
        .await;

    let err = client(endpoint(&server, None, None)).send(&messages()).await.unwrap_err();
    assert!(matches!(err, TranslateError::EmptyResponse));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut cfg = Config::default();
    cfg.mode = ConnectionMode::Offline;
    cfg.offline.port = port;

    let err = TranslationClient::from_config(&cfg)
        .unwrap()
        .send(&messages())
        .await
        .unwrap_err();
    assert!(matches!(err, TranslateError::Transport(_)));
}

#[tokio::test]
async fn extra_flags_reach_the_wire() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_body(Matcher::PartialJson(json!({"top_p": 0.5, "stream": false})))
        .with_status(200)
        .with_body(reply("ok"))
        .create_async()
        .await;

    let mut params = RequestParams::default();
    params.extra.insert("top_p".into(), json!(0.5));
    let c = TranslationClient::new(endpoint(&server, None, None), params, Duration::from_secs(5)).unwrap();
    c.send(&messages()).await.unwrap();
    mock.assert_async().await;
}
