//! Integration tests for the learning session against a mock completion API.
//!
//! Each test points a `GroqConnector` at a wiremock server, so the full
//! HTTP path (headers, body, status mapping) is exercised without a key.

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use learnindeep::chat::TutorSession;
use learnindeep::{
    ChatRole, ErrorContext, GroqConnector, KnowledgeLevel, KnownModel, Model,
    PROFESSOR_SYSTEM_PROMPT,
};

const COMPLETIONS: &str = "/openai/v1/chat/completions";

fn session_for(server: &MockServer) -> TutorSession<GroqConnector> {
    let connector =
        GroqConnector::with_options(Some(format!("{}/openai/v1", server.uri())), None).unwrap();
    TutorSession::with_connector(connector)
}

fn completion(text: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "llama-3.1-8b-instant",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 42, "completion_tokens": 8, "total_tokens": 50}
    })
}

async fn mount_reply(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(text)))
        .mount(server)
        .await;
}

async fn start(
    session: &mut TutorSession<GroqConnector>,
    credential: &str,
) -> learnindeep::Result<()> {
    session
        .start_topic(
            "graph theory",
            KnowledgeLevel::Intermediate,
            credential,
            Model::Known(KnownModel::Llama31_8bInstant),
            0.5,
        )
        .await
        .map(|_| ())
}

#[tokio::test]
async fn start_topic_sends_prompt_and_records_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .and(header("authorization", "Bearer gsk_test"))
        .and(body_partial_json(json!({
            "model": "llama-3.1-8b-instant",
            "temperature": 0.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "Hello! I am your professor. Here is the roadmap...",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    start(&mut session, "gsk_test").await.unwrap();

    assert!(session.is_started());
    assert_eq!(session.topic(), "graph theory");
    assert_eq!(session.message_count(), 3);
    assert_eq!(
        session.last_reply(),
        Some("Hello! I am your professor. Here is the roadmap...")
    );

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], PROFESSOR_SYSTEM_PROMPT);
    assert_eq!(messages[1]["role"], "user");
    let opening = messages[1]["content"].as_str().unwrap();
    assert!(opening.contains("I want to learn graph theory."));
    assert!(opening.contains("My current knowledge level is: Intermediate."));

    let stats = session.stats();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.total_usage.total_tokens, 50);
}

#[tokio::test]
async fn empty_credential_never_reaches_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let err = start(&mut session, "").await.unwrap_err();
    assert!(err.is_validation());
    assert!(!session.is_started());
    assert_eq!(session.message_count(), 0);
}

#[tokio::test]
async fn invalid_key_leaves_session_not_started() {
    let server = MockServer::start().await;
    mount_reply(&server, "Lesson 1").await;

    let mut session = session_for(&server);
    start(&mut session, "gsk_good").await.unwrap();
    assert!(session.is_started());

    server.reset().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Invalid API Key",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = start(&mut session, "gsk_bad").await.unwrap_err();
    assert!(err.is_authentication());
    assert!(err.is_credential_failure());
    assert!(err.to_string().contains("invalid_api_key"));
    let hint = err.credential_hint(ErrorContext::Start).unwrap();
    assert!(hint.contains("https://console.groq.com/keys"));

    assert!(!session.is_started());
    assert!(!session.has_client());
    assert_eq!(session.message_count(), 0);
    assert_eq!(session.topic(), "");
}

#[tokio::test]
async fn turns_resend_the_whole_transcript() {
    let server = MockServer::start().await;
    mount_reply(&server, "Noted.").await;

    let mut session = session_for(&server);
    start(&mut session, "gsk_test").await.unwrap();
    for question in ["What is a vertex?", "And an edge?", "Give me an exercise"] {
        session.send_turn(question).await.unwrap();
    }

    assert_eq!(session.message_count(), 9);
    assert_eq!(session.visible_messages().len(), 8);

    let requests = server.received_requests().await.unwrap();
    let sizes: Vec<usize> = requests
        .iter()
        .map(|request| {
            let body: Value = request.body_json().unwrap();
            body["messages"].as_array().unwrap().len()
        })
        .collect();
    assert_eq!(sizes, vec![2, 4, 6, 8]);
}

#[tokio::test]
async fn failed_turn_keeps_the_question() {
    let server = MockServer::start().await;
    mount_reply(&server, "Lesson 1").await;

    let mut session = session_for(&server);
    start(&mut session, "gsk_test").await.unwrap();

    server.reset().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "12")
                .set_body_json(json!({
                    "error": {"message": "Rate limit reached", "type": "tokens"}
                })),
        )
        .mount(&server)
        .await;

    let err = session
        .send_turn("Why does Dijkstra fail on negative edges?")
        .await
        .unwrap_err();
    assert!(err.is_rate_limit());
    assert!(err.to_string().contains("retry after 12 seconds"));
    assert!(err.credential_hint(ErrorContext::Turn).is_none());

    assert!(session.is_started());
    assert_eq!(session.message_count(), 4);
    let last = session.messages().last().unwrap();
    assert_eq!(last.role, ChatRole::User);
    assert_eq!(last.content, "Why does Dijkstra fail on negative edges?");
}

#[tokio::test]
async fn context_overflow_is_a_bad_request() {
    let server = MockServer::start().await;
    mount_reply(&server, "Lesson 1").await;

    let mut session = session_for(&server);
    start(&mut session, "gsk_test").await.unwrap();

    server.reset().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Please reduce the length of the messages",
                "type": "invalid_request_error",
                "code": "context_length_exceeded"
            }
        })))
        .mount(&server)
        .await;

    let err = session.send_turn("Keep going").await.unwrap_err();
    assert!(err.is_bad_request());
    assert!(!err.is_credential_failure());
    assert!(session.is_started());
}

#[tokio::test]
async fn server_errors_do_not_start_a_topic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let err = start(&mut session, "gsk_test").await.unwrap_err();
    assert!(matches!(err, learnindeep::Error::ServiceUnavailable { .. }));
    assert!(err.to_string().contains("upstream unavailable"));
    assert!(!session.is_started());
    assert_eq!(session.message_count(), 0);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let connector =
        GroqConnector::with_options(Some(format!("http://{addr}/openai/v1")), None).unwrap();
    let mut session = TutorSession::with_connector(connector);
    let err = start(&mut session, "gsk_test").await.unwrap_err();
    assert!(err.is_connection());
    assert!(err.to_string().starts_with("Connection error: "));
    assert!(!err.to_string().contains("Connection error: Connection error"));
    assert!(!session.is_started());
    assert_eq!(session.message_count(), 0);
}

#[tokio::test]
async fn reset_discards_topic_and_client() {
    let server = MockServer::start().await;
    mount_reply(&server, "Lesson 1").await;

    let mut session = session_for(&server);
    start(&mut session, "gsk_test").await.unwrap();
    session.reset();

    assert!(!session.is_started());
    assert!(!session.has_client());
    assert_eq!(session.message_count(), 0);
    assert_eq!(session.topic(), "");
    assert!(session.send_turn("still there?").await.unwrap_err().is_validation());
}

#[tokio::test]
async fn transcript_round_trips_through_a_file() {
    let server = MockServer::start().await;
    mount_reply(&server, "Lesson 1: vertices").await;

    let dir = tempfile::tempdir().unwrap();
    let auto_path = dir.path().join("auto.json");

    let mut session = session_for(&server);
    session.set_transcript_path(Some(auto_path.clone()));
    start(&mut session, "gsk_test").await.unwrap();
    session.send_turn("next").await.unwrap();
    assert!(auto_path.exists());

    let raw = std::fs::read_to_string(&auto_path).unwrap();
    let saved: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(saved["version"], 1);
    assert_eq!(saved["topic"], "graph theory");
    assert_eq!(saved["level"], "Intermediate");
    assert_eq!(saved["messages"].as_array().unwrap().len(), 5);
    assert!(saved["saved_at"].as_str().unwrap().contains('T'));

    // Loading needs an active topic, then replaces the history.
    let mut other = session_for(&server);
    assert!(other.load_transcript_from(&auto_path).unwrap_err().is_validation());
    other
        .start_topic("chess", KnowledgeLevel::Advanced, "gsk_test", Model::default(), 0.7)
        .await
        .unwrap();
    other.load_transcript_from(&auto_path).unwrap();
    assert_eq!(other.topic(), "graph theory");
    assert_eq!(other.level(), Some(KnowledgeLevel::Intermediate));
    assert_eq!(other.message_count(), 5);
    assert!(other.messages()[0].is_system());
}

#[tokio::test]
async fn loading_garbage_keeps_the_current_transcript() {
    let server = MockServer::start().await;
    mount_reply(&server, "Lesson 1").await;

    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{\"version\": 1, \"messages\": 7}").unwrap();

    let mut session = session_for(&server);
    start(&mut session, "gsk_test").await.unwrap();
    let err = session.load_transcript_from(&bad).unwrap_err();
    assert!(matches!(err, learnindeep::Error::Serialization { .. }));
    assert_eq!(session.message_count(), 3);
    assert_eq!(session.topic(), "graph theory");
}
