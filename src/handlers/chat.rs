use crate::chat::{reply_chunks, NOT_INITIALIZED_CHUNK};
use crate::handlers::MessageInput;
use crate::server::AppContext;
use futures::Stream;
use rocket::http::ContentType;
use rocket::request::Request;
use rocket::response::stream::TextStream;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde_json::Value;
use tracing::{error, info};

/// Text stream served with event-stream headers.
pub struct EventStreamText<S>(pub TextStream<S>);

impl<'r, S> Responder<'r, 'r> for EventStreamText<S>
where
    S: Stream<Item = String> + Send + 'r,
{
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'r> {
        Response::build_from(self.0.respond_to(request)?)
            .header(ContentType::EventStream)
            .raw_header("Cache-Control", "no-cache")
            .raw_header("Connection", "keep-alive")
            .ok()
    }
}

#[post("/chat", data = "<input>")]
pub fn handle_chat(
    state: &State<AppContext>,
    input: Json<MessageInput>,
) -> EventStreamText<impl Stream<Item = String> + Send> {
    let MessageInput {
        message,
        session_state,
    } = input.into_inner();
    let thread_id = session_state
        .get("thread_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    info!(has_thread_id = thread_id.is_some(), "Received chat request");
    let session = state.chat_session();

    EventStreamText(TextStream! {
        match session {
            None => {
                yield NOT_INITIALIZED_CHUNK.to_string();
            }
            Some(session) => match session.post_user_message(&message, thread_id.as_deref()).await {
                Ok(_) => {
                    for chunk in reply_chunks(&message) {
                        yield chunk;
                    }
                }
                Err(e) => {
                    error!("Chat request failed: {}", e);
                    yield format!("Error: {}\n", e);
                }
            },
        }
    })
}

/// Conversation state lives on the agent service; nothing is kept locally.
#[get("/chat/history")]
pub fn handle_chat_history() -> Json<Vec<Value>> {
    Json(Vec::new())
}

#[cfg(test)]
mod tests {
    use crate::agents::mock::MockAgents;
    use crate::handlers::test_support::{client, test_agent};
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[rocket::async_test]
    async fn streams_informational_chunks() {
        let mock = Arc::new(MockAgents {
            known_threads: vec!["thread_7".to_string()],
            ..MockAgents::default()
        });
        let client = client(Some(mock.clone()), Some(test_agent())).await;

        let response = client
            .post("/chat")
            .header(ContentType::JSON)
            .body(json!({ "message": "tides", "session_state": { "thread_id": "thread_7" } }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::EventStream));
        assert_eq!(response.headers().get_one("Cache-Control"), Some("no-cache"));
        let text = response.into_string().await.unwrap();
        assert!(text.starts_with("Searching for information about: tides\n\n"));
        assert!(text.ends_with("for the message: 'tides'\n"));
        assert_eq!(
            mock.posted_messages.lock().unwrap()[0],
            ("thread_7".to_string(), "tides".to_string())
        );
    }

    #[rocket::async_test]
    async fn uninitialized_agent_streams_error_chunk() {
        let client = client(None, None).await;
        let response = client
            .post("/chat")
            .header(ContentType::JSON)
            .body(r#"{"message": "hi"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.into_string().await.unwrap(),
            "Error: Agent or AI Project client not initialized\n"
        );
    }

    #[rocket::async_test]
    async fn remote_failure_streams_error_chunk() {
        let mock = Arc::new(MockAgents {
            fail_messages: true,
            ..MockAgents::default()
        });
        let client = client(Some(mock.clone()), Some(test_agent())).await;

        let response = client
            .post("/chat")
            .header(ContentType::JSON)
            .body(r#"{"message": "tides"}"#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let text = response.into_string().await.unwrap();
        assert!(text.starts_with("Error: "), "{text}");
        assert!(text.contains("thread is locked"));
        assert!(text.ends_with('\n'));
        assert!(!text.contains("Searching for information"));
        assert!(mock.posted_messages.lock().unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn history_is_empty() {
        let client = client(None, None).await;
        let response = client.get("/chat/history").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body, json!([]));
    }
}
