use crate::agents::{AgentError, AgentsClient, NewMessage};
use std::sync::Arc;
use tracing::{debug, info};

pub const NOT_INITIALIZED_CHUNK: &str = "Error: Agent or AI Project client not initialized\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOrigin {
    Resumed,
    CreatedNew,
    CreatedFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub thread_id: String,
    pub origin: ThreadOrigin,
}

/// Conversation handle for the streaming chat surface.
pub struct ChatSession {
    agents: Arc<dyn AgentsClient>,
}

impl ChatSession {
    pub fn new(agents: Arc<dyn AgentsClient>) -> Self {
        ChatSession { agents }
    }

    /// Reuses `thread_id` when it still resolves, otherwise opens a new thread.
    pub async fn resolve_thread(&self, thread_id: Option<&str>) -> Result<ChatTurn, AgentError> {
        if let Some(thread_id) = thread_id.filter(|id| !id.trim().is_empty()) {
            match self.agents.get_thread(thread_id).await {
                Ok(thread) => {
                    return Ok(ChatTurn {
                        thread_id: thread.id,
                        origin: ThreadOrigin::Resumed,
                    })
                }
                Err(e) => debug!(thread_id, "Could not resume thread, creating a new one: {}", e),
            }
            let thread = self.agents.create_thread().await?;
            return Ok(ChatTurn {
                thread_id: thread.id,
                origin: ThreadOrigin::CreatedFallback,
            });
        }
        let thread = self.agents.create_thread().await?;
        Ok(ChatTurn {
            thread_id: thread.id,
            origin: ThreadOrigin::CreatedNew,
        })
    }

    pub async fn post_user_message(
        &self,
        message: &str,
        thread_id: Option<&str>,
    ) -> Result<ChatTurn, AgentError> {
        let turn = self.resolve_thread(thread_id).await?;
        let posted = self
            .agents
            .create_message(&turn.thread_id, NewMessage::user(message))
            .await?;
        info!(thread_id = %turn.thread_id, message_id = %posted.id, origin = ?turn.origin, "Posted chat message");
        Ok(turn)
    }
}

/// Informational chunks streamed back for a chat message. Generation is not
/// wired to the agent's token stream yet.
pub fn reply_chunks(message: &str) -> Vec<String> {
    vec![
        format!("Searching for information about: {}\n\n", message),
        "I'm a network-secured AI research assistant powered by Azure AI Foundry with Bing grounding capabilities. ".to_string(),
        "I can help you find current information, research topics, and answer questions using real-time web search. ".to_string(),
        format!(
            "However, the full streaming implementation is still being set up for the message: '{}'\n",
            message
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::mock::MockAgents;

    fn mock(known: &[&str]) -> Arc<MockAgents> {
        Arc::new(MockAgents {
            known_threads: known.iter().map(|t| t.to_string()).collect(),
            ..MockAgents::default()
        })
    }

    #[tokio::test]
    async fn resumes_known_thread() {
        let agents = mock(&["thread_42"]);
        let session = ChatSession::new(agents.clone());
        let turn = session.post_user_message("hi", Some("thread_42")).await.unwrap();
        assert_eq!(turn.thread_id, "thread_42");
        assert_eq!(turn.origin, ThreadOrigin::Resumed);
        assert_eq!(
            agents.posted_messages.lock().unwrap()[0],
            ("thread_42".to_string(), "hi".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_thread_falls_back_to_new() {
        let session = ChatSession::new(mock(&[]));
        let turn = session.resolve_thread(Some("gone")).await.unwrap();
        assert_eq!(turn.thread_id, "thread_new_0");
        assert_eq!(turn.origin, ThreadOrigin::CreatedFallback);
    }

    #[tokio::test]
    async fn no_thread_creates_new() {
        let session = ChatSession::new(mock(&[]));
        let turn = session.resolve_thread(None).await.unwrap();
        assert_eq!(turn.origin, ThreadOrigin::CreatedNew);
        let turn = session.resolve_thread(Some("")).await.unwrap();
        assert_eq!(turn.origin, ThreadOrigin::CreatedNew);
    }

    #[test]
    fn chunks_echo_the_message() {
        let chunks = reply_chunks("tides");
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], "Searching for information about: tides\n\n");
        assert!(chunks[3].contains("'tides'"));
    }
}
