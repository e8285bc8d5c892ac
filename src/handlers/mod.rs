use rocket::catch;
use rocket::serde::json::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub mod agent;
pub mod chat;
pub mod health;
pub mod index;
pub mod research;
pub mod search;

pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NETWORK_SECURITY: &str = "private_endpoints_enabled";

/// Body shared by the POST endpoints.
#[derive(Deserialize, Debug, Clone)]
pub struct MessageInput {
    pub message: String,
    #[serde(default)]
    pub session_state: Map<String, Value>,
}

#[catch(400)]
pub fn bad_request() -> Json<Value> {
    Json(json!({ "error": "Malformed request body" }))
}

#[catch(404)]
pub fn not_found() -> Json<Value> {
    Json(json!({ "detail": "Not found" }))
}

#[catch(422)]
pub fn unprocessable_entity() -> Json<Value> {
    Json(json!({ "error": "Request body must be {\"message\": string, \"session_state\": object}" }))
}

#[catch(500)]
pub fn internal_error() -> Json<Value> {
    Json(json!({ "error": "Internal server error" }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::agents::mock::MockAgents;
    use crate::agents::{Agent, AgentsClient};
    use crate::config::Settings;
    use crate::orchestrator::PollSettings;
    use crate::server::{create_server, AppContext};
    use rocket::local::asynchronous::Client;
    use std::sync::Arc;
    use std::time::Duration;

    pub fn test_agent() -> Agent {
        Agent {
            id: "asst_test".to_string(),
            name: Some("Research Assistant".to_string()),
            model: Some("gpt-4o".to_string()),
            instructions: Some("Answer with citations".to_string()),
        }
    }

    pub async fn client(mock: Option<Arc<MockAgents>>, agent: Option<Agent>) -> Client {
        let agents = mock.map(|m| m as Arc<dyn AgentsClient>);
        let context = AppContext::new(Settings::default(), agents, agent).with_poll_settings(
            PollSettings {
                interval: Duration::from_millis(5),
                budget: Duration::from_millis(200),
            },
        );
        Client::tracked(create_server(context))
            .await
            .expect("valid rocket instance")
    }
}
