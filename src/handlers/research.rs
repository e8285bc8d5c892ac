use crate::handlers::{MessageInput, SERVICE_VERSION};
use rocket::post;
use rocket::serde::json::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

#[derive(Serialize, Debug, Clone)]
pub struct ResearchResponse {
    pub query: String,
    pub status: String,
    pub message: String,
    pub session_state: Map<String, Value>,
    pub version: String,
}

/// Mounted at both `/research` and `/researcher/research`.
#[post("/research", data = "<input>")]
pub async fn handle_research(input: Json<MessageInput>) -> Json<ResearchResponse> {
    let input = input.into_inner();
    info!(query_length = input.message.len(), "Received research request");
    Json(ResearchResponse {
        query: input.message,
        status: "not_implemented_yet".to_string(),
        message: "Research functionality placeholder – integrate Bing grounding + agent run here."
            .to_string(),
        session_state: input.session_state,
        version: SERVICE_VERSION.to_string(),
    })
}
