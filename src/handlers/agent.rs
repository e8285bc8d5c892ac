use crate::handlers::NETWORK_SECURITY;
use crate::server::AppContext;
use crate::tool::search_web_definition;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
    pub model: String,
    pub instructions: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub tools: Vec<String>,
    pub network_security: String,
    pub status: String,
}

#[get("/agent")]
pub fn handle_agent(state: &State<AppContext>) -> Result<Json<AgentDescriptor>, (Status, Json<Value>)> {
    let agent = state.agent.as_ref().ok_or_else(|| {
        (
            Status::NotFound,
            Json(json!({ "detail": "Agent not found or not initialized" })),
        )
    })?;
    Ok(Json(AgentDescriptor {
        id: agent.id.clone(),
        name: agent
            .name
            .clone()
            .unwrap_or_else(|| "Citadel Research Assistant".to_string()),
        model: state.settings.agents.deployment_name.clone(),
        instructions: agent.instructions.clone().unwrap_or_else(|| {
            "AI research assistant with Bing grounding capabilities".to_string()
        }),
        kind: "azure_ai_agent_with_bing_grounding".to_string(),
        tools: vec![
            "bing_search".to_string(),
            "web_grounding".to_string(),
            "code_interpreter".to_string(),
        ],
        network_security: NETWORK_SECURITY.to_string(),
        status: "active".to_string(),
    }))
}

/// Function tools this service can execute on behalf of a run.
#[get("/agent/tools")]
pub fn handle_agent_tools() -> Json<Vec<Value>> {
    Json(vec![search_web_definition()])
}
