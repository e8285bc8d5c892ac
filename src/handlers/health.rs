use crate::handlers::{NETWORK_SECURITY, SERVICE_VERSION};
use crate::server::AppContext;
use chrono::{SecondsFormat, Utc};
use rocket::serde::json::Json;
use rocket::{get, State};
use serde::{Deserialize, Serialize};

pub const FRAMEWORK: &str = "azure_ai_foundry_with_bing_grounding";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub framework: String,
    pub agent_id: Option<String>,
    pub ai_project_client_enabled: bool,
    pub bing_grounding_enabled: bool,
    pub network_security: String,
    pub timestamp: String,
    pub version: String,
}

#[get("/health")]
pub fn handle_health(state: &State<AppContext>) -> Json<HealthResponse> {
    let status = if state.is_ready() { "healthy" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        framework: FRAMEWORK.to_string(),
        agent_id: state.agent.as_ref().map(|agent| agent.id.clone()),
        ai_project_client_enabled: state.agents.is_some(),
        // Grounding runs as a tool of the hosted agent.
        bing_grounding_enabled: state.agent.is_some(),
        network_security: NETWORK_SECURITY.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        version: SERVICE_VERSION.to_string(),
    })
}
