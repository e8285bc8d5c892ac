use crate::handlers::SERVICE_VERSION;
use maplit::btreemap;
use rocket::get;
use rocket::serde::json::Json;
use serde_json::{json, Value};

#[get("/")]
pub fn handle_index() -> Json<Value> {
    let endpoints = btreemap! {
        "research" => "/research",
        "search" => "/search",
        "chat" => "/chat",
        "chat_history" => "/chat/history",
        "agent" => "/agent",
        "agent_tools" => "/agent/tools",
        "health" => "/health",
    };
    Json(json!({
        "service": "Citadel Online Research Agent",
        "version": SERVICE_VERSION,
        "description": "AI-powered research assistant with network security and real-time web search capabilities",
        "framework": "Rocket with Azure AI Foundry and Bing grounding",
        "network_security": {
            "private_endpoints": true,
            "vnet_integration": true,
            "private_dns": true,
            "public_access": false
        },
        "endpoints": endpoints,
        "features": [
            "Real-time web search via Bing grounding",
            "Interactive streaming chat interface",
            "Unicode citation formatting",
            "Session-based conversation memory",
            "Network-secured with private endpoints"
        ],
        "status": "operational"
    }))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::client;
    use rocket::http::Status;
    use serde_json::Value;

    #[rocket::async_test]
    async fn lists_endpoints() {
        let client = client(None, None).await;
        let response = client.get("/").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["endpoints"]["search"], "/search");
        assert_eq!(body["status"], "operational");
    }
}
