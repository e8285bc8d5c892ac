use crate::search::BingSearch;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

pub const SEARCH_WEB_FUNCTION: &str = "search_web";

#[derive(Deserialize, Debug, Default)]
struct SearchWebArguments {
    #[serde(default)]
    query: String,
    #[serde(default)]
    context: String,
}

/// Function-tool definition an agent can register to call back into web search.
pub fn search_web_definition() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": SEARCH_WEB_FUNCTION,
            "description": "Search the web for current information using Bing Search API. Use this when you need up-to-date information, current events, recent news, or real-time data that may not be in your knowledge base.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find information about. Be specific and include relevant keywords."
                    },
                    "context": {
                        "type": "string",
                        "description": "Additional context to help refine the search (optional)."
                    }
                },
                "required": ["query"]
            }
        }
    })
}

/// Runs a `search_web` call. Always returns a JSON document, errors included.
pub async fn execute_search_web(arguments: &str, search: &BingSearch) -> String {
    let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
    let args: SearchWebArguments = match serde_json::from_str(raw) {
        Ok(args) => args,
        Err(e) => {
            error!("Error executing search_web function: {}", e);
            return json!({ "error": format!("Failed to execute search: {}", e) }).to_string();
        }
    };
    if args.query.trim().is_empty() {
        return json!({ "error": "Query parameter is required" }).to_string();
    }
    let grounded = search.get_grounded_information(&args.query, &args.context).await;
    match serde_json::to_string_pretty(&grounded) {
        Ok(output) => output,
        Err(e) => json!({ "error": format!("Failed to execute search: {}", e) }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BingSettings;

    fn disabled_search() -> BingSearch {
        BingSearch::new(&BingSettings::default())
    }

    #[test]
    fn definition_requires_query() {
        let definition = search_web_definition();
        assert_eq!(definition["function"]["name"], "search_web");
        assert_eq!(definition["function"]["parameters"]["required"][0], "query");
    }

    #[tokio::test]
    async fn missing_query_is_reported() {
        let output = execute_search_web(r#"{"context": "x"}"#, &disabled_search()).await;
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["error"], "Query parameter is required");

        let output = execute_search_web("", &disabled_search()).await;
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["error"], "Query parameter is required");
    }

    #[tokio::test]
    async fn malformed_arguments_are_reported() {
        let output = execute_search_web("{not json", &disabled_search()).await;
        let value: Value = serde_json::from_str(&output).unwrap();
        assert!(value["error"].as_str().unwrap().starts_with("Failed to execute search"));
    }

    #[tokio::test]
    async fn returns_grounded_information() {
        let output =
            execute_search_web(r#"{"query": "rust", "context": "2024"}"#, &disabled_search()).await;
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["query"], "rust");
        assert_eq!(value["enhanced_query"], "rust 2024");
        assert_eq!(value["sources_count"], 2);
        assert_eq!(value["search_results"].as_array().unwrap().len(), 2);
    }
}
