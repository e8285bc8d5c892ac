use clap::Parser;
use std::env;

pub const DEFAULT_PORT: u16 = 8095;
pub const DEFAULT_BING_ENDPOINT: &str = "https://api.bing.microsoft.com";
pub const DEFAULT_AGENTS_API_VERSION: &str = "2025-05-15-preview";
pub const DEFAULT_AGENT_NAME: &str = "citadel-research-agent";
pub const DEFAULT_DEPLOYMENT_NAME: &str = "gpt-4o";

#[derive(Parser, Debug, Clone)]
#[command(name = "research-agent", version, about = "Grounded research agent gateway")]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "RESEARCH_AGENT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BingSettings {
    pub api_key: String,
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for BingSettings {
    fn default() -> Self {
        BingSettings {
            api_key: String::new(),
            enabled: false,
            endpoint: DEFAULT_BING_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub project_endpoint: Option<String>,
    pub token: Option<String>,
    pub api_version: String,
    pub agent_id: Option<String>,
    pub agent_name: String,
    pub deployment_name: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        AgentSettings {
            project_endpoint: None,
            token: None,
            api_version: DEFAULT_AGENTS_API_VERSION.to_string(),
            agent_id: None,
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            deployment_name: DEFAULT_DEPLOYMENT_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub bing: BingSettings,
    pub agents: AgentSettings,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Settings {
            bing: BingSettings {
                api_key: non_empty("BING_SEARCH_API_KEY").unwrap_or_default(),
                enabled: lookup("ENABLE_BING_SEARCH")
                    .map(|v| v.trim().eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
                endpoint: non_empty("BING_SEARCH_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_BING_ENDPOINT.to_string()),
            },
            agents: AgentSettings {
                project_endpoint: non_empty("AZURE_EXISTING_AIPROJECT_ENDPOINT"),
                token: non_empty("AZURE_AI_PROJECT_TOKEN"),
                api_version: non_empty("AZURE_AI_AGENTS_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_AGENTS_API_VERSION.to_string()),
                agent_id: non_empty("AZURE_EXISTING_AGENT_ID"),
                agent_name: non_empty("AZURE_AI_AGENT_NAME")
                    .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
                deployment_name: non_empty("AZURE_AI_AGENT_DEPLOYMENT_NAME")
                    .unwrap_or_else(|| DEFAULT_DEPLOYMENT_NAME.to_string()),
            },
        }
    }
}
