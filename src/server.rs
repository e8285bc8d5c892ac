use crate::agents::azure::AzureAgentsClient;
use crate::agents::{Agent, AgentsClient};
use crate::chat::ChatSession;
use crate::config::{AgentSettings, Settings};
use crate::handlers;
use crate::orchestrator::{AgentOrchestrator, PollSettings};
use crate::search::BingSearch;
use rocket::{catchers, routes};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug)]
pub enum ServerError {
    Launch(rocket::Error),
    Configuration(rocket::figment::Error),
}

impl std::error::Error for ServerError {}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Launch(e) => write!(f, "Server launch error: {}", e),
            ServerError::Configuration(e) => write!(f, "Server configuration error: {}", e),
        }
    }
}

/// Process-wide state built once at startup and shared read-only by every request.
pub struct AppContext {
    pub settings: Settings,
    pub agents: Option<Arc<dyn AgentsClient>>,
    pub agent: Option<Agent>,
    pub search: Arc<BingSearch>,
    pub poll: PollSettings,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        agents: Option<Arc<dyn AgentsClient>>,
        agent: Option<Agent>,
    ) -> Self {
        let search = Arc::new(BingSearch::new(&settings.bing));
        AppContext {
            settings,
            agents,
            agent,
            search,
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.agents.is_some() && self.agent.is_some()
    }

    /// `None` unless both the client and the agent were resolved at startup.
    pub fn orchestrator(&self) -> Option<AgentOrchestrator> {
        let agents = self.agents.as_ref()?;
        let agent = self.agent.as_ref()?;
        Some(AgentOrchestrator::new(
            agents.clone(),
            agent.id.clone(),
            self.search.clone(),
            self.poll,
        ))
    }

    pub fn chat_session(&self) -> Option<ChatSession> {
        self.agent.as_ref()?;
        self.agents
            .as_ref()
            .map(|agents| ChatSession::new(agents.clone()))
    }
}

pub async fn resolve_agent(agents: &dyn AgentsClient, settings: &AgentSettings) -> Option<Agent> {
    if let Some(agent_id) = &settings.agent_id {
        match agents.get_agent(agent_id).await {
            Ok(agent) => {
                info!(agent_id = %agent.id, "Fetched existing agent");
                return Some(agent);
            }
            Err(e) => error!(agent_id = %agent_id, "Error fetching agent: {}", e),
        }
    }
    match agents.list_agents().await {
        Ok(list) => {
            let found = list
                .into_iter()
                .find(|agent| agent.name.as_deref() == Some(settings.agent_name.as_str()));
            match &found {
                Some(agent) => info!(agent_id = %agent.id, name = %settings.agent_name, "Found agent by name"),
                None => warn!("No agent found. Some functionality may be limited."),
            }
            found
        }
        Err(e) => {
            error!("Error listing agents: {}", e);
            None
        }
    }
}

/// Connects to the agents service and resolves the agent. Never fails: missing
/// pieces leave the service running in a degraded state.
pub async fn bootstrap(settings: Settings) -> AppContext {
    let agents: Option<Arc<dyn AgentsClient>> =
        match AzureAgentsClient::from_settings(&settings.agents) {
            Some(Ok(client)) => {
                info!("Created agents client");
                Some(Arc::new(client))
            }
            Some(Err(e)) => {
                error!("Failed to create agents client: {}", e);
                None
            }
            None if settings.agents.project_endpoint.is_none() => {
                error!("AZURE_EXISTING_AIPROJECT_ENDPOINT not set");
                None
            }
            None => {
                error!("AZURE_AI_PROJECT_TOKEN not set");
                None
            }
        };
    let agent = match &agents {
        Some(agents) => resolve_agent(agents.as_ref(), &settings.agents).await,
        None => None,
    };
    info!(
        agent_id = ?agent.as_ref().map(|a| a.id.as_str()),
        "Startup initialization complete"
    );
    AppContext::new(settings, agents, agent)
}

pub fn create_server(context: AppContext) -> rocket::Rocket<rocket::Build> {
    rocket::build()
        .manage(context)
        .mount(
            "/",
            routes![
                handlers::index::handle_index,
                handlers::health::handle_health,
                handlers::agent::handle_agent,
                handlers::agent::handle_agent_tools,
                handlers::chat::handle_chat,
                handlers::chat::handle_chat_history,
                handlers::search::handle_search,
                handlers::research::handle_research,
            ],
        )
        .mount("/researcher", routes![handlers::research::handle_research])
        .register(
            "/",
            catchers![
                handlers::bad_request,
                handlers::not_found,
                handlers::unprocessable_entity,
                handlers::internal_error,
            ],
        )
}

/// Extracts Rocket's configuration up front so bad values fail before startup work.
pub fn server_config(figment: rocket::figment::Figment) -> Result<rocket::Config, ServerError> {
    figment.extract::<rocket::Config>().map_err(|e| {
        error!("Invalid server configuration: {}", e);
        ServerError::Configuration(e)
    })
}

pub async fn run_server(rocket: rocket::Rocket<rocket::Build>) -> Result<(), ServerError> {
    match rocket.launch().await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Failed to launch rocket server: {}", e);
            Err(ServerError::Launch(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::mock::MockAgents;

    fn agent(id: &str, name: &str) -> Agent {
        Agent {
            id: id.to_string(),
            name: Some(name.to_string()),
            model: None,
            instructions: None,
        }
    }

    #[tokio::test]
    async fn resolves_agent_by_id() {
        let mock = MockAgents {
            agents: vec![agent("asst_1", "a"), agent("asst_2", "b")],
            ..MockAgents::default()
        };
        let settings = AgentSettings {
            agent_id: Some("asst_2".to_string()),
            ..AgentSettings::default()
        };
        let found = resolve_agent(&mock, &settings).await.unwrap();
        assert_eq!(found.id, "asst_2");
        assert_eq!(mock.total_calls(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_name_lookup() {
        let mock = MockAgents {
            agents: vec![agent("asst_1", "citadel-research-agent")],
            ..MockAgents::default()
        };
        let settings = AgentSettings {
            agent_id: Some("asst_missing".to_string()),
            ..AgentSettings::default()
        };
        let found = resolve_agent(&mock, &settings).await.unwrap();
        assert_eq!(found.id, "asst_1");
    }

    #[tokio::test]
    async fn missing_agent_is_not_fatal() {
        let mock = MockAgents::default();
        assert!(resolve_agent(&mock, &AgentSettings::default()).await.is_none());
    }

    #[tokio::test]
    async fn bootstrap_without_endpoint_is_degraded() {
        let context = bootstrap(Settings::default()).await;
        assert!(context.agents.is_none());
        assert!(!context.is_ready());
        assert!(context.orchestrator().is_none());
        assert!(context.chat_session().is_none());
    }

    #[test]
    fn server_config_applies_port() {
        let config = server_config(rocket::Config::figment().merge(("port", 9123))).unwrap();
        assert_eq!(config.port, 9123);
    }

    #[test]
    fn invalid_port_is_a_configuration_error() {
        let err = server_config(rocket::Config::figment().merge(("port", "not-a-port"))).unwrap_err();
        assert!(matches!(err, ServerError::Configuration(_)));
        assert!(err.to_string().starts_with("Server configuration error"));
    }

    #[test]
    fn orchestrator_requires_agent_and_client() {
        let mock: Arc<dyn AgentsClient> = Arc::new(MockAgents::default());
        let context = AppContext::new(Settings::default(), Some(mock.clone()), None);
        assert!(context.orchestrator().is_none());

        let context = AppContext::new(Settings::default(), Some(mock), Some(agent("asst_1", "a")));
        assert!(context.is_ready());
        assert!(context.orchestrator().is_some());
    }
}
