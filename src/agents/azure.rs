use crate::agents::{
    Agent, AgentError, AgentsClient, NewMessage, Thread, ThreadMessage, ThreadRun, ToolOutput,
};
use crate::config::AgentSettings;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct ThreadSpec<'a> {
    messages: &'a [NewMessage],
}

#[derive(Serialize)]
struct CreateThreadAndRunRequest<'a> {
    assistant_id: &'a str,
    thread: ThreadSpec<'a>,
}

#[derive(Serialize)]
struct SubmitToolOutputsRequest<'a> {
    tool_outputs: &'a [ToolOutput],
}

#[derive(Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

/// REST client for the Azure AI Foundry agents data plane.
#[derive(Debug, Clone)]
pub struct AzureAgentsClient {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
}

impl AzureAgentsClient {
    pub fn new(endpoint: &str, token: &str, api_version: &str) -> Result<Self, AgentError> {
        if endpoint.trim().is_empty() {
            return Err(AgentError::ConfigurationError(
                "project endpoint is empty".to_string(),
            ));
        }
        let mut headers = HeaderMap::new();
        let mut auth_header = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| AgentError::ConfigurationError(e.to_string()))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(AzureAgentsClient {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
        })
    }

    /// Builds a client when both the project endpoint and a token are configured.
    pub fn from_settings(settings: &AgentSettings) -> Option<Result<Self, AgentError>> {
        let endpoint = settings.project_endpoint.as_deref()?;
        let token = settings.token.as_deref()?;
        Some(Self::new(endpoint, token, &settings.api_version))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AgentError> {
        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(status = status.as_u16(), "Could not read error body: {}", e);
                    String::new()
                }
            };
            return Err(AgentError::StatusError {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AgentError> {
        debug!(path, "GET agents API");
        let response = self
            .client
            .get(self.url(path))
            .query(&[("api-version", self.api_version.as_str())])
            .query(query)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AgentError> {
        debug!(path, "POST agents API");
        let response = self
            .client
            .post(self.url(path))
            .query(&[("api-version", self.api_version.as_str())])
            .json(body)
            .send()
            .await?;
        Self::read(response).await
    }
}

#[async_trait]
impl AgentsClient for AzureAgentsClient {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent, AgentError> {
        self.get(&format!("assistants/{}", agent_id), &[]).await
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, AgentError> {
        let list: ListResponse<Agent> = self.get("assistants", &[("limit", "100")]).await?;
        Ok(list.data)
    }

    async fn create_thread(&self) -> Result<Thread, AgentError> {
        self.post("threads", &serde_json::json!({})).await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Thread, AgentError> {
        self.get(&format!("threads/{}", thread_id), &[]).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        message: NewMessage,
    ) -> Result<ThreadMessage, AgentError> {
        self.post(&format!("threads/{}/messages", thread_id), &message)
            .await
    }

    async fn create_thread_and_run(
        &self,
        agent_id: &str,
        messages: Vec<NewMessage>,
    ) -> Result<ThreadRun, AgentError> {
        let request = CreateThreadAndRunRequest {
            assistant_id: agent_id,
            thread: ThreadSpec {
                messages: &messages,
            },
        };
        self.post("threads/runs", &request).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun, AgentError> {
        self.get(&format!("threads/{}/runs/{}", thread_id, run_id), &[])
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, AgentError> {
        let list: ListResponse<ThreadMessage> = self
            .get(
                &format!("threads/{}/messages", thread_id),
                &[("order", "desc"), ("limit", "20")],
            )
            .await?;
        Ok(list.data)
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<ThreadRun, AgentError> {
        let request = SubmitToolOutputsRequest {
            tool_outputs: &outputs,
        };
        self.post(
            &format!("threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
            &request,
        )
        .await
    }
}
