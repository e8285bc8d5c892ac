use crate::agents::{AgentError, AgentsClient, NewMessage, Role, RunStatus, ThreadRun, ToolOutput};
use crate::prompts::{build_grounded_prompt, build_knowledge_prompt, build_search_unavailable_prompt};
use crate::result_format::{build_envelope, fallback_envelope, ResponseEnvelope};
use crate::search::BingSearch;
use crate::tool::{execute_search_web, SEARCH_WEB_FUNCTION};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, error, info, warn};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const POLL_BUDGET: Duration = Duration::from_secs(30);

pub const NO_RESULTS_AVAILABLE: &str = "No search results available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub budget: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            interval: POLL_INTERVAL,
            budget: POLL_BUDGET,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub thread_id: String,
    pub run_id: String,
    pub status: RunStatus,
}

/// How the poll loop ended. Only `Terminal` means the run actually finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Terminal(RunStatus),
    BudgetExhausted,
    StatusUnavailable,
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Failed to submit run: {0}")]
    SubmitError(AgentError),
    #[error("Failed to retrieve run result: {0}")]
    RetrieveError(AgentError),
}

pub struct AgentOrchestrator {
    agents: Arc<dyn AgentsClient>,
    agent_id: String,
    search: Arc<BingSearch>,
    poll: PollSettings,
}

impl AgentOrchestrator {
    pub fn new(
        agents: Arc<dyn AgentsClient>,
        agent_id: impl Into<String>,
        search: Arc<BingSearch>,
        poll: PollSettings,
    ) -> Self {
        AgentOrchestrator {
            agents,
            agent_id: agent_id.into(),
            search,
            poll,
        }
    }

    pub async fn compose_prompt(&self, query: &str) -> String {
        if !self.search.is_enabled() {
            return build_knowledge_prompt(query);
        }
        let grounded = self.search.get_grounded_information(query, "").await;
        if grounded.source_count > 0 {
            build_grounded_prompt(query, &grounded)
        } else {
            build_search_unavailable_prompt(query)
        }
    }

    pub async fn submit(&self, prompt: &str) -> Result<RunHandle, OrchestratorError> {
        let run = self
            .agents
            .create_thread_and_run(&self.agent_id, vec![NewMessage::user(prompt)])
            .await
            .map_err(OrchestratorError::SubmitError)?;
        info!(thread_id = %run.thread_id, run_id = %run.id, "Created agent run");
        Ok(RunHandle {
            thread_id: run.thread_id,
            run_id: run.id,
            status: RunStatus::Queued,
        })
    }

    /// Waits for the run to reach a terminal status. The budget is a hard deadline:
    /// sleeps are clipped to it and every status read or tool answer is cut off at it.
    /// A failed status read ends the wait instead of failing the request.
    pub async fn poll(&self, handle: &mut RunHandle) -> PollOutcome {
        let deadline = Instant::now() + self.poll.budget;
        while !handle.status.is_terminal() {
            let now = Instant::now();
            if now >= deadline {
                return self.budget_exhausted(handle);
            }
            sleep_until(deadline.min(now + self.poll.interval)).await;

            let run = match timeout_at(deadline, self.refresh(handle)).await {
                Err(_) => return self.budget_exhausted(handle),
                Ok(Err(e)) => {
                    error!(run_id = %handle.run_id, "Error polling run status: {}", e);
                    return PollOutcome::StatusUnavailable;
                }
                Ok(Ok(run)) => run,
            };
            if run.status != handle.status {
                debug!(run_id = %handle.run_id, from = %handle.status, to = %run.status, "Run status changed");
            }
            handle.status = run.status;
        }
        PollOutcome::Terminal(handle.status)
    }

    /// Reads the run once, answering pending tool calls when the run asks for them.
    async fn refresh(&self, handle: &RunHandle) -> Result<ThreadRun, AgentError> {
        let run = self.agents.get_run(&handle.thread_id, &handle.run_id).await?;
        if run.status == RunStatus::RequiresAction && !run.pending_tool_calls().is_empty() {
            return self.answer_tool_calls(&run).await;
        }
        Ok(run)
    }

    fn budget_exhausted(&self, handle: &RunHandle) -> PollOutcome {
        warn!(
            run_id = %handle.run_id,
            status = %handle.status,
            "Run did not finish within {:?}",
            self.poll.budget
        );
        PollOutcome::BudgetExhausted
    }

    async fn answer_tool_calls(&self, run: &ThreadRun) -> Result<ThreadRun, AgentError> {
        let mut outputs = Vec::new();
        for call in run.pending_tool_calls() {
            let output = match &call.function {
                Some(function) if function.name == SEARCH_WEB_FUNCTION => {
                    execute_search_web(&function.arguments, &self.search).await
                }
                Some(function) => {
                    json!({ "error": format!("Unsupported function: {}", function.name) })
                        .to_string()
                }
                None => json!({ "error": "Unsupported tool call" }).to_string(),
            };
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }
        info!(run_id = %run.id, count = outputs.len(), "Submitting tool outputs");
        self.agents
            .submit_tool_outputs(&run.thread_id, &run.id, outputs)
            .await
    }

    pub async fn retrieve(&self, handle: &RunHandle) -> Result<ResponseEnvelope, OrchestratorError> {
        let messages = self
            .agents
            .list_messages(&handle.thread_id)
            .await
            .map_err(OrchestratorError::RetrieveError)?;
        let reply = messages
            .first()
            .filter(|message| message.role == Role::Assistant)
            .and_then(|message| message.first_text());
        Ok(match reply {
            Some(text) => build_envelope(&text.value, &text.annotations),
            None => fallback_envelope(NO_RESULTS_AVAILABLE),
        })
    }

    pub async fn run(&self, query: &str) -> Result<ResponseEnvelope, OrchestratorError> {
        let prompt = self.compose_prompt(query).await;
        let mut handle = self.submit(&prompt).await?;
        let outcome = self.poll(&mut handle).await;
        info!(run_id = %handle.run_id, ?outcome, "Finished waiting for agent run");
        self.retrieve(&handle).await
    }
}
