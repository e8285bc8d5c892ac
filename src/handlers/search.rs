use crate::handlers::MessageInput;
use crate::orchestrator::OrchestratorError;
use crate::result_format::{fallback_envelope, ResponseEnvelope};
use crate::server::AppContext;
use rocket::http::Status;
use rocket::post;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use tracing::{error, info, warn};

pub const EMPTY_QUERY_ERROR: &str = "Search query is required and cannot be empty";
pub const SERVICE_UNAVAILABLE_TEXT: &str = "Search service not available";
pub const SUBMIT_FAILED_TEXT: &str = "Error processing search request";
pub const RETRIEVE_FAILED_TEXT: &str = "Error retrieving search results";

#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum SearchErrorResponse {
    Message { error: String },
    Envelope(ResponseEnvelope),
}

fn envelope_error(status: Status, text: &str) -> (Status, Json<SearchErrorResponse>) {
    (
        status,
        Json(SearchErrorResponse::Envelope(fallback_envelope(text))),
    )
}

#[post("/search", data = "<input>")]
pub async fn handle_search(
    state: &State<AppContext>,
    input: Json<MessageInput>,
) -> Result<Json<ResponseEnvelope>, (Status, Json<SearchErrorResponse>)> {
    let query = input.message.trim();
    if query.is_empty() {
        return Err((
            Status::BadRequest,
            Json(SearchErrorResponse::Message {
                error: EMPTY_QUERY_ERROR.to_string(),
            }),
        ));
    }
    let orchestrator = match state.orchestrator() {
        Some(orchestrator) => orchestrator,
        None => {
            warn!("Search requested but the agent or its client is not initialized");
            return Err(envelope_error(
                Status::ServiceUnavailable,
                SERVICE_UNAVAILABLE_TEXT,
            ));
        }
    };
    info!(query, "Received search request");
    match orchestrator.run(query).await {
        Ok(envelope) => Ok(Json(envelope)),
        Err(e) => {
            error!("Search request failed: {}", e);
            Err(envelope_error(
                Status::InternalServerError,
                match e {
                    OrchestratorError::SubmitError(_) => SUBMIT_FAILED_TEXT,
                    OrchestratorError::RetrieveError(_) => RETRIEVE_FAILED_TEXT,
                },
            ))
        }
    }
}
