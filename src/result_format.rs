use crate::agents::RemoteAnnotation;
use crate::search::SearchResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const DEFAULT_MAX_PROMPT_RESULTS: usize = 5;
pub const NO_RESULTS_TEXT: &str = "No search results found.";

const DEFAULT_CITATION_ID: &str = "1:0";
const DEFAULT_SOURCE_NAME: &str = "Web Search";

static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("valid citation regex"));

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub text: String,
    pub start_index: usize,
    pub end_index: usize,
    pub citation_id: String,
    pub quote: String,
    pub source_name: String,
}

impl From<&RemoteAnnotation> for Annotation {
    fn from(remote: &RemoteAnnotation) -> Self {
        let url_citation = remote.url_citation.as_ref();
        let file_citation = remote.file_citation.as_ref();
        Annotation {
            text: remote.text.clone(),
            start_index: remote.start_index.unwrap_or(0),
            end_index: remote.end_index.unwrap_or(0),
            citation_id: file_citation
                .and_then(|c| c.file_id.clone())
                .unwrap_or_else(|| DEFAULT_CITATION_ID.to_string()),
            quote: file_citation
                .and_then(|c| c.quote.clone())
                .unwrap_or_default(),
            source_name: url_citation
                .and_then(|c| c.title.clone())
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TextBody {
    pub value: String,
    pub annotations: Vec<Annotation>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseContent {
    Text { text: TextBody },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub response: ResponseContent,
}

impl ResponseEnvelope {
    pub fn text(&self) -> &str {
        match &self.response {
            ResponseContent::Text { text } => &text.value,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        match &self.response {
            ResponseContent::Text { text } => &text.annotations,
        }
    }
}

/// Renders up to `max_results` results as numbered blocks for an agent prompt.
pub fn format_for_prompt(results: &[SearchResult], max_results: usize) -> String {
    if results.is_empty() {
        return NO_RESULTS_TEXT.to_string();
    }
    results
        .iter()
        .take(max_results)
        .enumerate()
        .map(|(i, r)| {
            format!(
                "**Result {}:**\n- **Title:** {}\n- **URL:** {}\n- **Summary:** {}\n- **Display URL:** {}",
                i + 1,
                or_na(&r.title),
                or_na(&r.url),
                or_na(&r.snippet),
                or_na(&r.display_url)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Rewrites every `[X]` span into `【X†source】`. Purely textual: any bracketed
/// run is rewritten, whether or not it is a real citation.
pub fn rewrite_citations(text: &str) -> String {
    CITATION_RE.replace_all(text, "【${1}†source】").into_owned()
}

pub fn build_envelope(text: &str, annotations: &[RemoteAnnotation]) -> ResponseEnvelope {
    ResponseEnvelope {
        response: ResponseContent::Text {
            text: TextBody {
                value: rewrite_citations(text),
                annotations: annotations.iter().map(Annotation::from).collect(),
            },
        },
    }
}

pub fn fallback_envelope(text: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        response: ResponseContent::Text {
            text: TextBody {
                value: text.to_string(),
                annotations: Vec::new(),
            },
        },
    }
}
