use crate::config::BingSettings;
use crate::result_format::{format_for_prompt, DEFAULT_MAX_PROMPT_RESULTS};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

pub const MAX_SEARCH_COUNT: usize = 50;
pub const GROUNDING_RESULT_COUNT: usize = 5;
pub const DEFAULT_MARKET: &str = "en-US";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (compatible; AzureAI-Agent/1.0)";
const FALLBACK_CRAWL_DATE: &str = "2025-09-09";
const ALTERNATIVE_SEARCH_URL: &str =
    "https://azure.microsoft.com/services/cognitive-services/bing-web-search-api/";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub display_url: String,
    #[serde(rename = "date_last_crawled")]
    pub crawl_date: String,
    pub language: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BingWebPage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub display_url: String,
    #[serde(default)]
    pub date_last_crawled: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct BingWebPages {
    #[serde(default)]
    pub value: Vec<BingWebPage>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BingResponse {
    #[serde(default)]
    pub web_pages: Option<BingWebPages>,
}

impl From<BingWebPage> for SearchResult {
    fn from(page: BingWebPage) -> Self {
        SearchResult {
            title: page.name,
            url: page.url,
            snippet: page.snippet,
            display_url: page.display_url,
            crawl_date: page.date_last_crawled,
            language: page.language.unwrap_or_else(|| "en".to_string()),
        }
    }
}

impl BingResponse {
    pub fn into_results(self) -> Vec<SearchResult> {
        self.web_pages
            .map(|pages| pages.value.into_iter().map(SearchResult::from).collect())
            .unwrap_or_default()
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Bing search authentication failed (status {0})")]
    Unauthorized(u16),
    #[error("Bing search returned status code: {0}")]
    BingError(u16),
}

/// Why a search degraded to the synthetic fallback set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    MissingCredential,
    NotEnabled,
    ProviderStatus(u16),
    TransportError,
}

impl FallbackReason {
    fn describe(&self) -> String {
        match self {
            FallbackReason::MissingCredential => {
                "no Bing Search API key is configured (BING_SEARCH_API_KEY is empty)".to_string()
            }
            FallbackReason::NotEnabled => {
                "Bing Search is not enabled (ENABLE_BING_SEARCH is not set to true)".to_string()
            }
            FallbackReason::ProviderStatus(401) => {
                "the Bing Search API rejected the configured key (status 401)".to_string()
            }
            FallbackReason::ProviderStatus(status) => {
                format!("the Bing Search API returned status {}", status)
            }
            FallbackReason::TransportError => {
                "the Bing Search API could not be reached".to_string()
            }
        }
    }

    fn remedy(&self) -> &'static str {
        match self {
            FallbackReason::MissingCredential | FallbackReason::NotEnabled => {
                "To enable web search functionality, configure the BING_SEARCH_API_KEY \
                 environment variable with a valid Bing Search v7 API key and set \
                 ENABLE_BING_SEARCH=true."
            }
            FallbackReason::ProviderStatus(401) => {
                "Check that BING_SEARCH_API_KEY holds an active Bing Search v7 key."
            }
            FallbackReason::ProviderStatus(_) | FallbackReason::TransportError => {
                "The search service may be temporarily unavailable; please try again shortly."
            }
        }
    }
}

impl From<&SearchError> for FallbackReason {
    fn from(e: &SearchError) -> Self {
        match e {
            SearchError::RequestError(_) => FallbackReason::TransportError,
            SearchError::Unauthorized(status) | SearchError::BingError(status) => {
                FallbackReason::ProviderStatus(*status)
            }
        }
    }
}

/// Manual search link for `query`, spaces encoded as `+`.
pub fn manual_search_url(query: &str) -> String {
    match url::Url::parse_with_params("https://www.bing.com/search", &[("q", query)]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("https://www.bing.com/search?q={}", query.replace(' ', "+")),
    }
}

pub fn fallback_results(query: &str, reason: FallbackReason) -> Vec<SearchResult> {
    vec![
        SearchResult {
            title: format!("Search Configuration Notice: \"{}\"", query),
            url: manual_search_url(query),
            snippet: format!(
                "I attempted to search for current information about \"{}\" but {}. {}",
                query,
                reason.describe(),
                reason.remedy()
            ),
            display_url: "Configuration Required".to_string(),
            crawl_date: FALLBACK_CRAWL_DATE.to_string(),
            language: "en".to_string(),
        },
        SearchResult {
            title: "Alternative Search Options".to_string(),
            url: ALTERNATIVE_SEARCH_URL.to_string(),
            snippet: "For immediate information needs, please search manually using: \
                      Bing.com, Google.com, or specialized sources. To configure Bing Search \
                      for this AI agent, obtain a Bing Search v7 API key from the Azure Portal \
                      and configure it as described in the deployment documentation."
                .to_string(),
            display_url: "Manual Search Recommended".to_string(),
            crawl_date: FALLBACK_CRAWL_DATE.to_string(),
            language: "en".to_string(),
        },
    ]
}

#[derive(Serialize, Debug, Clone)]
pub struct GroundedInfo {
    pub query: String,
    pub enhanced_query: String,
    #[serde(rename = "search_results")]
    pub results: Vec<SearchResult>,
    #[serde(rename = "formatted_results")]
    pub formatted_text: String,
    #[serde(rename = "sources_count")]
    pub source_count: usize,
    pub enabled: bool,
}

impl GroundedInfo {
    pub fn new(query: &str, enhanced_query: String, results: Vec<SearchResult>, enabled: bool) -> Self {
        let formatted_text = format_for_prompt(&results, DEFAULT_MAX_PROMPT_RESULTS);
        GroundedInfo {
            query: query.to_string(),
            enhanced_query,
            source_count: results.len(),
            results,
            formatted_text,
            enabled,
        }
    }
}

/// Requests also carry their own timeout, so the default client is still bounded.
fn build_client(builder: reqwest::ClientBuilder) -> reqwest::Client {
    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build Bing HTTP client, falling back to defaults: {}", e);
            reqwest::Client::new()
        }
    }
}

/// Bing Web Search v7 client. Never fails towards its callers.
#[derive(Debug, Clone)]
pub struct BingSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    enabled_flag: bool,
}

impl BingSearch {
    pub fn new(settings: &BingSettings) -> Self {
        let client = build_client(reqwest::Client::builder().timeout(SEARCH_TIMEOUT));
        let search = BingSearch {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            enabled_flag: settings.enabled,
        };
        if search.is_enabled() {
            info!("Bing search initialized");
        } else {
            info!("Bing search initialized but disabled (no API key or not enabled)");
        }
        search
    }

    pub fn is_enabled(&self) -> bool {
        self.disabled_reason().is_none()
    }

    fn disabled_reason(&self) -> Option<FallbackReason> {
        if self.api_key.is_empty() {
            Some(FallbackReason::MissingCredential)
        } else if !self.enabled_flag {
            Some(FallbackReason::NotEnabled)
        } else {
            None
        }
    }

    async fn request(
        &self,
        query: &str,
        count: usize,
        market: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let search_url = format!("{}/v7.0/search", self.endpoint);
        let response = self
            .client
            .get(&search_url)
            .timeout(SEARCH_TIMEOUT)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("q", query),
                ("count", count.min(MAX_SEARCH_COUNT).to_string().as_str()),
                ("mkt", market),
                ("safeSearch", "Moderate"),
                ("textDecorations", "false"),
                ("textFormat", "Raw"),
            ])
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SearchError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(SearchError::BingError(status.as_u16()));
        }
        let body = response.json::<BingResponse>().await?;
        Ok(body.into_results())
    }

    pub async fn search(&self, query: &str, count: usize, market: &str) -> Vec<SearchResult> {
        if let Some(reason) = self.disabled_reason() {
            let results = fallback_results(query, reason);
            info!(count = results.len(), outcome = "fallback", ?reason, "Bing search skipped");
            return results;
        }
        match self.request(query, count, market).await {
            Ok(results) => {
                info!(count = results.len(), outcome = "success", "Bing search returned results");
                results
            }
            Err(e) => {
                match &e {
                    SearchError::Unauthorized(_) => warn!("Bing API authentication failed: {}", e),
                    _ => error!("Error performing web search: {}", e),
                }
                let results = fallback_results(query, FallbackReason::from(&e));
                info!(count = results.len(), outcome = "fallback", "Bing search degraded");
                results
            }
        }
    }

    pub async fn get_grounded_information(&self, query: &str, context: &str) -> GroundedInfo {
        let enhanced_query = if context.trim().is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, context).trim().to_string()
        };
        let results = self
            .search(&enhanced_query, GROUNDING_RESULT_COUNT, DEFAULT_MARKET)
            .await;
        info!(query, sources = results.len(), "Generated grounded information");
        GroundedInfo::new(query, enhanced_query, results, self.is_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: &str, enabled: bool, endpoint: &str) -> BingSettings {
        BingSettings {
            api_key: api_key.to_string(),
            enabled,
            endpoint: endpoint.to_string(),
        }
    }

    #[test]
    fn parses_bing_web_pages() {
        let body = serde_json::json!({
            "webPages": {
                "value": [
                    {
                        "name": "Rust",
                        "url": "https://www.rust-lang.org/",
                        "snippet": "A language empowering everyone",
                        "displayUrl": "www.rust-lang.org",
                        "dateLastCrawled": "2025-01-02T00:00:00.0000000Z",
                        "language": "en"
                    },
                    { "name": "Tokio", "url": "https://tokio.rs/" }
                ]
            }
        });
        let response: BingResponse = serde_json::from_value(body).unwrap();
        let results = response.into_results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[0].display_url, "www.rust-lang.org");
        assert_eq!(results[1].snippet, "");
        assert_eq!(results[1].language, "en");
    }

    #[test]
    fn missing_web_pages_means_zero_results() {
        let response: BingResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_results().is_empty());
    }

    #[test]
    fn fallback_names_the_query_and_reason() {
        let results = fallback_results("rust async", FallbackReason::NotEnabled);
        assert_eq!(results.len(), 2);
        assert!(results[0].title.contains("rust async"));
        assert!(results[0].snippet.contains("not enabled"));
        assert_eq!(results[0].url, "https://www.bing.com/search?q=rust+async");
        assert_eq!(results[1].title, "Alternative Search Options");

        let results = fallback_results("q", FallbackReason::MissingCredential);
        assert!(results[0].snippet.contains("no Bing Search API key"));
        assert!(results[0].snippet.contains("ENABLE_BING_SEARCH=true"));
    }

    #[test]
    fn client_builder_failure_falls_back() {
        let builder = reqwest::Client::builder().use_preconfigured_tls(0u8);
        let client = build_client(builder);
        assert!(client.get("https://api.bing.microsoft.com").build().is_ok());
    }

    #[test]
    fn provider_failures_skip_the_setup_hint() {
        for reason in [FallbackReason::TransportError, FallbackReason::ProviderStatus(503)] {
            let snippet = &fallback_results("q", reason)[0].snippet;
            assert!(!snippet.contains("ENABLE_BING_SEARCH=true"), "{snippet}");
            assert!(snippet.contains("try again shortly"));
        }
        let snippet = &fallback_results("q", FallbackReason::ProviderStatus(401))[0].snippet;
        assert!(snippet.contains("status 401"));
        assert!(!snippet.contains("ENABLE_BING_SEARCH=true"));
    }

    #[tokio::test]
    async fn disabled_search_returns_fallback() {
        let search = BingSearch::new(&settings("", true, "https://api.bing.microsoft.com"));
        assert!(!search.is_enabled());
        let results = search.search("weather", 5, DEFAULT_MARKET).await;
        assert_eq!(results.len(), 2);

        let search = BingSearch::new(&settings("key", false, "https://api.bing.microsoft.com"));
        assert!(!search.is_enabled());
        assert!(!search.search("weather", 5, DEFAULT_MARKET).await.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_returns_fallback() {
        let search = BingSearch::new(&settings("key", true, "http://127.0.0.1:1"));
        assert!(search.is_enabled());
        let results = search.search("events in miami", 5, DEFAULT_MARKET).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].snippet.contains("could not be reached"));
    }

    #[tokio::test]
    async fn grounded_information_counts_its_results() {
        let search = BingSearch::new(&settings("", false, "https://api.bing.microsoft.com"));
        let info = search.get_grounded_information("rust", "web frameworks").await;
        assert_eq!(info.enhanced_query, "rust web frameworks");
        assert_eq!(info.source_count, info.results.len());
        assert!(!info.enabled);
        assert!(info.formatted_text.starts_with("**Result 1:**"));

        let info = search.get_grounded_information("rust", "").await;
        assert_eq!(info.enhanced_query, "rust");
    }

    #[test]
    fn grounded_info_constructor_keeps_count_in_sync() {
        let info = GroundedInfo::new("q", "q".to_string(), Vec::new(), true);
        assert_eq!(info.source_count, 0);
        assert_eq!(info.formatted_text, "No search results found.");
    }
}
