use crate::search::GroundedInfo;

pub const CITATION_INSTRUCTIONS: &str = r#"When you use information from a search result, cite it inline with the result number in square brackets, for example [1] or [2]. Do not invent sources."#;

/// Prompt asking the agent to answer from the provided search results.
pub fn build_grounded_prompt(query: &str, grounded: &GroundedInfo) -> String {
    format!(
        r#"# Task
Answer the user's question using the web search results below. Analyze the results, prefer the most recent and authoritative sources, and say so when the results are conflicting or do not answer the question.

{}

# Question
{}

# Search results ({} sources)
{}"#,
        CITATION_INSTRUCTIONS, query, grounded.source_count, grounded.formatted_text
    )
}

/// Prompt used when search was attempted but produced nothing usable.
pub fn build_search_unavailable_prompt(query: &str) -> String {
    format!(
        r#"# Task
Web search is currently unavailable, so no search results could be retrieved. Answer the user's question from your own knowledge, and state clearly that the answer may not reflect the most recent information.

# Question
{}"#,
        query
    )
}

pub fn build_knowledge_prompt(query: &str) -> String {
    format!(
        r#"# Task
Answer the user's question from your own knowledge. Be concise and factual, and note when the question likely depends on current information you may not have.

# Question
{}"#,
        query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{fallback_results, FallbackReason};

    #[test]
    fn grounded_prompt_embeds_formatted_results() {
        let results = fallback_results("tides", FallbackReason::NotEnabled);
        let grounded = GroundedInfo::new("tides", "tides".to_string(), results, false);
        let prompt = build_grounded_prompt("tides", &grounded);
        assert!(prompt.contains("# Question\ntides"));
        assert!(prompt.contains("(2 sources)"));
        assert!(prompt.contains("**Result 2:**"));
    }

    #[test]
    fn fallback_prompts_name_the_question() {
        assert!(build_search_unavailable_prompt("q1").ends_with("q1"));
        assert!(build_search_unavailable_prompt("q1").contains("unavailable"));
        assert!(build_knowledge_prompt("q2").ends_with("q2"));
    }
}
