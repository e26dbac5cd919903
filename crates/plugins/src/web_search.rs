//! Web search plugin — stub that returns mock search results.
//!
//! In production this would call a real search API (Brave, Google, etc.).
//! The stub returns plausible, deterministic results so the orchestration
//! loop can be exercised end-to-end without network access.

use async_trait::async_trait;
use serde_json::{Map, Value};

use libreassistant_core::plugin::Plugin;
use libreassistant_core::PluginError;

pub struct WebSearchPlugin;

#[async_trait]
impl Plugin for WebSearchPlugin {
    fn id(&self) -> &str {
        "web-search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns a list of relevant results with titles, URLs, and snippets."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "limit": {
                    "type": "integer",
                    "description": "Number of results to return (default 3)",
                    "default": 3
                }
            },
            "required": ["query"]
        })
    }

    fn input_example(&self) -> Value {
        serde_json::json!({"query": "latest AI developments", "limit": 3})
    }

    async fn execute(&self, input: Map<String, Value>) -> Result<Value, PluginError> {
        let query = input
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| PluginError::InvalidInput("Missing 'query' field".into()))?;

        let limit = input
            .get("limit")
            .and_then(Value::as_u64)
            .unwrap_or(3)
            .min(5) as usize;

        let results = generate_mock_results(query, limit);
        serde_json::to_value(&results).map_err(|e| PluginError::ExecutionFailed {
            plugin_id: "web-search".into(),
            reason: e.to_string(),
        })
    }
}

#[derive(serde::Serialize, Clone)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

fn generate_mock_results(query: &str, count: usize) -> Vec<SearchResult> {
    let q = query.to_lowercase();

    // Context-aware mock results for common topics.
    let templates: Vec<(&str, Vec<SearchResult>)> = vec![
        ("rust", vec![
            SearchResult {
                title: "The Rust Programming Language".into(),
                url: "https://doc.rust-lang.org/book/".into(),
                snippet: "Rust is a systems programming language focused on safety, speed, and concurrency.".into(),
            },
            SearchResult {
                title: "crates.io: Rust Package Registry".into(),
                url: "https://crates.io/".into(),
                snippet: "The Rust community's crate registry for sharing and discovering Rust libraries.".into(),
            },
        ]),
        ("weather", vec![
            SearchResult {
                title: "Weather Forecast - National Weather Service".into(),
                url: "https://weather.gov/".into(),
                snippet: "Current conditions and forecasts for locations across the United States.".into(),
            },
        ]),
    ];

    for (keyword, results) in &templates {
        if q.contains(keyword) {
            return results.iter().take(count).cloned().collect();
        }
    }

    // Generic fallback.
    (0..count)
        .map(|i| SearchResult {
            title: format!("Result {} for: {}", i + 1, query),
            url: format!("https://example.com/search?q={}&p={}", urlencode(query), i + 1),
            snippet: format!(
                "This is a mock search result for the query '{}'. In production, this would contain real content.",
                query
            ),
        })
        .collect()
}

fn urlencode(s: &str) -> String {
    s.replace(' ', "+")
}
