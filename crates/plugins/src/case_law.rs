//! Case-law lookup plugin — stub over a small built-in opinion corpus.
//!
//! In production this would query a legal database API (CourtListener or
//! similar). The stub matches against a fixed corpus of well-known
//! opinions so legal-lookup chains can be exercised deterministically.

use async_trait::async_trait;
use serde_json::{Map, Value};

use libreassistant_core::plugin::Plugin;
use libreassistant_core::PluginError;

pub struct CaseLawPlugin;

#[derive(serde::Serialize, Clone)]
struct Opinion {
    case_name: String,
    citation: String,
    court: String,
    year: u16,
    summary: String,
}

fn corpus() -> Vec<Opinion> {
    vec![
        Opinion {
            case_name: "Campbell v. Acuff-Rose Music, Inc.".into(),
            citation: "510 U.S. 569".into(),
            court: "Supreme Court of the United States".into(),
            year: 1994,
            summary: "Commercial parody can qualify as fair use; the four statutory factors must be weighed together.".into(),
        },
        Opinion {
            case_name: "Sony Corp. of America v. Universal City Studios, Inc.".into(),
            citation: "464 U.S. 417".into(),
            court: "Supreme Court of the United States".into(),
            year: 1984,
            summary: "Time-shifting home recording is fair use; substantial non-infringing uses shield device makers.".into(),
        },
        Opinion {
            case_name: "Marbury v. Madison".into(),
            citation: "5 U.S. 137".into(),
            court: "Supreme Court of the United States".into(),
            year: 1803,
            summary: "Established judicial review: courts may strike down statutes conflicting with the Constitution.".into(),
        },
        Opinion {
            case_name: "Chevron U.S.A., Inc. v. NRDC".into(),
            citation: "467 U.S. 837".into(),
            court: "Supreme Court of the United States".into(),
            year: 1984,
            summary: "Courts defer to reasonable agency interpretations of ambiguous statutes they administer.".into(),
        },
    ]
}

#[async_trait]
impl Plugin for CaseLawPlugin {
    fn id(&self) -> &str {
        "case-law"
    }

    fn description(&self) -> &str {
        "Look up court opinions by keyword. Returns matching cases with citation, court, year, and a one-line summary."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Keywords to match against case names and summaries"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum opinions to return (default 3)",
                    "default": 3
                }
            },
            "required": ["query"]
        })
    }

    fn input_example(&self) -> Value {
        serde_json::json!({"query": "fair use parody", "limit": 3})
    }

    async fn execute(&self, input: Map<String, Value>) -> Result<Value, PluginError> {
        let query = input
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| PluginError::InvalidInput("Missing 'query' field".into()))?;

        if query.trim().is_empty() {
            return Err(PluginError::InvalidInput("'query' must not be empty".into()));
        }

        let limit = input
            .get("limit")
            .and_then(Value::as_u64)
            .unwrap_or(3)
            .min(10) as usize;

        let needle = query.to_lowercase();
        let terms: Vec<&str> = needle.split_whitespace().collect();

        let matches: Vec<Opinion> = corpus()
            .into_iter()
            .filter(|op| {
                let haystack = format!("{} {}", op.case_name, op.summary).to_lowercase();
                terms.iter().any(|t| haystack.contains(t))
            })
            .take(limit)
            .collect();

        serde_json::to_value(&matches).map_err(|e| PluginError::ExecutionFailed {
            plugin_id: "case-law".into(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(json: Value) -> Map<String, Value> {
        json.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn keyword_matches_opinions() {
        let plugin = CaseLawPlugin;
        let output = plugin
            .execute(input(serde_json::json!({"query": "fair use"})))
            .await
            .unwrap();

        let opinions = output.as_array().unwrap();
        assert!(opinions.len() >= 2);
        assert!(opinions
            .iter()
            .any(|o| o["case_name"].as_str().unwrap().contains("Campbell")));
    }

    #[tokio::test]
    async fn no_match_returns_empty_list() {
        let plugin = CaseLawPlugin;
        let output = plugin
            .execute(input(serde_json::json!({"query": "zoning variance kazoo"})))
            .await
            .unwrap();
        assert_eq!(output.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn limit_is_applied() {
        let plugin = CaseLawPlugin;
        let output = plugin
            .execute(input(serde_json::json!({"query": "court", "limit": 1})))
            .await
            .unwrap();
        assert!(output.as_array().unwrap().len() <= 1);
    }

    #[tokio::test]
    async fn empty_query_is_invalid() {
        let plugin = CaseLawPlugin;
        let err = plugin
            .execute(input(serde_json::json!({"query": "  "})))
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidInput(_)));
    }

    #[test]
    fn descriptor_shape() {
        let desc = CaseLawPlugin.descriptor();
        assert_eq!(desc.id, "case-law");
        assert!(desc.input_example["query"].is_string());
    }
}
