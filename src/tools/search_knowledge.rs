//! MCP `search_knowledge` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search_knowledge` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchKnowledgeParams {
    /// Natural language query.
    #[schemars(description = "Natural language query to search the knowledge index")]
    pub query: String,

    /// Maximum number of results. Defaults to 5.
    #[schemars(description = "Maximum number of results to return. Defaults to 5.")]
    pub limit: Option<usize>,

    /// Minimum adjusted similarity (0.0–1.0). Defaults to 0.3.
    #[schemars(description = "Minimum adjusted similarity score (0.0-1.0). Defaults to 0.3.")]
    pub threshold: Option<f32>,

    /// Filter by source type: `"skill"` or `"knowledge"`.
    #[schemars(description = "Filter by source type: 'skill' or 'knowledge'")]
    pub source_type: Option<String>,

    /// If `true`, return at most one chunk per source file.
    #[schemars(description = "If true, return at most one result per source file")]
    pub unique_files: Option<bool>,
}
