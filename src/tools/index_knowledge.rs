//! MCP `index_knowledge` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `index_knowledge` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IndexKnowledgeParams {
    /// If `true`, clear the store before re-indexing.
    #[schemars(description = "If true, clear the index and rebuild from scratch")]
    pub force: Option<bool>,
}
