//! MCP `knowledge_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `knowledge_stats` MCP tool (none).
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeStatsParams {}
