//! MCP `audit_knowledge` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `audit_knowledge` MCP tool (none).
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct AuditKnowledgeParams {}
