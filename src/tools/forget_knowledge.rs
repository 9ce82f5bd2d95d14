//! MCP `forget_knowledge` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `forget_knowledge` MCP tool.
///
/// At least one of `max_files` / `max_age_days` must be provided.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ForgetKnowledgeParams {
    /// Cap on retained files (protected files count against the cap).
    #[schemars(description = "Keep at most this many files in the index. Importance >= 8 files are never deleted.")]
    pub max_files: Option<usize>,

    /// Files not accessed within this many days are stale.
    #[schemars(description = "Forget files not accessed within this many days")]
    pub max_age_days: Option<u32>,
}
