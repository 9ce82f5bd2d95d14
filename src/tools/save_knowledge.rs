//! MCP `save_knowledge` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `save_knowledge` MCP tool.
///
/// `type` selects the file shape: a `skill` gets frontmatter plus
/// canonical sections, a `context` file is plain markdown. Existing files
/// are never overwritten.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SaveKnowledgeParams {
    /// `"skill"` or `"context"`.
    #[schemars(description = "Kind of knowledge file: 'skill' (frontmatter + canonical sections) or 'context' (plain markdown)")]
    pub r#type: String,

    /// File name; sanitized to kebab-case.
    #[schemars(description = "Name for the new file (kebab-cased automatically)")]
    pub name: String,

    /// The body — for skills this becomes the Solution section.
    #[schemars(description = "Markdown content. For skills this becomes the '## Solution' section.")]
    pub content: String,

    /// Required for skills; one line describing what the skill does.
    #[schemars(description = "One-line description. Required when type is 'skill'.")]
    pub description: Option<String>,

    /// Optional trigger phrase — the highest-signal retrieval target.
    #[schemars(description = "When to reach for this skill (becomes the '## Trigger' section)")]
    pub trigger: Option<String>,

    /// Optional problem statement.
    #[schemars(description = "The problem this solves (becomes the '## Problem' section)")]
    pub problem: Option<String>,

    /// Retention importance 1–10; ≥ 8 protects the file from forgetting.
    #[schemars(description = "Importance 1-10 (default 5). Files with importance >= 8 are protected from retention.")]
    pub importance: Option<u8>,
}
