//! Writing new knowledge files into the tree.
//!
//! `save_knowledge` is the one engine operation that touches the markdown
//! tree: it renders a new skill or context file under `knowledge/`,
//! refuses to overwrite anything, and immediately re-syncs so the new
//! file is searchable.

use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

use crate::embedding::EmbeddingProvider;
use crate::knowledge::sync::{self, SyncReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveType {
    Skill,
    Context,
}

impl std::str::FromStr for SaveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skill" => Ok(Self::Skill),
            "context" => Ok(Self::Context),
            _ => Err(format!("unknown save type: {s} (expected skill or context)")),
        }
    }
}

#[derive(Debug)]
pub struct SaveRequest {
    pub save_type: SaveType,
    pub name: String,
    pub content: String,
    pub description: Option<String>,
    pub trigger: Option<String>,
    pub problem: Option<String>,
    pub importance: Option<u8>,
}

#[derive(Debug)]
pub struct SaveOutcome {
    /// Relative path of the created file.
    pub path: String,
    /// Report of the sync that followed the write.
    pub report: SyncReport,
}

/// Write a new knowledge file and re-sync the index.
pub fn save_knowledge(
    conn: &mut Connection,
    provider: &dyn EmbeddingProvider,
    root: &Path,
    request: &SaveRequest,
) -> Result<SaveOutcome> {
    let name = sanitize_name(&request.name)?;
    if request.content.trim().is_empty() {
        bail!("content must not be empty");
    }
    if let Some(importance) = request.importance {
        if !(1..=10).contains(&importance) {
            bail!("importance must be between 1 and 10, got {importance}");
        }
    }

    let rel = match request.save_type {
        SaveType::Skill => format!("knowledge/skills/{name}.md"),
        SaveType::Context => format!("knowledge/context/{name}.md"),
    };
    let abs = root.join(&rel);
    if abs.exists() {
        bail!("refusing to overwrite existing knowledge file: {rel}");
    }

    let rendered = match request.save_type {
        SaveType::Skill => render_skill(&name, request)?,
        SaveType::Context => render_context(request),
    };

    if let Some(parent) = abs.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&abs, rendered).with_context(|| format!("failed to write {rel}"))?;
    tracing::info!(path = %rel, "knowledge file saved");

    let report = sync::sync_project(conn, provider, root)?;
    Ok(SaveOutcome { path: rel, report })
}

/// Kebab-case the requested name; refuse anything that sanitizes to
/// nothing or tries to escape the knowledge directory.
fn sanitize_name(raw: &str) -> Result<String> {
    if raw.contains('/') || raw.contains('\\') || raw.contains("..") {
        bail!("invalid knowledge name: {raw} (path separators are not allowed)");
    }
    let mut name = String::with_capacity(raw.len());
    for c in raw.trim().to_lowercase().chars() {
        match c {
            'a'..='z' | '0'..='9' => name.push(c),
            ' ' | '_' | '-' => {
                if !name.ends_with('-') && !name.is_empty() {
                    name.push('-');
                }
            }
            _ => {}
        }
    }
    let name = name.trim_end_matches('-').to_string();
    if name.is_empty() {
        bail!("invalid knowledge name: {raw:?} sanitizes to nothing");
    }
    Ok(name)
}

fn render_skill(name: &str, request: &SaveRequest) -> Result<String> {
    let Some(description) = request
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
    else {
        bail!("a skill requires a description");
    };

    let mut out = String::from("---\n");
    out.push_str(&format!("name: {name}\n"));
    out.push_str(&format!("description: {}\n", description.trim()));
    if let Some(importance) = request.importance {
        out.push_str(&format!("importance: {importance}\n"));
    }
    out.push_str("---\n");

    if let Some(problem) = request.problem.as_deref().filter(|p| !p.trim().is_empty()) {
        out.push_str(&format!("\n## Problem\n\n{}\n", problem.trim()));
    }
    if let Some(trigger) = request.trigger.as_deref().filter(|t| !t.trim().is_empty()) {
        out.push_str(&format!("\n## Trigger\n\n{}\n", trigger.trim()));
    }
    out.push_str(&format!("\n## Solution\n\n{}\n", request.content.trim()));

    Ok(out)
}

fn render_context(request: &SaveRequest) -> String {
    let mut out = String::new();
    if let Some(importance) = request.importance {
        out.push_str(&format!("---\nimportance: {importance}\n---\n\n"));
    }
    out.push_str(request.content.trim());
    out.push('\n');
    out
}
