//! Autoload token audit — read-only.
//!
//! Autoload files are never indexed (indexing would double-count their
//! tokens) but they silently grow, so the audit walks the autoload region
//! and reports estimated token counts against fixed thresholds. It never
//! mutates anything.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::warn;
use walkdir::WalkDir;

use crate::knowledge::classify;
use crate::knowledge::normalize::estimate_tokens;

/// Per-file thresholds for root `CLAUDE.md` / `AGENTS.md`.
const AGENT_FILE_WARNING: usize = 500;
const AGENT_FILE_CRITICAL: usize = 1000;

/// Per-file thresholds for any `SKILL.md`.
const SKILL_FILE_WARNING: usize = 300;
const SKILL_FILE_CRITICAL: usize = 600;

/// Thresholds for the sum over the whole autoload region.
const TOTAL_WARNING: usize = 2000;
const TOTAL_CRITICAL: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Ok,
    Warning,
    Critical,
}

impl std::fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Critical => "critical",
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AuditEntry {
    /// Relative forward-slash path.
    pub path: String,
    /// Estimated tokens (`⌈chars/4⌉`).
    pub tokens: usize,
    pub level: AuditLevel,
}

#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub entries: Vec<AuditEntry>,
    pub total_tokens: usize,
    pub total_level: AuditLevel,
}

/// Walk the autoload region and measure every markdown file in it.
pub fn audit_autoload(root: &Path) -> Result<AuditReport> {
    let mut entries = Vec::new();

    for basename in ["CLAUDE.md", "AGENTS.md"] {
        let path = root.join(basename);
        if path.is_file() {
            if let Some(entry) = measure(root, &path) {
                entries.push(entry);
            }
        }
    }

    for dir in [".claude", ".codex", ".opencode"] {
        let dir_path = root.join(dir);
        if !dir_path.is_dir() {
            continue;
        }
        for item in WalkDir::new(&dir_path) {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry during audit");
                    continue;
                }
            };
            if !item.file_type().is_file() {
                continue;
            }
            let Some(rel) = classify::to_relative(root, item.path()) else {
                continue;
            };
            if !rel.ends_with(".md") || !classify::is_auditable(&rel) {
                continue;
            }
            if let Some(entry) = measure(root, item.path()) {
                entries.push(entry);
            }
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));

    let total_tokens: usize = entries.iter().map(|e| e.tokens).sum();
    let total_level = level_for(total_tokens, TOTAL_WARNING, TOTAL_CRITICAL);

    Ok(AuditReport {
        entries,
        total_tokens,
        total_level,
    })
}

/// Render the report as plain text for the CLI and the MCP tool.
pub fn format_report(report: &AuditReport) -> String {
    let mut out = String::from("Autoload audit\n");
    out.push_str(&"=".repeat(40));
    out.push('\n');

    if report.entries.is_empty() {
        out.push_str("  no autoload files found\n");
    }
    for entry in &report.entries {
        out.push_str(&format!(
            "  [{:<8}] {:>6} tokens  {}\n",
            entry.level, entry.tokens, entry.path
        ));
    }
    out.push_str(&format!(
        "\nTotal: {} estimated tokens [{}]\n",
        report.total_tokens, report.total_level
    ));
    out
}

fn measure(root: &Path, path: &Path) -> Option<AuditEntry> {
    let rel = classify::to_relative(root, path)?;
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %rel, error = %e, "skipping unreadable autoload file");
            return None;
        }
    };
    let tokens = estimate_tokens(&contents);
    let level = file_level(&rel, tokens);
    Some(AuditEntry {
        path: rel,
        tokens,
        level,
    })
}

/// Per-file tier. Only the named targets carry per-file thresholds;
/// everything else just contributes to the total.
fn file_level(rel: &str, tokens: usize) -> AuditLevel {
    let basename = rel.rsplit('/').next().unwrap_or(rel);
    match basename {
        "CLAUDE.md" | "AGENTS.md" => level_for(tokens, AGENT_FILE_WARNING, AGENT_FILE_CRITICAL),
        "SKILL.md" => level_for(tokens, SKILL_FILE_WARNING, SKILL_FILE_CRITICAL),
        _ => AuditLevel::Ok,
    }
}

fn level_for(tokens: usize, warning: usize, critical: usize) -> AuditLevel {
    if tokens > critical {
        AuditLevel::Critical
    } else if tokens > warning {
        AuditLevel::Warning
    } else {
        AuditLevel::Ok
    }
}
