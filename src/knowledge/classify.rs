//! Path classification — the single chokepoint enforcing the core rule
//! that autoload files are never indexed.
//!
//! Both predicates evaluate a path in its relative, forward-slash form.
//! They are disjoint by construction: an auditable path is never
//! indexable, even inside `knowledge/`. Every write path into the store
//! goes through [`is_indexable`].

use std::path::Path;

/// The only directory whose markdown files are indexed.
pub const KNOWLEDGE_DIR: &str = "knowledge";

/// Root-level files an agent host autoloads at session start.
const AUTOLOAD_BASENAMES: [&str; 2] = ["CLAUDE.md", "AGENTS.md"];

/// Directories whose entire contents are autoloaded.
const AUTOLOAD_DIRS: [&str; 3] = [".claude", ".codex", ".opencode"];

/// `true` iff the relative path lies under `knowledge/`, ends with `.md`,
/// and is not auditable.
pub fn is_indexable(rel: &str) -> bool {
    if is_auditable(rel) {
        return false;
    }
    let rel = normalize_separators(rel);
    rel.starts_with("knowledge/") && rel.ends_with(".md")
}

/// `true` iff the basename is `CLAUDE.md` or `AGENTS.md`, or any path
/// segment is one of the autoload directories.
pub fn is_auditable(rel: &str) -> bool {
    let rel = normalize_separators(rel);
    let mut segments = rel.split('/').filter(|s| !s.is_empty()).peekable();

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            // Last segment: the basename
            if AUTOLOAD_BASENAMES.contains(&segment) {
                return true;
            }
        } else if AUTOLOAD_DIRS.contains(&segment) {
            return true;
        }
    }
    false
}

/// Convert an absolute path under `root` to its relative forward-slash
/// form. Returns `None` for paths outside the root.
pub fn to_relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn normalize_separators(rel: &str) -> String {
    rel.replace('\\', "/")
}
