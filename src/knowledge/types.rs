//! Core index type definitions.
//!
//! Defines [`SourceType`] (the origin category of a chunk), [`ChunkType`]
//! (the semantic role within its file), [`Chunk`] (a retrievable unit),
//! and [`FileRecord`] (one row per indexed knowledge file).

use serde::{Deserialize, Serialize};

/// Origin category of a chunk.
///
/// Under the current contract every indexed chunk is `Knowledge` or
/// `Skill`; `ClaudeMd`/`AgentsMd` survive only so legacy indices that
/// predate the autoload-exclusion rule can still be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// A knowledge file with skill frontmatter (`name` + `description`).
    Skill,
    /// A plain context file under `knowledge/`.
    Knowledge,
    /// Legacy: chunks read from an old index that contained `CLAUDE.md`.
    ClaudeMd,
    /// Legacy: chunks read from an old index that contained `AGENTS.md`.
    AgentsMd,
}

impl SourceType {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Knowledge => "knowledge",
            Self::ClaudeMd => "claude-md",
            Self::AgentsMd => "agents-md",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skill" => Ok(Self::Skill),
            "knowledge" => Ok(Self::Knowledge),
            "claude-md" => Ok(Self::ClaudeMd),
            "agents-md" => Ok(Self::AgentsMd),
            _ => Err(format!("unknown source type: {s}")),
        }
    }
}

/// Semantic role of a chunk within its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    /// Skill name + description — the strongest retrieval signal.
    Frontmatter,
    /// A skill's canonical `## Problem` section.
    Problem,
    /// A skill's canonical `## Trigger` section.
    Trigger,
    /// A skill's canonical `## Solution` section.
    Solution,
    /// A skill's canonical `## Verification` section.
    Verification,
    /// A heading-delimited slice of a context file (or a non-canonical
    /// skill section).
    Section,
    /// Fallback for files without headings.
    Full,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontmatter => "frontmatter",
            Self::Problem => "problem",
            Self::Trigger => "trigger",
            Self::Solution => "solution",
            Self::Verification => "verification",
            Self::Section => "section",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChunkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frontmatter" => Ok(Self::Frontmatter),
            "problem" => Ok(Self::Problem),
            "trigger" => Ok(Self::Trigger),
            "solution" => Ok(Self::Solution),
            "verification" => Ok(Self::Verification),
            "section" => Ok(Self::Section),
            "full" => Ok(Self::Full),
            _ => Err(format!("unknown chunk type: {s}")),
        }
    }
}

/// A retrievable chunk, matching the `chunks` table schema. The vector is
/// co-stored in the `chunks_vec` table under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic id derived from `(file path, chunk type, ordinal)`.
    pub id: String,
    /// Relative path of the parent file record.
    pub file_path: String,
    pub source_type: SourceType,
    pub chunk_type: ChunkType,
    /// The chunk text.
    pub content: String,
    /// Section path label (e.g. `"Build > Testing"`), if any.
    pub heading: Option<String>,
    /// Ranking bias in 1..10; higher is boosted (bounded at +20%).
    pub priority: u8,
    /// Free-form provenance metadata (`sectionPath`, `skillName`, line range).
    pub metadata: Option<serde_json::Value>,
}

/// One indexed knowledge file, matching the `files` table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Relative forward-slash path under the project root.
    pub path: String,
    /// Lowercase-hex SHA-256 of the normalized content.
    pub content_hash: String,
    /// Retention weight in 1..10; ≥ 8 is protected from forgetting.
    /// Does not affect ranking.
    pub importance: u8,
    /// Number of searches that returned a chunk of this file.
    pub access_count: u32,
    /// ISO 8601 timestamp of the last search hit, or `None` if never hit.
    pub last_accessed: Option<String>,
    /// ISO 8601 timestamp of the first indexing of the current content.
    pub indexed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_roundtrips_through_strings() {
        for st in [
            SourceType::Skill,
            SourceType::Knowledge,
            SourceType::ClaudeMd,
            SourceType::AgentsMd,
        ] {
            assert_eq!(st.as_str().parse::<SourceType>().unwrap(), st);
        }
        assert!("autoload".parse::<SourceType>().is_err());
    }

    #[test]
    fn chunk_type_roundtrips_through_strings() {
        for ct in [
            ChunkType::Frontmatter,
            ChunkType::Problem,
            ChunkType::Trigger,
            ChunkType::Solution,
            ChunkType::Verification,
            ChunkType::Section,
            ChunkType::Full,
        ] {
            assert_eq!(ct.as_str().parse::<ChunkType>().unwrap(), ct);
        }
    }

    #[test]
    fn source_type_serde_uses_kebab_case() {
        let json = serde_json::to_string(&SourceType::ClaudeMd).unwrap();
        assert_eq!(json, "\"claude-md\"");
    }
}
