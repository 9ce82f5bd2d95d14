//! The content manifest: relative path → content hash.
//!
//! The manifest is the only freshness mechanism — the synchronizer
//! re-hashes every knowledge file and diffs against it to decide what to
//! re-index. Paths are stored relative with forward slashes so the
//! project directory can be moved without triggering a reindex. Stored as
//! `.memory-forge/manifest.json`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manifest {
    /// Relative path → lowercase-hex SHA-256 of normalized content.
    pub files: BTreeMap<String, String>,
    /// ISO 8601 timestamp of the last sync that performed work.
    pub last_indexed: Option<String>,
}

/// Returns `<root>/.memory-forge/manifest.json`.
pub fn manifest_path(root: &Path) -> PathBuf {
    super::forge_dir(root).join("manifest.json")
}

impl Manifest {
    /// Load the manifest for a project. A missing file yields an empty
    /// manifest; a corrupt one is discarded with a warning — the manifest
    /// is a regenerable artifact and the next sync rebuilds it.
    pub fn load(root: &Path) -> Result<Self> {
        let path = manifest_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        match serde_json::from_str(&contents) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt manifest discarded");
                Ok(Self::default())
            }
        }
    }

    /// Persist the manifest atomically (write to a temp file, then rename).
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = manifest_path(root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Delete the manifest file if present (model swap, explicit clear).
    pub fn delete(root: &Path) -> Result<()> {
        let path = manifest_path(root);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    /// Whether the manifest file exists on disk.
    pub fn exists(root: &Path) -> bool {
        manifest_path(root).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manifest_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::load(dir.path()).unwrap();
        assert!(manifest.files.is_empty());
        assert!(manifest.last_indexed.is_none());
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::default();
        manifest
            .files
            .insert("knowledge/api.md".into(), "deadbeef".into());
        manifest.last_indexed = Some("2026-08-01T12:00:00Z".into());
        manifest.save(dir.path()).unwrap();

        let loaded = Manifest::load(dir.path()).unwrap();
        assert_eq!(loaded.files.get("knowledge/api.md").unwrap(), "deadbeef");
        assert_eq!(loaded.last_indexed.as_deref(), Some("2026-08-01T12:00:00Z"));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut manifest = Manifest::default();
        manifest.last_indexed = Some("2026-08-01T12:00:00Z".into());
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("\"lastIndexed\""));
        assert!(json.contains("\"files\""));
    }

    #[test]
    fn corrupt_manifest_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = manifest_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let manifest = Manifest::load(dir.path()).unwrap();
        assert!(manifest.files.is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        Manifest::delete(dir.path()).unwrap();
        Manifest::default().save(dir.path()).unwrap();
        Manifest::delete(dir.path()).unwrap();
        assert!(!Manifest::exists(dir.path()));
    }
}
