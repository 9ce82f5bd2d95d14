use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ForgeConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub default_threshold: f32,
    pub preload_token_budget: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetentionConfig {
    pub protect_importance: u8,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_forge_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "paraphrase-multilingual-MiniLM-L12-v2".into(),
            cache_dir,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            default_threshold: 0.3,
            preload_token_budget: 2000,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            protect_importance: 8,
        }
    }
}

/// Returns `~/.memory-forge/`
pub fn default_forge_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".memory-forge")
}

/// Returns the default config file path: `~/.memory-forge/config.toml`
pub fn default_config_path() -> PathBuf {
    default_forge_dir().join("config.toml")
}

impl ForgeConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            ForgeConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (MEMORY_FORGE_LOG_LEVEL, MEMORY_FORGE_MODEL_DIR).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEMORY_FORGE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("MEMORY_FORGE_MODEL_DIR") {
            self.embedding.cache_dir = val;
        }
    }

    /// Resolve the model cache directory, expanding `~` if needed.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        expand_tilde(&self.embedding.cache_dir)
    }
}

/// Resolve the project root: explicit flag, then `MEMORY_FORGE_PROJECT_ROOT`,
/// then the current working directory. The result is absolute.
pub fn resolve_project_root(flag: Option<PathBuf>) -> Result<PathBuf> {
    let root = match flag {
        Some(p) => p,
        None => match std::env::var("MEMORY_FORGE_PROJECT_ROOT") {
            Ok(val) if !val.is_empty() => PathBuf::from(val),
            _ => std::env::current_dir().context("failed to read working directory")?,
        },
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("project root does not exist: {}", root.display()))?;
    info!(root = %root.display(), "project root resolved");
    Ok(root)
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ForgeConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.embedding.provider, "local");
        assert_eq!(config.search.default_limit, 5);
        assert!((config.search.default_threshold - 0.3).abs() < 1e-6);
        assert_eq!(config.retention.protect_importance, 8);
        assert!(config.embedding.cache_dir.ends_with("models"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[embedding]
model = "custom-multilingual-model"

[search]
default_limit = 10
"#;
        let config: ForgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.embedding.model, "custom-multilingual-model");
        assert_eq!(config.search.default_limit, 10);
        // defaults still apply for unset fields
        assert_eq!(config.search.preload_token_budget, 2000);
        assert_eq!(config.embedding.provider, "local");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ForgeConfig::default();
        std::env::set_var("MEMORY_FORGE_LOG_LEVEL", "trace");
        std::env::set_var("MEMORY_FORGE_MODEL_DIR", "/tmp/forge-models");

        config.apply_env_overrides();

        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.embedding.cache_dir, "/tmp/forge-models");

        std::env::remove_var("MEMORY_FORGE_LOG_LEVEL");
        std::env::remove_var("MEMORY_FORGE_MODEL_DIR");
    }

    #[test]
    fn resolve_root_prefers_flag() {
        let dir = tempfile::tempdir().unwrap();
        let root = resolve_project_root(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }
}
