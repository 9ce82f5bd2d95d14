pub mod audit_knowledge;
pub mod forget_knowledge;
pub mod index_knowledge;
pub mod knowledge_stats;
pub mod save_knowledge;
pub mod search_knowledge;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use audit_knowledge::AuditKnowledgeParams;
use forget_knowledge::ForgetKnowledgeParams;
use index_knowledge::IndexKnowledgeParams;
use knowledge_stats::KnowledgeStatsParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use save_knowledge::SaveKnowledgeParams;
use search_knowledge::SearchKnowledgeParams;

use crate::config::ForgeConfig;
use crate::embedding::LazyEmbedder;
use crate::knowledge::retention::ForgetConfig;
use crate::knowledge::save::{SaveRequest, SaveType};
use crate::knowledge::search::SearchOptions;
use crate::knowledge::types::SourceType;
use crate::knowledge::{audit, retention, save, search, stats, sync};

/// The memory-forge MCP tool handler. Holds shared state (db connection,
/// lazy embedder, project root, config) and exposes all tools via the
/// `#[tool_router]` macro.
#[derive(Clone)]
pub struct ForgeTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    embedder: Arc<LazyEmbedder>,
    root: Arc<PathBuf>,
    config: Arc<ForgeConfig>,
}

#[tool_router]
impl ForgeTools {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        embedder: Arc<LazyEmbedder>,
        root: Arc<PathBuf>,
        config: Arc<ForgeConfig>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            embedder,
            root,
            config,
        }
    }

    /// Search the knowledge index and return ready-to-inject context.
    #[tool(description = "Semantic search over the project's knowledge base. Auto-syncs the index first, so results are never stale. Returns plain-text context ready for injection.")]
    async fn search_knowledge(
        &self,
        Parameters(params): Parameters<SearchKnowledgeParams>,
    ) -> Result<String, String> {
        if params.query.trim().is_empty() {
            return Err("query must not be empty".into());
        }
        let source_types = match &params.source_type {
            Some(raw) => Some(parse_source_types(raw)?),
            None => None,
        };
        let opts = SearchOptions {
            limit: params.limit.unwrap_or(self.config.search.default_limit),
            threshold: params.threshold.unwrap_or(self.config.search.default_threshold),
            source_types,
            unique_files: params.unique_files.unwrap_or(false),
            include_content: true,
        };

        tracing::info!(query = %params.query, limit = opts.limit, "search_knowledge called");

        let db = Arc::clone(&self.db);
        let embedder = Arc::clone(&self.embedder);
        let root = Arc::clone(&self.root);
        let query = params.query;

        let hits = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let provider = embedder.get()?;
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            search::search_knowledge(&mut conn, provider.as_ref(), &root, &query, &opts)
        })
        .await
        .map_err(|e| format!("search task failed: {e}"))?
        .map_err(|e| format!("search failed: {e:#}"))?;

        Ok(search::format_context(&hits))
    }

    /// Save a new knowledge file and index it.
    #[tool(description = "Save a new knowledge file under knowledge/ and re-index. Types: skill (reusable fix with trigger/problem/solution) or context (project facts). Never overwrites existing files.")]
    async fn save_knowledge(
        &self,
        Parameters(params): Parameters<SaveKnowledgeParams>,
    ) -> Result<String, String> {
        let save_type: SaveType = params.r#type.parse().map_err(|e: String| e)?;

        let request = SaveRequest {
            save_type,
            name: params.name,
            content: params.content,
            description: params.description,
            trigger: params.trigger,
            problem: params.problem,
            importance: params.importance,
        };

        tracing::info!(name = %request.name, save_type = ?save_type, "save_knowledge called");

        let db = Arc::clone(&self.db);
        let embedder = Arc::clone(&self.embedder);
        let root = Arc::clone(&self.root);

        let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let provider = embedder.get()?;
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            save::save_knowledge(&mut conn, provider.as_ref(), &root, &request)
        })
        .await
        .map_err(|e| format!("save task failed: {e}"))?
        .map_err(|e| format!("save failed: {e:#}"))?;

        Ok(serde_json::json!({
            "path": outcome.path,
            "indexed": outcome.report.indexed,
        })
        .to_string())
    }

    /// Re-index the knowledge tree.
    #[tool(description = "Synchronize the index with the knowledge tree. Pass force=true to clear and rebuild from scratch.")]
    async fn index_knowledge(
        &self,
        Parameters(params): Parameters<IndexKnowledgeParams>,
    ) -> Result<String, String> {
        let force = params.force.unwrap_or(false);
        tracing::info!(force, "index_knowledge called");

        let db = Arc::clone(&self.db);
        let embedder = Arc::clone(&self.embedder);
        let root = Arc::clone(&self.root);

        let report = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let provider = embedder.get()?;
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            if force {
                sync::force_reindex(&mut conn, provider.as_ref(), &root)
            } else {
                sync::sync_project(&mut conn, provider.as_ref(), &root)
            }
        })
        .await
        .map_err(|e| format!("index task failed: {e}"))?
        .map_err(|e| format!("indexing failed: {e:#}"))?;

        serde_json::to_string(&report).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Report index statistics.
    #[tool(description = "Index statistics: file/chunk counts, last index time, access extremes.")]
    async fn knowledge_stats(
        &self,
        Parameters(_params): Parameters<KnowledgeStatsParams>,
    ) -> Result<String, String> {
        let db = Arc::clone(&self.db);
        let root = Arc::clone(&self.root);

        let response = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            stats::knowledge_stats(&conn, &root)
        })
        .await
        .map_err(|e| format!("stats task failed: {e}"))?
        .map_err(|e| format!("stats failed: {e:#}"))?;

        serde_json::to_string(&response).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Audit autoload files against token thresholds.
    #[tool(description = "Read-only audit of autoload files (CLAUDE.md, AGENTS.md, .claude/, .codex/, .opencode/) against token thresholds.")]
    async fn audit_knowledge(
        &self,
        Parameters(_params): Parameters<AuditKnowledgeParams>,
    ) -> Result<String, String> {
        let root = Arc::clone(&self.root);
        let report = tokio::task::spawn_blocking(move || audit::audit_autoload(&root))
            .await
            .map_err(|e| format!("audit task failed: {e}"))?
            .map_err(|e| format!("audit failed: {e:#}"))?;

        Ok(audit::format_report(&report))
    }

    /// Remove stale files from the index under configured caps.
    #[tool(description = "Forget stale indexed files (source files are untouched). Requires max_files and/or max_age_days. Files with importance >= 8 are never deleted.")]
    async fn forget_knowledge(
        &self,
        Parameters(params): Parameters<ForgetKnowledgeParams>,
    ) -> Result<String, String> {
        if params.max_files.is_none() && params.max_age_days.is_none() {
            return Err("specify at least one of max_files or max_age_days".into());
        }
        let config = ForgetConfig {
            max_files: params.max_files,
            max_age_days: params.max_age_days,
            protect_importance: Some(self.config.retention.protect_importance),
        };

        tracing::info!(?config, "forget_knowledge called");

        let db = Arc::clone(&self.db);
        let report = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            retention::forget_stale(&mut conn, &config, false)
        })
        .await
        .map_err(|e| format!("forget task failed: {e}"))?
        .map_err(|e| format!("forget failed: {e:#}"))?;

        serde_json::to_string(&report).map_err(|e| format!("serialization failed: {e}"))
    }
}

fn parse_source_types(raw: &str) -> Result<Vec<SourceType>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<SourceType>())
        .collect()
}

#[tool_handler]
impl ServerHandler for ForgeTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "memory-forge is an on-demand knowledge index. Use search_knowledge \
                 before starting work to pull in relevant project knowledge, \
                 save_knowledge to persist new skills or context, and audit_knowledge \
                 to check autoload file sizes."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
