//! MCP server initialization for the stdio transport.
//!
//! Wires the index database, the lazy embedding provider, and the tool
//! handler into a running server. The model is not loaded here — the
//! first tool call that needs it pays the load cost.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use rmcp::ServiceExt;

use crate::config::ForgeConfig;
use crate::db;
use crate::embedding::LazyEmbedder;
use crate::tools::ForgeTools;

/// Start the MCP server over stdio for the given project root.
pub async fn serve_stdio(config: ForgeConfig, root: PathBuf) -> Result<()> {
    tracing::info!(root = %root.display(), "starting memory-forge MCP server on stdio");

    let conn = db::open_database(&root)?;
    let db = Arc::new(Mutex::new(conn));
    let embedder = Arc::new(LazyEmbedder::new(config.embedding.clone()));

    let tools = ForgeTools::new(db, embedder, Arc::new(root), Arc::new(config));
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
