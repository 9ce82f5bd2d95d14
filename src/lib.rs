//! On-demand semantic knowledge index for AI coding agents.
//!
//! memory-forge maintains a derived vector index over the markdown files in a
//! project's `knowledge/` tree, so an agent can retrieve only the fragments
//! relevant to its current task instead of loading the whole corpus into
//! every session. The markdown tree is the sole source of truth; everything
//! under `.memory-forge/` (the SQLite index and the content manifest) is
//! regenerable. Files that an agent host autoloads at session start — root
//! `CLAUDE.md` and `AGENTS.md`, plus anything under `.claude/`, `.codex/`,
//! or `.opencode/` — are never indexed, only audited against token
//! thresholds.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   for vector persistence; a JSON manifest of content hashes drives
//!   incremental re-indexing
//! - **Embeddings**: local ONNX Runtime with
//!   paraphrase-multilingual-MiniLM-L12-v2 (384 dimensions, multilingual)
//! - **Freshness**: every search re-hashes the corpus against the manifest
//!   before ranking — no filesystem watchers, no background threads
//! - **Transport**: MCP over stdio, plus an equivalent CLI
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, metadata, and the manifest
//! - [`embedding`] — Text-to-vector embedding pipeline via ONNX Runtime
//! - [`knowledge`] — Core engine: classify, chunk, sync, search, audit, retention

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod knowledge;
