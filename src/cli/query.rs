//! CLI `query` command — semantic search with selectable output format.

use anyhow::Result;
use std::path::Path;

use crate::config::ForgeConfig;
use crate::embedding::LazyEmbedder;
use crate::knowledge::search::{self, SearchOptions};
use crate::knowledge::types::SourceType;

pub enum OutputFormat {
    /// Human-readable result list (default).
    Human,
    /// JSON array of hits.
    Json,
    /// Plain-text context block for prompt injection.
    Context,
}

#[allow(clippy::too_many_arguments)]
pub fn query(
    config: &ForgeConfig,
    root: &Path,
    text: &str,
    limit: Option<usize>,
    threshold: Option<f32>,
    unique: bool,
    types: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let source_types = types
        .map(parse_source_types)
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let opts = SearchOptions {
        limit: limit.unwrap_or(config.search.default_limit),
        threshold: threshold.unwrap_or(config.search.default_threshold),
        source_types,
        unique_files: unique,
        include_content: true,
    };

    let mut conn = crate::db::open_database(root)?;
    let embedder = LazyEmbedder::new(config.embedding.clone());
    let provider = embedder.get()?;

    let hits = search::search_knowledge(&mut conn, provider.as_ref(), root, text, &opts)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hits)?),
        OutputFormat::Context => println!("{}", search::format_context(&hits)),
        OutputFormat::Human => {
            if hits.is_empty() {
                println!("No results above threshold {:.2}.", opts.threshold);
                return Ok(());
            }
            for (i, hit) in hits.iter().enumerate() {
                let heading = hit
                    .heading
                    .as_deref()
                    .map(|h| format!(" — {h}"))
                    .unwrap_or_default();
                println!(
                    "{:>2}. [{:.2}] {}{heading} ({}/{})",
                    i + 1,
                    hit.score,
                    hit.file_path,
                    hit.source_type,
                    hit.chunk_type
                );
                if let Some(content) = &hit.content {
                    for line in content.lines().take(3) {
                        println!("      {line}");
                    }
                    if content.lines().count() > 3 {
                        println!("      ...");
                    }
                }
            }
        }
    }
    Ok(())
}

fn parse_source_types(raw: &str) -> Result<Vec<SourceType>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<SourceType>())
        .collect()
}
