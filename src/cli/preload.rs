//! CLI `preload` command — print the highest-priority chunks up to a
//! token budget, as a block an agent can inject at session start.

use anyhow::Result;
use std::path::Path;

use crate::config::ForgeConfig;
use crate::knowledge::normalize::estimate_tokens;
use crate::knowledge::store;

pub fn preload(config: &ForgeConfig, root: &Path) -> Result<()> {
    let conn = crate::db::open_database(root)?;
    let mut chunks = store::list_chunks(&conn, None)?;
    if chunks.is_empty() {
        println!("Knowledge index is empty. Run `memory-forge index` first.");
        return Ok(());
    }

    // Highest-signal first: skill frontmatter and triggers lead.
    chunks.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.file_path.cmp(&b.file_path))
            .then(a.id.cmp(&b.id))
    });

    let budget = config.search.preload_token_budget;
    let mut spent = 0usize;
    let mut printed = 0usize;

    for chunk in &chunks {
        let tokens = estimate_tokens(&chunk.content);
        if printed > 0 && spent + tokens > budget {
            break;
        }
        let provenance = match &chunk.heading {
            Some(heading) => format!("{} — {heading}", chunk.file_path),
            None => chunk.file_path.clone(),
        };
        println!("## {provenance}");
        println!("{}", chunk.content);
        println!();
        spent += tokens;
        printed += 1;
    }

    eprintln!("({printed} chunks, ~{spent} tokens of {budget} budget)");
    Ok(())
}
