//! CLI `stats` command.

use anyhow::Result;
use std::path::Path;

/// Display index statistics in the terminal.
pub fn stats(root: &Path) -> Result<()> {
    let conn = crate::db::open_database(root)?;
    let response = crate::knowledge::stats::knowledge_stats(&conn, root)?;

    println!("Knowledge Index Statistics");
    println!("{}", "=".repeat(40));
    println!("  Files:               {}", response.files);
    println!("  Chunks:              {}", response.chunks);
    println!();

    if !response.chunks_by_type.is_empty() {
        println!("Chunks by type:");
        for (chunk_type, count) in &response.chunks_by_type {
            println!("  {:<14} {}", chunk_type, count);
        }
        println!();
    }

    if let Some(ref last) = response.last_indexed {
        println!("Last indexed:          {last}");
    }
    if let Some(ref model) = response.model_id {
        println!("Embedding model:       {model}");
    }
    if let Some(ref most) = response.most_accessed {
        println!("Most accessed:         {} ({}x)", most.path, most.access_count);
    }
    if let Some(ref least) = response.least_accessed {
        println!("Least accessed:        {} ({}x)", least.path, least.access_count);
    }
    println!("Never accessed:        {}", response.never_accessed);
    println!("Database size:         {} bytes", response.db_size_bytes);

    Ok(())
}
