//! CLI `memory` command — index health report.

use anyhow::Result;
use std::path::Path;

use crate::db::{self, manifest::Manifest, meta};
use crate::knowledge::store;

/// Print a health overview of the derived index: paths, versions,
/// integrity, counts, and manifest freshness.
pub fn memory(root: &Path) -> Result<()> {
    let db_path = db::db_path(root);
    let conn = db::open_database(root)?;

    let schema_version = meta::get_schema_version(&conn)?;
    let model_id = meta::get_model_id(&conn)?;
    let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
    let integrity: String = conn.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
    let files = store::count_files(&conn)?;
    let chunks = store::count_chunks(&conn)?;
    let manifest = Manifest::load(root)?;

    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    println!("memory-forge index health");
    println!("{}", "=".repeat(40));
    println!("  Database:        {}", db_path.display());
    println!("  Size:            {db_size} bytes");
    println!("  Schema version:  {schema_version}");
    println!("  sqlite-vec:      {vec_version}");
    println!("  Integrity:       {integrity}");
    println!(
        "  Embedding model: {}",
        model_id.as_deref().unwrap_or("(not set — index never built)")
    );
    println!();
    println!("  Indexed files:   {files}");
    println!("  Stored chunks:   {chunks}");
    println!("  Manifest files:  {}", manifest.files.len());
    println!(
        "  Last indexed:    {}",
        manifest.last_indexed.as_deref().unwrap_or("never")
    );

    if manifest.files.len() as u64 != files {
        println!(
            "\n  note: manifest and store differ by {} file(s) — \
             forgotten files stay listed in the manifest until edited",
            manifest.files.len().abs_diff(files as usize)
        );
    }

    Ok(())
}
