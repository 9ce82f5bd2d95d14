//! CLI `clear` command — drop the derived index after confirmation.

use anyhow::{bail, Result};
use std::io::Write;
use std::path::Path;

use crate::db::manifest::Manifest;

/// Delete all indexed data (chunks, vectors, file records, manifest).
/// The markdown tree is untouched — the index is fully regenerable.
pub fn clear(root: &Path, yes: bool) -> Result<()> {
    if !yes {
        println!("This clears the derived index (chunks, vectors, manifest).");
        println!("Source files under knowledge/ are NOT touched.");
        print!("\nType YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim() != "YES" {
            bail!("clear cancelled");
        }
    }

    let mut conn = crate::db::open_database(root)?;
    crate::knowledge::store::clear(&mut conn)?;
    Manifest::delete(root)?;

    println!("Index cleared. Run `memory-forge index` to rebuild.");
    Ok(())
}
