//! CLI `list` command — indexed files, or a discovery preview.

use anyhow::Result;
use std::path::Path;

use crate::db::manifest::Manifest;
use crate::knowledge::normalize;
use crate::knowledge::store;
use crate::knowledge::sync;

/// Without `discover`: list indexed file records. With it: walk the
/// knowledge tree and show what a sync would do, without touching the
/// index.
pub fn list(root: &Path, discover: bool) -> Result<()> {
    if discover {
        return discover_preview(root);
    }

    let conn = crate::db::open_database(root)?;
    let files = store::list_files(&conn)?;
    if files.is_empty() {
        println!("No files indexed. Run `memory-forge index` first.");
        return Ok(());
    }

    println!("{:<50} {:>4} {:>6}  {}", "PATH", "IMP", "HITS", "LAST ACCESSED");
    for file in files {
        println!(
            "{:<50} {:>4} {:>6}  {}",
            file.path,
            file.importance,
            file.access_count,
            file.last_accessed.as_deref().unwrap_or("never")
        );
    }
    Ok(())
}

fn discover_preview(root: &Path) -> Result<()> {
    let manifest = Manifest::load(root)?;
    let discovered = sync::discover(root);

    if discovered.is_empty() {
        println!("No indexable files under knowledge/.");
        return Ok(());
    }

    for (rel, abs) in discovered {
        let status = match std::fs::read_to_string(&abs) {
            Ok(raw) => {
                let hash = normalize::content_hash(&raw);
                match manifest.files.get(&rel) {
                    Some(stored) if *stored == hash => "unchanged",
                    Some(_) => "changed",
                    None => "new",
                }
            }
            Err(_) => "unreadable",
        };
        println!("  {status:<10} {rel}");
    }
    Ok(())
}
