//! CLI `forget` command — retention pass over the index.

use anyhow::Result;
use std::path::Path;

use crate::config::ForgeConfig;
use crate::knowledge::retention::{forget_stale, ForgetConfig};

pub fn forget(
    config: &ForgeConfig,
    root: &Path,
    max_files: Option<usize>,
    max_age_days: Option<u32>,
    dry_run: bool,
) -> Result<()> {
    let mut conn = crate::db::open_database(root)?;
    let retention = ForgetConfig {
        max_files,
        max_age_days,
        protect_importance: Some(config.retention.protect_importance),
    };

    let report = forget_stale(&mut conn, &retention, dry_run)?;

    if report.removed.is_empty() {
        println!("Nothing to forget ({} files examined, {} protected).",
            report.examined, report.protected);
        return Ok(());
    }

    let verb = if dry_run { "would forget" } else { "forgot" };
    for path in &report.removed {
        println!("  {verb}  {path}");
    }
    println!(
        "{}: {} of {} files ({} protected by importance).",
        if dry_run { "Dry run" } else { "Retention" },
        report.removed.len(),
        report.examined,
        report.protected
    );
    if !dry_run {
        println!("Source files were not touched; edit a forgotten file to re-index it.");
    }
    Ok(())
}
