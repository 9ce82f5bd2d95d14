//! CLI `audit` command — autoload token audit.

use anyhow::Result;
use std::path::Path;

use crate::knowledge::audit::{audit_autoload, format_report};

pub fn audit(root: &Path) -> Result<()> {
    let report = audit_autoload(root)?;
    print!("{}", format_report(&report));
    Ok(())
}
