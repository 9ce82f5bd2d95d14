pub mod manifest;
pub mod meta;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use std::path::{Path, PathBuf};
use std::sync::Once;

use crate::error::FatalError;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Returns `<root>/.memory-forge/` — the derived-artifact directory.
/// Must be gitignored; everything in it is regenerable.
pub fn forge_dir(root: &Path) -> PathBuf {
    root.join(".memory-forge")
}

/// Returns `<root>/.memory-forge/index.db`.
pub fn db_path(root: &Path) -> PathBuf {
    forge_dir(root).join("index.db")
}

/// Open (or create) the index database for a project, with the sqlite-vec
/// extension loaded and the schema initialized.
pub fn open_database(root: &Path) -> Result<Connection> {
    let path = db_path(root);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    load_sqlite_vec();

    let conn = Connection::open(&path).with_context(|| {
        format!(
            "failed to open index database at {}. The index is regenerable: \
             delete .memory-forge/ and run `memory-forge index` to rebuild.",
            path.display()
        )
    })?;

    // WAL for concurrent-read friendliness; the engine itself is single-writer
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", "5000")?;

    schema::init_schema(&conn).context("failed to initialize schema")?;

    let version = meta::get_schema_version(&conn).context("failed to read schema version")?;
    if version > meta::CURRENT_SCHEMA_VERSION {
        return Err(anyhow::Error::new(FatalError(format!(
            "index schema version {version} is newer than this binary supports \
             ({}); upgrade memory-forge or delete .memory-forge/",
            meta::CURRENT_SCHEMA_VERSION
        ))));
    }

    let integrity: String = conn.pragma_query_value(None, "quick_check", |row| row.get(0))?;
    if integrity != "ok" {
        return Err(anyhow::Error::new(FatalError(format!(
            "index database integrity check failed: {integrity}. \
             Delete .memory-forge/ and run `memory-forge index` to rebuild."
        ))));
    }

    tracing::debug!(path = %path.display(), "index database ready");
    Ok(conn)
}

/// Open an in-memory database for testing.
#[cfg(test)]
pub fn open_memory_database() -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_database_creates_forge_dir() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_database(dir.path()).unwrap();
        assert!(forge_dir(dir.path()).is_dir());
        assert!(db_path(dir.path()).exists());
        drop(conn);

        // Reopening an existing database is fine
        open_database(dir.path()).unwrap();
    }

    #[test]
    fn newer_schema_version_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        {
            let conn = open_database(dir.path()).unwrap();
            conn.execute(
                "UPDATE index_meta SET value = '999' WHERE key = 'schema_version'",
                [],
            )
            .unwrap();
        }

        let err = open_database(dir.path()).unwrap_err();
        assert!(crate::error::is_fatal(&err));
    }
}
