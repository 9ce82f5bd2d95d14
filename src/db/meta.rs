//! Scalar index metadata stored in the `index_meta` table.
//!
//! Holds the schema version and the embedding-model identifier that
//! produced every currently stored vector. Mixing vectors from different
//! models silently degrades retrieval, so a model mismatch forces a full
//! clear-and-rebuild (see the synchronizer).

use rusqlite::Connection;

/// The schema version that the current binary expects. The index is a
/// regenerable artifact, so there is no migration framework: anything
/// newer than this is refused, anything older is cleared and rebuilt.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM index_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Get the stored embedding model identifier, if any.
pub fn get_model_id(conn: &Connection) -> rusqlite::Result<Option<String>> {
    match conn.query_row(
        "SELECT value FROM index_meta WHERE key = 'embedding_model'",
        [],
        |row| row.get::<_, String>(0),
    ) {
        Ok(val) => Ok(Some(val)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Set the stored embedding model identifier.
pub fn set_model_id(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('embedding_model', ?1)",
        [model],
    )?;
    Ok(())
}

/// Remove the stored embedding model identifier (used on full clear).
pub fn clear_model_id(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM index_meta WHERE key = 'embedding_model'", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn fresh_db_has_current_schema_version() {
        let conn = test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn model_id_absent_on_fresh_db() {
        let conn = test_db();
        assert!(get_model_id(&conn).unwrap().is_none());
    }

    #[test]
    fn set_and_get_model_id() {
        let conn = test_db();
        set_model_id(&conn, "paraphrase-multilingual-MiniLM-L12-v2").unwrap();
        assert_eq!(
            get_model_id(&conn).unwrap().as_deref(),
            Some("paraphrase-multilingual-MiniLM-L12-v2")
        );

        set_model_id(&conn, "replacement-model").unwrap();
        assert_eq!(get_model_id(&conn).unwrap().as_deref(), Some("replacement-model"));
    }

    #[test]
    fn clear_model_id_removes_key() {
        let conn = test_db();
        set_model_id(&conn, "some-model").unwrap();
        clear_model_id(&conn).unwrap();
        assert!(get_model_id(&conn).unwrap().is_none());
    }
}
