use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 2;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    // Create tables — for fresh databases this includes attention_seconds.
    // v1 databases predate that column, so we ALTER TABLE below.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS people (
            roster_id         TEXT PRIMARY KEY,
            first_name        TEXT NOT NULL,
            last_name         TEXT NOT NULL,
            embedding         BLOB NOT NULL,
            present           INTEGER NOT NULL DEFAULT 0,
            attention_percent INTEGER NOT NULL DEFAULT 0,
            attention_seconds REAL NOT NULL DEFAULT 0
        );
        ",
    )?;

    // Add attention_seconds to v1 databases that lack it
    if conn
        .prepare("SELECT attention_seconds FROM people LIMIT 0")
        .is_err()
    {
        conn.execute_batch(
            "ALTER TABLE people ADD COLUMN attention_seconds REAL NOT NULL DEFAULT 0;",
        )?;
        tracing::info!("migrated people table: added attention_seconds");
    }

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
