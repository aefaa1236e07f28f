use std::path::Path;

use rusqlite::{Connection, params};

use cw_core::{Embedding, RosterEntry};

use crate::error::{Result, StoreError};
use crate::schema;

/// Roster row as stored, for listings — embedding omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub present: bool,
    pub attention_percent: i64,
    pub attention_seconds: f64,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Enrollment ---

    /// Add or replace a person. New enrollments start absent with zero
    /// attention; embeddings are stored at the canonical f32 width.
    pub fn enroll(
        &self,
        first_name: &str,
        last_name: &str,
        roster_id: &str,
        embedding: &Embedding,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO people
             (roster_id, first_name, last_name, embedding, present, attention_percent, attention_seconds)
             VALUES (?1, ?2, ?3, ?4, 0, 0, 0)",
            params![roster_id, first_name, last_name, embedding.to_blob()],
        )?;
        Ok(())
    }

    /// Load all matchable roster entries.
    ///
    /// Blobs may be stored at either legacy byte width; rows that fail the
    /// decode or finiteness check are dropped here and never matched
    /// against.
    pub fn load_roster(&self) -> Result<Vec<RosterEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT roster_id, first_name, last_name, embedding FROM people ORDER BY rowid")?;

        let rows: Vec<(String, String, String, Vec<u8>)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<std::result::Result<_, _>>()?;

        let mut roster = Vec::with_capacity(rows.len());
        for (id, first, last, blob) in rows {
            match Embedding::from_blob(&blob) {
                Ok(embedding) => roster.push(RosterEntry {
                    id,
                    display_name: format!("{first} {last}"),
                    embedding,
                }),
                Err(e) => {
                    tracing::warn!("dropping roster entry {id}: {e}");
                }
            }
        }

        tracing::info!("loaded {} roster entries", roster.len());
        Ok(roster)
    }

    // --- Attendance ---

    /// Flag a person as present. Idempotent — safe to repeat every frame.
    pub fn mark_present(&self, roster_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE people SET present = 1 WHERE roster_id = ?1",
            [roster_id],
        )?;
        Ok(())
    }

    /// Upsert a person's final attention figures. Idempotent by key.
    pub fn save_attention(&self, roster_id: &str, percent: u8, seconds: f64) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE people SET attention_percent = ?1, attention_seconds = ?2 WHERE roster_id = ?3",
            params![percent as i64, seconds, roster_id],
        )?;
        if rows == 0 {
            return Err(StoreError::InvalidData(format!(
                "not enrolled: {roster_id}"
            )));
        }
        Ok(())
    }

    /// Clear presence and attention for everyone, ahead of a new session.
    pub fn reset_attendance(&self) -> Result<()> {
        self.conn.execute(
            "UPDATE people SET present = 0, attention_percent = 0, attention_seconds = 0",
            [],
        )?;
        Ok(())
    }

    pub fn list_people(&self) -> Result<Vec<Person>> {
        let mut stmt = self.conn.prepare(
            "SELECT roster_id, first_name, last_name, present, attention_percent, attention_seconds
             FROM people ORDER BY last_name, first_name",
        )?;

        let people = stmt
            .query_map([], |row| {
                Ok(Person {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    present: row.get::<_, i64>(3)? != 0,
                    attention_percent: row.get(4)?,
                    attention_seconds: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(people)
    }
}
