use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::ArchitectError;
use crate::util::unix_now_millis;

/// A saved step-1 output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Unix milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
}

impl BlueprintRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

/// Blueprint repository, stateless.
pub struct BlueprintRepo;

impl BlueprintRepo {
    /// Insert or replace a blueprint. An existing record keeps its
    /// `created_at`; `updated_at` is always refreshed.
    pub fn save(
        conn: &Connection,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<BlueprintRecord, ArchitectError> {
        let now = unix_now_millis();
        conn.execute(
            "INSERT INTO blueprints (id, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 content = excluded.content,
                 updated_at = excluded.updated_at",
            params![id, title, content, now],
        )?;
        Self::get(conn, id)?.ok_or_else(|| {
            ArchitectError::Storage(format!("Blueprint '{id}' missing after save"))
        })
    }

    pub fn get(conn: &Connection, id: &str) -> Result<Option<BlueprintRecord>, ArchitectError> {
        let record = conn
            .query_row(
                "SELECT id, title, content, created_at, updated_at
                 FROM blueprints WHERE id = ?1",
                params![id],
                BlueprintRecord::from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// All blueprints, least recently updated first.
    pub fn list(conn: &Connection) -> Result<Vec<BlueprintRecord>, ArchitectError> {
        let mut stmt = conn.prepare(
            "SELECT id, title, content, created_at, updated_at
             FROM blueprints ORDER BY updated_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([], BlueprintRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete(conn: &Connection, id: &str) -> Result<bool, ArchitectError> {
        let changed = conn.execute("DELETE FROM blueprints WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
