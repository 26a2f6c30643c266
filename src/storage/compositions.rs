use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::ArchitectError;
use crate::util::unix_now_millis;

/// A saved step-2 output, linked to the blueprint it was composed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionRecord {
    pub id: String,
    pub blueprint_id: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CompositionRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            blueprint_id: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

pub struct CompositionRepo;

impl CompositionRepo {
    /// Insert or replace a composition, keeping `created_at` of an existing record.
    pub fn save(
        conn: &Connection,
        id: &str,
        blueprint_id: &str,
        content: &str,
    ) -> Result<CompositionRecord, ArchitectError> {
        let now = unix_now_millis();
        conn.execute(
            "INSERT INTO compositions (id, blueprint_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 blueprint_id = excluded.blueprint_id,
                 content = excluded.content,
                 updated_at = excluded.updated_at",
            params![id, blueprint_id, content, now],
        )?;
        Self::get(conn, id)?.ok_or_else(|| {
            ArchitectError::Storage(format!("Composition '{id}' missing after save"))
        })
    }

    pub fn get(conn: &Connection, id: &str) -> Result<Option<CompositionRecord>, ArchitectError> {
        let record = conn
            .query_row(
                "SELECT id, blueprint_id, content, created_at, updated_at
                 FROM compositions WHERE id = ?1",
                params![id],
                CompositionRecord::from_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn list_by_blueprint(
        conn: &Connection,
        blueprint_id: &str,
    ) -> Result<Vec<CompositionRecord>, ArchitectError> {
        let mut stmt = conn.prepare(
            "SELECT id, blueprint_id, content, created_at, updated_at
             FROM compositions WHERE blueprint_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![blueprint_id], CompositionRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
