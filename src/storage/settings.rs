use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::ArchitectError;
use crate::generate::ProviderConfig;

/// Fixed key of the single settings record.
pub const SETTINGS_KEY: &str = "user-settings";

/// Provider settings as saved by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl From<StoredSettings> for ProviderConfig {
    fn from(settings: StoredSettings) -> Self {
        ProviderConfig {
            credential: settings.api_key,
            endpoint_base: settings.base_url,
            model: settings.model,
        }
    }
}

/// Settings repository. The record is stored as a JSON document.
pub struct SettingsRepo;

impl SettingsRepo {
    pub fn get(conn: &Connection) -> Result<Option<StoredSettings>, ArchitectError> {
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SETTINGS_KEY],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| ArchitectError::Storage(format!("Corrupt settings record: {e}")))
        })
        .transpose()
    }

    /// Replace the settings record.
    pub fn save(conn: &Connection, settings: &StoredSettings) -> Result<(), ArchitectError> {
        let raw = serde_json::to_string(settings)
            .map_err(|e| ArchitectError::Internal(format!("Failed to encode settings: {e}")))?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![SETTINGS_KEY, raw],
        )?;
        Ok(())
    }
}
