mod blueprints;
mod compositions;
mod settings;

pub use blueprints::{BlueprintRecord, BlueprintRepo};
pub use compositions::{CompositionRecord, CompositionRepo};
pub use settings::{SettingsRepo, StoredSettings, SETTINGS_KEY};

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::error::ArchitectError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS blueprints (
    id         TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_blueprints_updated_at ON blueprints(updated_at);
CREATE TABLE IF NOT EXISTS compositions (
    id           TEXT PRIMARY KEY,
    blueprint_id TEXT NOT NULL,
    content      TEXT NOT NULL,
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_compositions_blueprint_id ON compositions(blueprint_id);
";

/// Owner of the database connection.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchitectError::Storage`] when the file cannot be opened or
    /// the schema cannot be applied.
    pub fn open(path: &str) -> Result<Self, ArchitectError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`ArchitectError::Storage`] when the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self, ArchitectError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, ArchitectError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, ArchitectError>,
    ) -> Result<T, ArchitectError> {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn get_settings(&self) -> Result<Option<StoredSettings>, ArchitectError> {
        self.with_conn(SettingsRepo::get)
    }

    pub fn save_settings(&self, settings: &StoredSettings) -> Result<(), ArchitectError> {
        self.with_conn(|conn| SettingsRepo::save(conn, settings))
    }

    pub fn save_blueprint(
        &self,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<BlueprintRecord, ArchitectError> {
        self.with_conn(|conn| BlueprintRepo::save(conn, id, title, content))
    }

    pub fn get_blueprint(&self, id: &str) -> Result<Option<BlueprintRecord>, ArchitectError> {
        self.with_conn(|conn| BlueprintRepo::get(conn, id))
    }

    pub fn list_blueprints(&self) -> Result<Vec<BlueprintRecord>, ArchitectError> {
        self.with_conn(BlueprintRepo::list)
    }

    /// Returns whether a record was removed.
    pub fn delete_blueprint(&self, id: &str) -> Result<bool, ArchitectError> {
        self.with_conn(|conn| BlueprintRepo::delete(conn, id))
    }

    pub fn save_composition(
        &self,
        id: &str,
        blueprint_id: &str,
        content: &str,
    ) -> Result<CompositionRecord, ArchitectError> {
        self.with_conn(|conn| CompositionRepo::save(conn, id, blueprint_id, content))
    }

    pub fn get_composition(&self, id: &str) -> Result<Option<CompositionRecord>, ArchitectError> {
        self.with_conn(|conn| CompositionRepo::get(conn, id))
    }

    pub fn list_compositions_by_blueprint(
        &self,
        blueprint_id: &str,
    ) -> Result<Vec<CompositionRecord>, ArchitectError> {
        self.with_conn(|conn| CompositionRepo::list_by_blueprint(conn, blueprint_id))
    }
}
