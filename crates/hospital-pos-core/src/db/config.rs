//! Configuration record storage.

use rusqlite::OptionalExtension;

use super::{Database, DbResult};
use crate::models::SystemConfig;
use crate::repository::ConfigRepository;

/// Key of the singleton configuration row.
pub const SYSTEM_CONFIG_KEY: &str = "systemConfig";

impl ConfigRepository for Database {
    fn load_config(&self) -> DbResult<Option<SystemConfig>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?",
                [SYSTEM_CONFIG_KEY],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    fn save_config(&mut self, config: &SystemConfig) -> DbResult<()> {
        let json = serde_json::to_string(config)?;
        self.conn.execute(
            r#"
            INSERT INTO config (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            "#,
            [SYSTEM_CONFIG_KEY, json.as_str()],
        )?;
        Ok(())
    }
}
