use crate::store::SqliteStore;
use datahut_core::{error::Result, types::META_TABLE, MetadataStore};
use rusqlite::OptionalExtension;

impl MetadataStore for SqliteStore {
    fn store_meta_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.execute(
            &format!(
                "INSERT INTO {} (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                META_TABLE
            ),
            rusqlite::params![key, bytes],
        )?;
        Ok(())
    }

    fn fetch_meta_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut stmt = self.prepare(&format!("SELECT value FROM {} WHERE key = ?1", META_TABLE))?;
        let bytes = stmt
            .query_row([key], |row| row.get::<_, Option<Vec<u8>>>(0))
            .optional()?;
        Ok(bytes.flatten())
    }

    fn meta_keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.prepare(&format!("SELECT key FROM {} ORDER BY key", META_TABLE))?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}
