use crate::error::{HutError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key to opaque value side table
///
/// Values are serialized to JSON bytes on write and deserialized on read.
/// The table is independent of the main table's schema and rows.
pub trait MetadataStore {
    /// Upsert raw bytes under `key`
    fn store_meta_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Raw bytes stored under `key`, `None` if the key was never stored
    fn fetch_meta_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Every stored key, sorted
    fn meta_keys(&self) -> Result<Vec<String>>;

    fn store_meta<T>(&self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(value).map_err(|source| HutError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.store_meta_bytes(key, &bytes)
    }

    fn fetch_meta<T>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
        T: DeserializeOwned,
    {
        let Some(bytes) = self.fetch_meta_bytes(key)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| HutError::Deserialization {
                key: key.to_string(),
                source,
            })
    }
}
