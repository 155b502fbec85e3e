//! Unified datahut interface
//!
//! A [`DataHut`] owns one record store and drives the extract and transform
//! pipelines over it.

use crate::extract::{self, ExtractStats};
use crate::transform::{self, TransformStats};
use crate::{Dataset, HutConfig, LogSink, MetadataStore, Record, RecordStore, Result, SqliteStore, TableSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Handle on one store file
///
/// Every method takes `&self`, so extract and transform callbacks may call
/// back into the same hut (early dedup, metadata bookkeeping).
pub struct DataHut {
    store: SqliteStore,
}

impl DataHut {
    /// Open or create the store named `name` (`./<name>.db`).
    pub fn connect(name: &str) -> Result<Self> {
        Self::open_with_config(HutConfig::for_name(name))
    }

    /// Open or create a store at an explicit path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(HutConfig::new(path.as_ref().to_path_buf()))
    }

    pub fn open_with_config(cfg: HutConfig) -> Result<Self> {
        Ok(Self {
            store: SqliteStore::open(cfg)?,
        })
    }

    /// Get reference to the underlying store
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Query handle over the stored records
    pub fn dataset(&self) -> Dataset<'_> {
        self.store.dataset()
    }

    /// Snapshot of the evolved schema
    pub fn schema(&self) -> TableSchema {
        self.store.schema()
    }

    /// Store every novel record `map` builds from `source`.
    ///
    /// `map` receives an empty candidate and one source element. Null fields
    /// are dropped, a candidate left empty is skipped, and a candidate equal
    /// to an existing row is not stored again.
    ///
    /// ```no_run
    /// use datahut::prelude::*;
    ///
    /// # fn main() -> Result<()> {
    /// let hut = DataHut::connect("people")?;
    /// let people = [("barney", 27), ("barney", 27), ("phil", 31)];
    /// let stats = hut.extract(people, |r, (name, age)| {
    ///     r.set("name", name).set("age", age);
    ///     Ok(())
    /// })?;
    /// assert_eq!(stats.inserted, 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn extract<I, F>(&self, source: I, map: F) -> Result<ExtractStats>
    where
        I: IntoIterator,
        F: FnMut(&mut Record, I::Item) -> Result<()>,
    {
        extract::extract(&self.store, source, map)
    }

    /// Derive fields on stored records.
    ///
    /// Visits unprocessed rows only unless `include_processed` is set.
    pub fn transform<F>(&self, include_processed: bool, f: F) -> Result<TransformStats>
    where
        F: FnMut(&mut Record) -> Result<()>,
    {
        transform::transform(&self.store, include_processed, f)
    }

    /// Mark every record processed so the next default transform pass
    /// skips them. Returns the number of rows marked.
    pub fn transform_complete(&self) -> Result<usize> {
        self.store.mark_all_processed()
    }

    /// True if a stored record already carries every given field value.
    ///
    /// Meant for skipping expensive work inside an extract callback.
    pub fn not_unique(&self, partial: &Record) -> Result<bool> {
        self.store.exists_match(partial)
    }

    pub fn store_meta<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.store.store_meta(key, value)
    }

    pub fn fetch_meta<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.store.fetch_meta(key)
    }

    pub fn meta_keys(&self) -> Result<Vec<String>> {
        self.store.meta_keys()
    }

    /// Forward every SQL statement to `sink`.
    pub fn set_logger<L: LogSink + 'static>(&self, sink: L) -> Result<()> {
        self.store.set_logger(sink)
    }

    pub fn clear_logger(&self) -> Result<()> {
        self.store.clear_logger()
    }

    /// Close the store, releasing the connection
    pub fn close(self) -> Result<()> {
        tracing::info!("Closing {}", self.store.path().display());
        self.store.close()
    }
}
