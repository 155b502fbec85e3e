use crate::error::Result;
use crate::types::{Record, RecordId, StoredRecord, TableSchema};

/// Record store: the evolving main table
///
/// Provides:
/// - Schema evolution driven by record contents
/// - Deduplicating inserts
/// - Partial updates by identity
/// - Processed-flag bookkeeping
///
/// Every operation takes `&self`. A store is owned by one thread and is
/// not expected to be shared across threads.
pub trait RecordStore {
    /// Snapshot of the current data columns
    fn schema(&self) -> TableSchema;

    /// Ensure every non-null field has a column of a compatible type.
    ///
    /// Returns the number of columns added. All fields are validated before
    /// any column is created.
    fn adapt_schema(&self, fields: &Record) -> Result<usize>;

    /// Insert `fields` unless a row already holds every non-null field of it.
    ///
    /// Returns false for a duplicate.
    fn insert_if_absent(&self, fields: &Record) -> Result<bool>;

    /// True if at least one row matches every given field.
    ///
    /// Fields that have no column yet make the lookup return false.
    fn exists_match(&self, partial: &Record) -> Result<bool>;

    /// Identities of stored rows in insertion order
    fn record_ids(&self, include_processed: bool) -> Result<Vec<RecordId>>;

    fn fetch_record(&self, id: RecordId) -> Result<Option<StoredRecord>>;

    /// Apply a partial update to one row; absent fields are left untouched.
    fn update_record(&self, id: RecordId, fields: &Record) -> Result<()>;

    /// Set the processed flag on every row. Returns the row count.
    fn mark_all_processed(&self) -> Result<usize>;

    /// Lazy sequence over stored rows, one row materialized per step.
    ///
    /// The set of rows is fixed when the sequence is created; rows inserted
    /// while iterating are not visited.
    fn records(&self, include_processed: bool) -> Result<Records<'_, Self>>
    where
        Self: Sized,
    {
        let ids = self.record_ids(include_processed)?;
        Ok(Records {
            store: self,
            ids: ids.into_iter(),
        })
    }

    /// Call `f` for every selected row. Returns the number of rows visited.
    fn for_each_record<F>(&self, include_processed: bool, mut f: F) -> Result<usize>
    where
        Self: Sized,
        F: FnMut(StoredRecord) -> Result<()>,
    {
        let mut visited = 0;
        for record in self.records(include_processed)? {
            f(record?)?;
            visited += 1;
        }
        Ok(visited)
    }
}

/// Iterator returned by [`RecordStore::records`]
pub struct Records<'a, S: RecordStore> {
    store: &'a S,
    ids: std::vec::IntoIter<RecordId>,
}

impl<S: RecordStore> Iterator for Records<'_, S> {
    type Item = Result<StoredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        for id in self.ids.by_ref() {
            match self.store.fetch_record(id) {
                Ok(Some(record)) => return Some(Ok(record)),
                // Row vanished since the ids were read
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.ids.len()))
    }
}
