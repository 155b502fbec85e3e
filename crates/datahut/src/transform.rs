//! Transform pipeline: derive fields on stored records

use datahut_core::{error::Result, observe, Record, RecordStore, Value};
use std::time::{Duration, Instant};

/// Outcome of one transform pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Rows handed to the callback
    pub visited: usize,
    /// Rows whose fields changed and were written back
    pub updated: usize,
    pub columns_added: usize,
    pub duration: Duration,
}

/// Run `f` over a mutable projection of every selected row and persist what
/// it changed.
///
/// With `include_processed` false, rows already marked processed are
/// skipped. The set of rows is fixed when the pass starts.
pub fn transform<S, F>(store: &S, include_processed: bool, mut f: F) -> Result<TransformStats>
where
    S: RecordStore,
    F: FnMut(&mut Record) -> Result<()>,
{
    let start = Instant::now();
    let mut stats = TransformStats::default();

    for row in store.records(include_processed)? {
        let row = row?;
        stats.visited += 1;

        let mut projection = row.fields.clone();
        let step = f(&mut projection).and_then(|()| {
            let changes = delta(&row.fields, &projection);
            if changes.is_empty() {
                return Ok(false);
            }
            stats.columns_added += store.adapt_schema(&projection)?;
            store.update_record(row.id, &changes)?;
            Ok(true)
        });

        match step {
            Ok(true) => stats.updated += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Transform aborted at record {}: {}", row.id, e);
                return Err(e);
            }
        }
    }

    stats.duration = start.elapsed();
    tracing::info!(
        "Transform: {} visited, {} updated, {} columns added in {:?}",
        stats.visited,
        stats.updated,
        stats.columns_added,
        stats.duration
    );
    observe::record_pass("transform", stats.duration, stats.visited);
    Ok(stats)
}

/// Fields to write back: changed or added values, and NULL for fields the
/// projection no longer carries.
pub fn delta(original: &Record, projection: &Record) -> Record {
    let mut changes = Record::new();
    for (name, value) in projection.iter() {
        match original.get(name) {
            Some(before) if before == value => {}
            // Setting a field that never existed to null changes nothing
            None if value.is_null() => {}
            _ => {
                changes.set(name, value.clone());
            }
        }
    }
    for name in original.names() {
        if !projection.contains(name) {
            changes.set(name, Value::Null);
        }
    }
    changes
}
