//! Extract pipeline: source elements to novel stored records

use datahut_core::{error::Result, observe, Record, RecordStore};
use std::time::{Duration, Instant};

/// Outcome of one extract pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Source elements handed to the callback
    pub seen: usize,
    pub inserted: usize,
    /// Candidates whose fields an existing row already holds
    pub duplicates: usize,
    /// Candidates with no non-null field, skipped
    pub empty: usize,
    pub columns_added: usize,
    pub duration: Duration,
}

/// Map every element of `source` into a candidate record and store the
/// candidates no existing row matches.
///
/// Elements are processed in iteration order, and each one sees the schema
/// and rows left by the previous ones. An error from `map` or from the store
/// stops the pass; rows stored before it stay stored.
pub fn extract<S, I, F>(store: &S, source: I, mut map: F) -> Result<ExtractStats>
where
    S: RecordStore,
    I: IntoIterator,
    F: FnMut(&mut Record, I::Item) -> Result<()>,
{
    let start = Instant::now();
    let mut stats = ExtractStats::default();

    for element in source {
        stats.seen += 1;
        if let Err(e) = extract_one(store, element, &mut map, &mut stats) {
            tracing::warn!("Extract aborted at element {}: {}", stats.seen, e);
            return Err(e);
        }
    }

    stats.duration = start.elapsed();
    tracing::info!(
        "Extract: {} seen, {} inserted, {} duplicates, {} empty, {} columns added in {:?}",
        stats.seen,
        stats.inserted,
        stats.duplicates,
        stats.empty,
        stats.columns_added,
        stats.duration
    );
    observe::record_pass("extract", stats.duration, stats.seen);
    Ok(stats)
}

fn extract_one<S, T, F>(store: &S, element: T, map: &mut F, stats: &mut ExtractStats) -> Result<()>
where
    S: RecordStore,
    F: FnMut(&mut Record, T) -> Result<()>,
{
    let mut candidate = Record::new();
    map(&mut candidate, element)?;

    candidate.drop_nulls();
    if candidate.is_empty() {
        stats.empty += 1;
        return Ok(());
    }

    stats.columns_added += store.adapt_schema(&candidate)?;
    if store.insert_if_absent(&candidate)? {
        stats.inserted += 1;
    } else {
        stats.duplicates += 1;
    }
    Ok(())
}
