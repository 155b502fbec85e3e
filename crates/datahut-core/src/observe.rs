//! Optional metrics instrumentation for datahut.
//!
//! When the `observe` feature is enabled, store operations and pipeline
//! passes emit counters and histograms via the [`metrics`] crate. A
//! downstream application must install a metrics recorder to collect them.
//!
//! Without the feature every function in this module is a no-op.

/// Record the outcome of a deduplicating insert.
///
/// - `datahut.records.inserted_total` – counter
/// - `datahut.records.duplicates_total` – counter
#[inline]
pub fn record_insert(inserted: bool) {
    #[cfg(feature = "observe")]
    {
        if inserted {
            metrics::counter!("datahut.records.inserted_total").increment(1);
        } else {
            metrics::counter!("datahut.records.duplicates_total").increment(1);
        }
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = inserted;
    }
}

/// Record columns created by schema evolution.
///
/// - `datahut.schema.columns_added_total` – counter
#[inline]
pub fn record_columns_added(count: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("datahut.schema.columns_added_total").increment(count as u64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = count;
    }
}

/// Record a finished extract or transform pass.
///
/// - `datahut.pass.duration_seconds` – histogram with `pass` label
/// - `datahut.pass.records_total` – counter with `pass` label
#[inline]
pub fn record_pass(pass: &'static str, duration: std::time::Duration, records: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::histogram!("datahut.pass.duration_seconds", "pass" => pass)
            .record(duration.as_secs_f64());
        metrics::counter!("datahut.pass.records_total", "pass" => pass).increment(records as u64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (pass, duration, records);
    }
}
