//! SQL text helpers and statement logging

use datahut_core::error::{HutError, Result};
use datahut_core::traits::LogSink;
use std::cell::RefCell;

/// Quote an identifier for SQLite.
///
/// Field names are arbitrary strings, so every column and index name is
/// emitted double-quoted with embedded quotes doubled.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Name of the secondary index backing a data column
pub fn index_name(table: &str, column: &str) -> String {
    format!("idx_{}_{}", table, column)
}

/// Name of a unique index. The `uniq_` prefix keeps it out of the
/// namespace [`index_name`] draws data column indexes from.
pub fn unique_index_name(table: &str, column: &str) -> String {
    format!("uniq_{}_{}", table, column)
}

/// Routes every executed statement to `tracing` and an optional sink.
#[derive(Default)]
pub(crate) struct SqlLog {
    sink: RefCell<Option<Box<dyn LogSink>>>,
}

impl SqlLog {
    pub(crate) fn statement(&self, sql: &str) {
        tracing::debug!(target: "datahut::sql", "{}", sql);
        if let Ok(sink) = self.sink.try_borrow() {
            if let Some(sink) = sink.as_ref() {
                sink.log_line(sql);
            }
        }
    }

    pub(crate) fn set(&self, sink: Option<Box<dyn LogSink>>) -> Result<()> {
        let mut slot = self
            .sink
            .try_borrow_mut()
            .map_err(|_| HutError::Usage("the logger cannot be replaced while it is logging".into()))?;
        *slot = sink;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn has_sink(&self) -> bool {
        self.sink.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("age"), "\"age\"");
        assert_eq!(quote_ident("wind speed"), "\"wind speed\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_index_namespaces_do_not_overlap() {
        // A data column named `meta_key` on the main table
        let column_index = index_name("data_warehouse", "meta_key");
        let meta_index = unique_index_name("data_warehouse_meta", "key");
        assert_ne!(column_index, meta_index);
        assert!(!meta_index.starts_with("idx_data_warehouse_"));
    }

    #[test]
    fn test_sink_receives_statements() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let captured = lines.clone();

        let log = SqlLog::default();
        log.set(Some(Box::new(move |line: &str| {
            captured.borrow_mut().push(line.to_string())
        })))
        .unwrap();
        assert!(log.has_sink());

        log.statement("SELECT 1");
        log.set(None).unwrap();
        log.statement("SELECT 2");

        assert_eq!(*lines.borrow(), vec!["SELECT 1".to_string()]);
    }
}
