use crate::sql::SqlLog;
use datahut_core::error::Result;
use rusqlite::Connection;

/// Transaction wrapping one schema change.
///
/// Adding a column and its index commit together or not at all. Dropping the
/// guard without calling [`SchemaTxn::commit`] rolls back.
pub(crate) struct SchemaTxn<'a> {
    conn: &'a Connection,
    log: &'a SqlLog,
    in_txn: bool,
}

impl<'a> SchemaTxn<'a> {
    pub(crate) fn begin(conn: &'a Connection, log: &'a SqlLog) -> Result<Self> {
        log.statement("BEGIN IMMEDIATE TRANSACTION");
        conn.execute("BEGIN IMMEDIATE TRANSACTION", [])?;

        Ok(Self {
            conn,
            log,
            in_txn: true,
        })
    }

    pub(crate) fn execute(&self, sql: &str) -> Result<()> {
        self.log.statement(sql);
        self.conn.execute(sql, [])?;
        Ok(())
    }

    pub(crate) fn commit(mut self) -> Result<()> {
        if self.in_txn {
            self.log.statement("COMMIT");
            self.conn.execute("COMMIT", [])?;
            self.in_txn = false;
        }
        Ok(())
    }
}

impl Drop for SchemaTxn<'_> {
    fn drop(&mut self) {
        if self.in_txn {
            self.log.statement("ROLLBACK");
            let _ = self.conn.execute("ROLLBACK", []);
        }
    }
}
