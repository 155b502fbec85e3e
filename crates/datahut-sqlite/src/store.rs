use crate::query::Dataset;
use crate::sql::{index_name, quote_ident, unique_index_name, SqlLog};
use datahut_core::{
    error::{HutError, Result},
    traits::LogSink,
    types::{is_reserved, TableSchema, ValueType, ID_COLUMN, META_TABLE, PROCESSED_COLUMN, RECORD_TABLE},
    HutConfig, TypeRegistry,
};
use rusqlite::{CachedStatement, Connection, OpenFlags, Params};
use std::cell::{Ref, RefCell};
use std::path::Path;

/// SQLite-backed record store
///
/// Owns the connection to one store file holding the evolving main table
/// and the metadata side table. The schema snapshot is loaded once at open
/// and extended only after a column-add commits.
pub struct SqliteStore {
    conn: Connection,
    config: HutConfig,
    registry: TypeRegistry,
    pub(crate) schema: RefCell<TableSchema>,
    pub(crate) log: SqlLog,
}

impl SqliteStore {
    /// Open the store described by `cfg`, creating the file and tables on
    /// first use.
    pub fn open(cfg: HutConfig) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = cfg.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &cfg.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;

        Self::configure_connection(&conn, &cfg)?;
        Self::init_schema(&conn)?;
        let schema = Self::load_schema(&conn)?;

        tracing::info!(
            "Opened store {} ({} data columns)",
            cfg.path.display(),
            schema.len()
        );

        Ok(Self {
            conn,
            registry: cfg.registry(),
            config: cfg,
            schema: RefCell::new(schema),
            log: SqlLog::default(),
        })
    }

    /// Release the connection.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| HutError::Database(e))
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &HutConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Query handle over the main table
    pub fn dataset(&self) -> Dataset<'_> {
        Dataset::new(self)
    }

    /// Forward every SQL statement this store executes to `sink`.
    pub fn set_logger<L: LogSink + 'static>(&self, sink: L) -> Result<()> {
        self.log.set(Some(Box::new(sink)))
    }

    pub fn clear_logger(&self) -> Result<()> {
        self.log.set(None)
    }

    /// Get the underlying connection (for custom queries)
    ///
    /// Writing to the main table through this connection bypasses the
    /// schema snapshot; reopen the store after external DDL.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn schema_ref(&self) -> Ref<'_, TableSchema> {
        self.schema.borrow()
    }

    pub(crate) fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        self.log.statement(sql);
        Ok(self.conn.execute(sql, params)?)
    }

    pub(crate) fn prepare(&self, sql: &str) -> Result<CachedStatement<'_>> {
        self.log.statement(sql);
        Ok(self.conn.prepare_cached(sql)?)
    }

    pub(crate) fn begin_schema_txn(&self) -> Result<crate::txn::SchemaTxn<'_>> {
        crate::txn::SchemaTxn::begin(&self.conn, &self.log)
    }

    /// Configure SQLite connection
    fn configure_connection(conn: &Connection, cfg: &HutConfig) -> Result<()> {
        // Enable WAL mode
        if cfg.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(|e| HutError::Config(e.to_string()))?;
        }

        conn.pragma_update(None, "synchronous", cfg.synchronous.pragma_value())
            .map_err(|e| HutError::Config(e.to_string()))?;

        // Set cache size
        conn.pragma_update(None, "cache_size", cfg.cache_size)
            .map_err(|e| HutError::Config(e.to_string()))?;

        Ok(())
    }

    /// Create the main table and the metadata side table if needed
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {records} (
                {id} INTEGER PRIMARY KEY AUTOINCREMENT,
                {processed} BOOLEAN NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS {processed_idx}
                ON {records}({processed});

            CREATE TABLE IF NOT EXISTS {meta} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL,
                value BLOB
            );

            CREATE UNIQUE INDEX IF NOT EXISTS {key_idx}
                ON {meta}(key);",
            records = RECORD_TABLE,
            id = ID_COLUMN,
            processed = PROCESSED_COLUMN,
            processed_idx = quote_ident(&index_name(RECORD_TABLE, PROCESSED_COLUMN)),
            meta = META_TABLE,
            key_idx = quote_ident(&unique_index_name(META_TABLE, "key")),
        ))?;
        Ok(())
    }

    /// Read the data columns of the main table from its definition
    fn load_schema(conn: &Connection) -> Result<TableSchema> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", RECORD_TABLE))?;
        let columns = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut schema = TableSchema::new();
        for (name, declared) in columns {
            if is_reserved(&name) {
                continue;
            }
            let column_type: ValueType = ValueType::from_sql_type(&declared).ok_or_else(|| {
                HutError::Config(format!(
                    "column '{}' has unrecognized declared type '{}'",
                    name, declared
                ))
            })?;
            schema.add_column(name, column_type);
        }
        Ok(schema)
    }
}
