use crate::{
    ColumnSchema, ConnectionPool, DataError, Dialect, Driver, FieldDescriptor, FieldFlags,
    RawConnection, Result, Row, RowLayout, SqlCommand, SqlConnection, Value, codec, truncate_long,
};
use anyhow::Context;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use time::Duration;

/// Tunables of a storage instance.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Additional attempts after a transient connection failure.
    pub max_error_retries: u32,
    /// Idle age after which pooled connections are evicted.
    pub connection_close_timeout: Duration,
    /// Assert layout compatibility against the live schema on every query
    /// that supplies an expected layout.
    pub schema_check: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        StorageOptions {
            max_error_retries: 3,
            connection_close_timeout: Duration::minutes(5),
            schema_check: true,
        }
    }
}

/// Connection-pool-aware SQL execution engine with bounded automatic retry
/// and on-demand schema discovery.
///
/// Retry eligibility is decided in exactly one place, here, from two facts
/// only: whether the failed connection is still observably open (open means
/// the failure was not a connection problem, so retrying cannot help) and
/// whether budget remains. Malformed result shapes and codec violations
/// happen on open connections and are therefore never retried. There is no
/// backoff between attempts — a retry immediately acquires a fresh
/// connection — and no way to cancel a call once issued.
pub struct SqlStorage<D: Driver> {
    driver: Arc<D>,
    pool: ConnectionPool<D>,
    options: StorageOptions,
    closed: AtomicBool,
}

impl<D: Driver> SqlStorage<D> {
    pub fn new(driver: D) -> Self {
        Self::with_options(driver, StorageOptions::default())
    }

    pub fn with_options(driver: D, options: StorageOptions) -> Self {
        let driver = Arc::new(driver);
        SqlStorage {
            pool: ConnectionPool::new(driver.clone(), options.connection_close_timeout),
            driver,
            options,
            closed: AtomicBool::new(false),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn dialect(&self) -> &D::Dialect {
        self.driver.dialect()
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    pub fn pool(&self) -> &ConnectionPool<D> {
        &self.pool
    }

    /// Dispose every pooled connection and refuse further operations.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.pool.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(DataError::Disposed("SqlStorage").into());
        }
        Ok(())
    }

    fn error_context(&self, database: &str, table: &str, command: &SqlCommand) -> String {
        format!(
            "while executing on `{database}`.`{table}`: {}",
            truncate_long(&command.text)
        )
    }

    /// Run `operation` on a pooled connection, retrying transient failures.
    /// The connection is returned to the pool on every path, force-closed
    /// when the operation failed on it.
    fn with_connection<T>(
        &self,
        database: &str,
        table: &str,
        command: &SqlCommand,
        mut operation: impl FnMut(&Arc<SqlConnection<D::Connection>>) -> Result<T>,
    ) -> Result<T> {
        self.ensure_open()?;
        let retries = self.options.max_error_retries;
        let mut attempt: u32 = 1;
        loop {
            let connection = match self.pool.get_connection(database) {
                Ok(connection) => connection,
                Err(e) => {
                    if attempt > retries {
                        return Err(e)
                            .with_context(|| self.error_context(database, table, command));
                    }
                    log::warn!("retry {attempt}/{retries}, connecting to `{database}` failed: {e:#}");
                    attempt += 1;
                    continue;
                }
            };
            match operation(&connection) {
                Ok(value) => {
                    self.pool.return_connection(connection, false);
                    return Ok(value);
                }
                Err(e) => {
                    let was_open = connection.is_open();
                    self.pool.return_connection(connection, true);
                    if was_open || attempt > retries {
                        return Err(e)
                            .with_context(|| self.error_context(database, table, command));
                    }
                    log::warn!(
                        "retry {attempt}/{retries} after transient failure on `{database}`.`{table}`: {e:#}"
                    );
                    attempt += 1;
                }
            }
        }
    }

    /// Run a command, returning the affected row count.
    pub fn execute(&self, command: &SqlCommand, database: &str, table: &str) -> Result<u64> {
        self.with_connection(database, table, command, |connection| {
            connection.raw().execute(command)
        })
    }

    /// Derive an untyped layout from reflected result set columns: flags
    /// are OR'd in from the key/auto-increment/unique metadata bits, the
    /// logical datatype comes from the driver-reported type, and every
    /// descriptor passes through the dialect rewrite hook.
    pub fn read_schema(&self, table: &str, columns: &[ColumnSchema]) -> RowLayout {
        let dialect = self.driver.dialect();
        let fields = columns
            .iter()
            .map(|column| {
                let mut flags = FieldFlags::NONE;
                if column.is_key {
                    flags |= FieldFlags::ID;
                }
                if column.is_auto_increment {
                    flags |= FieldFlags::AUTO_INCREMENT;
                }
                if column.is_unique {
                    flags |= FieldFlags::UNIQUE;
                }
                let field = FieldDescriptor::new(column.name.clone(), column.data_type)
                    .with_flags(flags)
                    .with_maximum_length(column.maximum_length);
                dialect.database_field_properties(&field)
            })
            .collect();
        RowLayout::untyped(table.to_owned(), fields)
    }

    /// Run a query and materialize every row eagerly, decoding values
    /// through the codec. With an expected `layout` and `schema_check`
    /// enabled, structural compatibility is asserted before column order is
    /// trusted; without one the layout is derived from the result set.
    pub fn query(
        &self,
        command: &SqlCommand,
        layout: Option<&RowLayout>,
        database: &str,
        table: &str,
    ) -> Result<Vec<Row>> {
        self.with_connection(database, table, command, |connection| {
            let mut reader = connection.raw().query(command)?;
            let derived = self.read_schema(table, reader.columns());
            let layout = match layout {
                Some(expected) => {
                    if self.options.schema_check {
                        expected.check_layout(&derived)?;
                    }
                    expected
                }
                None => &derived,
            };
            let dialect = self.driver.dialect();
            let mut rows = Vec::new();
            while let Some(raw) = reader.next_row()? {
                if raw.len() != layout.len() {
                    return Err(DataError::invalid_data(format!(
                        "row with {} values does not fit layout `{layout}`",
                        raw.len()
                    )));
                }
                let values = layout
                    .fields()
                    .iter()
                    .zip(raw)
                    .map(|(field, value)| codec::get_local_value(dialect, field, &value))
                    .collect::<Result<Vec<_>>>()?;
                rows.push(Row::new(values));
            }
            Ok(rows)
        })
    }

    /// Run a query expected to produce at most one row and — unless
    /// `field_name` disambiguates — exactly one column. Returns `Ok(None)`
    /// on an empty result; more than one row or an ambiguous column count
    /// is an [`DataError::InvalidData`], never retried.
    pub fn query_value(
        &self,
        command: &SqlCommand,
        field_name: Option<&str>,
        database: &str,
        table: &str,
    ) -> Result<Option<Value>> {
        self.with_connection(database, table, command, |connection| {
            let mut reader = connection.raw().query(command)?;
            let derived = self.read_schema(table, reader.columns());
            let index = match field_name {
                Some(name) => derived.field_index(name).ok_or_else(|| {
                    DataError::invalid_data(format!("result set has no column `{name}`"))
                })?,
                None => {
                    if derived.len() != 1 {
                        return Err(DataError::invalid_data(format!(
                            "expected a single column result, got {} columns",
                            derived.len()
                        )));
                    }
                    0
                }
            };
            let Some(first) = reader.next_row()? else {
                return Ok(None);
            };
            if reader.next_row()?.is_some() {
                return Err(DataError::invalid_data(
                    "expected a single row result, got more than one",
                ));
            }
            let field = &derived.fields()[index];
            let value = first.into_iter().nth(index).ok_or_else(|| {
                DataError::invalid_data("row is shorter than its reflected schema")
            })?;
            Ok(Some(codec::get_local_value(
                self.driver.dialect(),
                field,
                &value,
            )?))
        })
    }

    /// Harvest a table's column metadata without reading data rows, via the
    /// dialect's no-data query.
    pub fn query_schema(&self, database: &str, table: &str) -> Result<RowLayout> {
        let command = SqlCommand::new(self.driver.dialect().no_data_query(database, table));
        self.with_connection(database, table, &command, |connection| {
            let reader = connection.raw().query(&command)?;
            Ok(self.read_schema(table, reader.columns()))
        })
    }
}

impl<D: Driver> Drop for SqlStorage<D> {
    fn drop(&mut self) {
        self.pool.clear();
    }
}
