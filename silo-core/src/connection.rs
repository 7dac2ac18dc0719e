use crate::{DataType, Result, SqlCommand, Value};

/// Column metadata reflected from a result set.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    pub maximum_length: f32,
    pub is_key: bool,
    pub is_auto_increment: bool,
    pub is_unique: bool,
}

/// Forward-only result set with column schema reflection. Values come back
/// in the driver's wire representation; the execution engine runs them
/// through the value codec before they reach callers.
pub trait ResultReader {
    fn columns(&self) -> &[ColumnSchema];

    /// Next row of raw values, `None` when the set is exhausted. Values are
    /// aligned by index with [`ResultReader::columns`].
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// One physical database connection, the capability surface the core needs
/// from an underlying driver.
///
/// Methods take `&self`: implementations keep their I/O state behind
/// interior mutability. The pool guarantees a checked-out connection is
/// used by a single caller at a time, but `close` must be callable from
/// `ConnectionPool::clear` while a caller still holds the handle.
pub trait RawConnection: Send + Sync {
    /// Whether the connection is observably usable. Drivers report `false`
    /// once the underlying transport died; the execution engine bases its
    /// retry decision on this.
    fn is_open(&self) -> bool;

    /// Close the connection, releasing the underlying transport. Idempotent.
    fn close(&self);

    /// Rebind the connection to another database. Only called when the
    /// dialect reports `can_change_database`.
    fn change_database(&self, database: &str) -> Result<()>;

    /// Run a command, returning the affected row count.
    fn execute(&self, command: &SqlCommand) -> Result<u64>;

    /// Run a command, returning a reader over its result set.
    fn query(&self, command: &SqlCommand) -> Result<Box<dyn ResultReader + '_>>;
}
