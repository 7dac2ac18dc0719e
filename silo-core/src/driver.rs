use crate::{Dialect, RawConnection, Result};

/// One backend: a dialect policy plus a way to open physical connections.
/// The connection pool calls [`Driver::create_connection`] when no pooled
/// connection matches; creation failures propagate to the execution
/// engine, which owns the retry decision.
pub trait Driver: Send + Sync + 'static {
    type Connection: RawConnection;
    type Dialect: Dialect;

    fn dialect(&self) -> &Self::Dialect;

    /// Open a new physical connection bound to `database`.
    fn create_connection(&self, database: &str) -> Result<Self::Connection>;
}
