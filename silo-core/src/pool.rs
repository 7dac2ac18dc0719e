use crate::{Dialect, Driver, RawConnection, Result};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};
use time::{Duration, OffsetDateTime};

/// A pooled physical connection: the raw driver connection plus the
/// database it is currently bound to and the time it was last used. The
/// tag and timestamp sit behind a mutex so the pool can retag and refresh
/// through the shared handle.
pub struct SqlConnection<C: RawConnection> {
    raw: C,
    state: Mutex<ConnectionState>,
}

struct ConnectionState {
    database: String,
    last_used: OffsetDateTime,
}

impl<C: RawConnection> SqlConnection<C> {
    fn new(raw: C, database: &str) -> Self {
        SqlConnection {
            raw,
            state: Mutex::new(ConnectionState {
                database: database.to_owned(),
                last_used: OffsetDateTime::now_utc(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().expect("connection state lock poisoned")
    }

    /// Database this connection is currently bound to.
    pub fn database(&self) -> String {
        self.state().database.clone()
    }

    /// UTC timestamp of the last checkout or return.
    pub fn last_used(&self) -> OffsetDateTime {
        self.state().last_used
    }

    fn touch(&self) {
        self.state().last_used = OffsetDateTime::now_utc();
    }

    fn retag(&self, database: &str) {
        self.state().database = database.to_owned();
    }

    pub fn raw(&self) -> &C {
        &self.raw
    }

    pub fn is_open(&self) -> bool {
        self.raw.is_open()
    }

    pub fn close(&self) {
        self.raw.close();
    }
}

/// Thread-safe cache of open physical connections keyed by database name.
///
/// A connection is in exactly one of the idle queue or the in-use list at
/// any time, or disposed and in neither. Every operation holds the single
/// pool lock for its whole scan-and-mutate sequence, so two callers can
/// never select the same idle connection. Stale connections are swept
/// opportunistically on every acquire; there is no timer.
pub struct ConnectionPool<D: Driver> {
    driver: Arc<D>,
    close_timeout: Duration,
    state: Mutex<PoolState<D::Connection>>,
}

struct PoolState<C: RawConnection> {
    idle: VecDeque<Arc<SqlConnection<C>>>,
    in_use: Vec<Arc<SqlConnection<C>>>,
}

impl<D: Driver> ConnectionPool<D> {
    pub fn new(driver: Arc<D>, close_timeout: Duration) -> Self {
        ConnectionPool {
            driver,
            close_timeout,
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                in_use: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PoolState<D::Connection>> {
        self.state.lock().expect("connection pool lock poisoned")
    }

    /// Hand out a usable connection bound to `database`.
    ///
    /// Scans the idle queue front to back, disposing closed or timed out
    /// connections on the way. When the dialect cannot change an open
    /// connection's database only an exact match is eligible; otherwise any
    /// open connection is, the scan stopping early on an exact match and
    /// falling back to the last eligible node otherwise. Without a match a
    /// new physical connection is created; creation failures propagate —
    /// the execution engine decides whether to retry.
    pub fn get_connection(&self, database: &str) -> Result<Arc<SqlConnection<D::Connection>>> {
        let can_change = self.driver.dialect().capabilities().can_change_database;
        let now = OffsetDateTime::now_utc();
        let mut state = self.state();
        let mut selected = None;
        let mut i = 0;
        while i < state.idle.len() {
            let candidate = &state.idle[i];
            if !candidate.is_open() || now - candidate.last_used() > self.close_timeout {
                log::trace!("evicting stale connection to `{}`", candidate.database());
                candidate.close();
                state.idle.remove(i);
                continue;
            }
            if candidate.database() == database {
                selected = Some(i);
                break;
            }
            if can_change {
                selected = Some(i);
            }
            i += 1;
        }
        if let Some(i) = selected {
            let Some(connection) = state.idle.remove(i) else {
                unreachable!("selected index is inside the idle queue");
            };
            if connection.database() != database {
                if let Err(e) = connection.raw().change_database(database) {
                    connection.close();
                    return Err(e);
                }
                connection.retag(database);
            }
            connection.touch();
            state.in_use.push(connection.clone());
            log::trace!("reusing pooled connection for `{database}`");
            return Ok(connection);
        }
        let raw = self.driver.create_connection(database)?;
        let connection = Arc::new(SqlConnection::new(raw, database));
        state.in_use.push(connection.clone());
        log::trace!("created new connection for `{database}`");
        Ok(connection)
    }

    /// Give a connection back to the pool. Open connections return to the
    /// front of the idle queue (the most recently used one is the most
    /// likely to still be warm) unless `force_close` is set; everything
    /// else is disposed. Moving the handle in transfers ownership back.
    pub fn return_connection(
        &self,
        connection: Arc<SqlConnection<D::Connection>>,
        force_close: bool,
    ) {
        let mut state = self.state();
        if let Some(position) = state
            .in_use
            .iter()
            .position(|c| Arc::ptr_eq(c, &connection))
        {
            state.in_use.swap_remove(position);
            if !force_close && connection.is_open() {
                connection.touch();
                state.idle.push_front(connection);
                return;
            }
        } else {
            log::warn!(
                "returned connection to `{}` was not checked out from this pool",
                connection.database()
            );
        }
        connection.close();
    }

    /// Dispose every connection in both collections unconditionally and
    /// empty them. Used at shutdown; previously handed out connections
    /// observe the closed state through their shared handles.
    pub fn clear(&self) {
        let mut state = self.state();
        let PoolState { idle, in_use } = &mut *state;
        for connection in idle.drain(..).chain(in_use.drain(..)) {
            connection.close();
        }
    }

    pub fn idle_count(&self) -> usize {
        self.state().idle.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.state().in_use.len()
    }
}
