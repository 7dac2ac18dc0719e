#![allow(dead_code)]

use silo_core::{
    ColumnSchema, DataType, Dialect, DialectCapabilities, Driver, RawConnection, Result,
    ResultReader, SqlCommand, Value,
};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
    },
};

#[derive(Debug, Clone, Copy)]
pub struct StubDialect {
    pub can_change_database: bool,
    pub named_parameters: bool,
    pub select_star_group_by: bool,
    pub has_ieee_infinity: bool,
}

impl Default for StubDialect {
    fn default() -> Self {
        StubDialect {
            can_change_database: true,
            named_parameters: true,
            select_star_group_by: true,
            has_ieee_infinity: true,
        }
    }
}

impl Dialect for StubDialect {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities {
            named_parameters: self.named_parameters,
            parameter_prefix: if self.named_parameters { '@' } else { '?' },
            select_star_group_by: self.select_star_group_by,
            can_change_database: self.can_change_database,
            has_ieee_infinity: self.has_ieee_infinity,
        }
    }
}

/// Scripted behavior shared by a driver and its connections.
#[derive(Default)]
pub struct StubBehavior {
    /// Fail the next N connection creations.
    pub fail_creates: AtomicU32,
    /// Connection creations attempted so far.
    pub created: AtomicUsize,
    /// The next N executes/queries fail and mark their connection dead.
    pub die_on_command: AtomicU32,
    /// The next N executes/queries fail but leave the connection open.
    pub fail_open_on_command: AtomicU32,
    /// Commands attempted so far.
    pub commands: AtomicUsize,
    /// `change_database` calls so far.
    pub database_changes: AtomicUsize,
    /// Result set served by every query.
    pub columns: Mutex<Vec<ColumnSchema>>,
    pub rows: Mutex<Vec<Vec<Value>>>,
}

fn take(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
        .is_ok()
}

pub struct StubDriver {
    pub behavior: Arc<StubBehavior>,
    dialect: StubDialect,
}

impl StubDriver {
    pub fn new() -> StubDriver {
        Self::with_dialect(StubDialect::default())
    }

    pub fn with_dialect(dialect: StubDialect) -> StubDriver {
        StubDriver {
            behavior: Arc::new(StubBehavior::default()),
            dialect,
        }
    }
}

impl Driver for StubDriver {
    type Connection = StubConnection;
    type Dialect = StubDialect;

    fn dialect(&self) -> &StubDialect {
        &self.dialect
    }

    fn create_connection(&self, database: &str) -> Result<StubConnection> {
        self.behavior.created.fetch_add(1, Ordering::SeqCst);
        if take(&self.behavior.fail_creates) {
            return Err(anyhow::Error::msg(format!(
                "stub refuses to connect to `{database}`"
            )));
        }
        Ok(StubConnection {
            behavior: self.behavior.clone(),
            open: AtomicBool::new(true),
        })
    }
}

pub struct StubConnection {
    behavior: Arc<StubBehavior>,
    open: AtomicBool,
}

impl StubConnection {
    fn command(&self) -> Result<()> {
        self.behavior.commands.fetch_add(1, Ordering::SeqCst);
        if take(&self.behavior.die_on_command) {
            self.open.store(false, Ordering::SeqCst);
            return Err(anyhow::Error::msg("stub connection dropped"));
        }
        if take(&self.behavior.fail_open_on_command) {
            return Err(anyhow::Error::msg("stub command failed"));
        }
        Ok(())
    }
}

impl RawConnection for StubConnection {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn change_database(&self, _database: &str) -> Result<()> {
        self.behavior.database_changes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn execute(&self, _command: &SqlCommand) -> Result<u64> {
        self.command()?;
        Ok(1)
    }

    fn query(&self, _command: &SqlCommand) -> Result<Box<dyn ResultReader + '_>> {
        self.command()?;
        Ok(Box::new(StubReader {
            columns: self.behavior.columns.lock().unwrap().clone(),
            rows: self.behavior.rows.lock().unwrap().clone().into(),
        }))
    }
}

pub struct StubReader {
    columns: Vec<ColumnSchema>,
    rows: VecDeque<Vec<Value>>,
}

impl ResultReader for StubReader {
    fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

pub fn column(name: &str, data_type: DataType) -> ColumnSchema {
    ColumnSchema {
        name: name.to_owned(),
        data_type,
        maximum_length: 0.0,
        is_key: false,
        is_auto_increment: false,
        is_unique: false,
    }
}
