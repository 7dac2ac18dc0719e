//! A scripted in-memory backend implementing the abstract driver
//! capability. It interprets exactly the SQL grammar the generic dialect
//! emits (select/count/insert/update/delete with WHERE trees, GROUP BY,
//! ORDER BY and paging), which is enough to drive every layer above the
//! driver seam.

use silo_core::{
    ColumnSchema, DataError, Dialect, Driver, FieldFlags, GenericDialect, RawConnection, Result,
    ResultReader, Row, RowLayout, SqlCommand, Value,
};
use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering as AtomicOrdering},
    },
};

/// Shared table store behind every connection of one driver.
#[derive(Default)]
pub struct MemoryBackend {
    databases: Mutex<HashMap<String, HashMap<String, TableData>>>,
    last_insert_id: Mutex<i64>,
}

struct TableData {
    layout: RowLayout,
    rows: Vec<Row>,
    next_id: i64,
}

impl MemoryBackend {
    pub fn new() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::default())
    }

    /// Register an empty table. The backend has no DDL surface; tests
    /// declare their tables here.
    pub fn register_table(&self, database: &str, layout: RowLayout) {
        self.databases
            .lock()
            .expect("memory backend lock poisoned")
            .entry(database.to_owned())
            .or_default()
            .insert(
                layout.name().to_owned(),
                TableData {
                    layout,
                    rows: Vec::new(),
                    next_id: 1,
                },
            );
    }

    fn with_table<T>(
        &self,
        database: &str,
        table: &str,
        f: impl FnOnce(&mut TableData) -> Result<T>,
    ) -> Result<T> {
        let mut databases = self.databases.lock().expect("memory backend lock poisoned");
        let data = databases
            .get_mut(database)
            .and_then(|tables| tables.get_mut(table))
            .ok_or_else(|| {
                DataError::invalid_operation(format!("unknown table `{database}`.`{table}`"))
            })?;
        f(data)
    }
}

/// The generic dialect plus a last-inserted-id query, which the memory
/// backend answers from its insert counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryDialect;

impl Dialect for MemoryDialect {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn capabilities(&self) -> silo_core::DialectCapabilities {
        GenericDialect.capabilities()
    }

    fn last_insert_id_query(&self) -> Option<&'static str> {
        Some("SELECT LAST_INSERT_ID();")
    }
}

/// [`MemoryDialect`] without `SELECT *` + arbitrary-field `GROUP BY`, to
/// exercise the representative-row fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryFallbackDialect;

impl Dialect for MemoryFallbackDialect {
    fn name(&self) -> &'static str {
        "memory-fallback"
    }

    fn capabilities(&self) -> silo_core::DialectCapabilities {
        silo_core::DialectCapabilities {
            select_star_group_by: false,
            ..GenericDialect.capabilities()
        }
    }

    fn last_insert_id_query(&self) -> Option<&'static str> {
        Some("SELECT LAST_INSERT_ID();")
    }
}

/// Driver over the shared backend. Tests can make the next connection
/// attempts fail to exercise the engine's retry loop, and read how many
/// physical connections were ever created.
pub struct MemoryDriver<Dia: Dialect = MemoryDialect> {
    backend: Arc<MemoryBackend>,
    dialect: Dia,
    fail_connections: AtomicU32,
    created: AtomicUsize,
}

impl<Dia: Dialect + Default> MemoryDriver<Dia> {
    pub fn new(backend: Arc<MemoryBackend>) -> MemoryDriver<Dia> {
        MemoryDriver {
            backend,
            dialect: Dia::default(),
            fail_connections: AtomicU32::new(0),
            created: AtomicUsize::new(0),
        }
    }
}

impl<Dia: Dialect> MemoryDriver<Dia> {
    pub fn fail_next_connections(&self, count: u32) {
        self.fail_connections.store(count, AtomicOrdering::SeqCst);
    }

    pub fn created_connections(&self) -> usize {
        self.created.load(AtomicOrdering::SeqCst)
    }
}

impl<Dia: Dialect + 'static> Driver for MemoryDriver<Dia> {
    type Connection = MemoryConnection;
    type Dialect = Dia;

    fn dialect(&self) -> &Dia {
        &self.dialect
    }

    fn create_connection(&self, database: &str) -> Result<MemoryConnection> {
        self.created.fetch_add(1, AtomicOrdering::SeqCst);
        if self
            .fail_connections
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |v| {
                v.checked_sub(1)
            })
            .is_ok()
        {
            return Err(anyhow::Error::msg(format!(
                "cannot reach the memory backend for `{database}`"
            )));
        }
        Ok(MemoryConnection {
            backend: self.backend.clone(),
            open: AtomicBool::new(true),
        })
    }
}

pub struct MemoryConnection {
    backend: Arc<MemoryBackend>,
    open: AtomicBool,
}

impl MemoryConnection {
    fn ensure_open(&self) -> Result<()> {
        if !self.is_open() {
            return Err(DataError::Disposed("MemoryConnection").into());
        }
        Ok(())
    }
}

impl RawConnection for MemoryConnection {
    fn is_open(&self) -> bool {
        self.open.load(AtomicOrdering::SeqCst)
    }

    fn close(&self) {
        self.open.store(false, AtomicOrdering::SeqCst);
    }

    fn change_database(&self, _database: &str) -> Result<()> {
        // Statements carry fully qualified table names, nothing to rebind.
        self.ensure_open()
    }

    fn execute(&self, command: &SqlCommand) -> Result<u64> {
        self.ensure_open()?;
        let statement = parse(&command.text)?;
        match statement {
            Statement::Insert {
                database,
                table,
                columns,
                parameters,
            } => self.backend.with_table(&database, &table, |data| {
                let mut values = Vec::with_capacity(data.layout.len());
                for field in data.layout.fields() {
                    if let Some(position) =
                        columns.iter().position(|c| c.as_str() == field.name.as_ref())
                    {
                        values.push(resolve(command, &parameters[position])?);
                    } else if field.is_auto_increment() {
                        let id = data.next_id;
                        data.next_id += 1;
                        *self
                            .backend
                            .last_insert_id
                            .lock()
                            .expect("memory backend lock poisoned") = id;
                        values.push(Value::Int64(Some(id)));
                    } else {
                        values.push(Value::Null);
                    }
                }
                data.rows.push(Row::new(values));
                Ok(1)
            }),
            Statement::Update {
                database,
                table,
                assignments,
                filter,
            } => self.backend.with_table(&database, &table, |data| {
                let mut resolved = Vec::with_capacity(assignments.len());
                for (column, parameter) in &assignments {
                    let index = field_index(&data.layout, column)?;
                    resolved.push((index, resolve(command, parameter)?));
                }
                let mut affected = 0;
                let layout = data.layout.clone();
                for row in &mut data.rows {
                    if matches(command, &layout, row, &filter)? {
                        let mut values = row.values().to_vec();
                        for (index, value) in &resolved {
                            values[*index] = value.clone();
                        }
                        *row = Row::new(values);
                        affected += 1;
                    }
                }
                Ok(affected)
            }),
            Statement::Delete {
                database,
                table,
                filter,
            } => self.backend.with_table(&database, &table, |data| {
                let layout = data.layout.clone();
                let before = data.rows.len();
                let mut error = None;
                data.rows.retain(|row| {
                    if error.is_some() {
                        return true;
                    }
                    match matches(command, &layout, row, &filter) {
                        Ok(matched) => !matched,
                        Err(e) => {
                            error = Some(e);
                            true
                        }
                    }
                });
                if let Some(e) = error {
                    return Err(e);
                }
                Ok((before - data.rows.len()) as u64)
            }),
            Statement::Select { .. } => Err(DataError::invalid_operation(
                "execute cannot run a select statement",
            )),
        }
    }

    fn query(&self, command: &SqlCommand) -> Result<Box<dyn ResultReader + '_>> {
        self.ensure_open()?;
        if command.text.starts_with("SELECT LAST_INSERT_ID()") {
            let id = *self
                .backend
                .last_insert_id
                .lock()
                .expect("memory backend lock poisoned");
            return Ok(Box::new(MemoryReader {
                columns: vec![ColumnSchema {
                    name: "LAST_INSERT_ID()".to_owned(),
                    data_type: silo_core::DataType::Int64,
                    maximum_length: 0.0,
                    is_key: false,
                    is_auto_increment: false,
                    is_unique: false,
                }],
                rows: vec![vec![Value::Int64(Some(id))]].into_iter().collect(),
            }));
        }
        let Statement::Select {
            database,
            table,
            projection,
            filter,
            group_by,
            order_by,
            limit,
            offset,
        } = parse(&command.text)?
        else {
            return Err(DataError::invalid_operation(
                "query can only run select statements",
            ));
        };
        self.backend.with_table(&database, &table, |data| {
            let layout = data.layout.clone();
            let mut rows = Vec::new();
            for row in &data.rows {
                if matches(command, &layout, row, &filter)? {
                    rows.push(row.clone());
                }
            }
            if !group_by.is_empty() {
                rows = group_rows(&layout, rows, &group_by)?;
            }
            if !order_by.is_empty() {
                let mut indexes = Vec::new();
                for (name, ascending) in &order_by {
                    indexes.push((field_index(&layout, name)?, *ascending));
                }
                rows.sort_by(|a, b| {
                    for (index, ascending) in &indexes {
                        let order = compare(&a.values()[*index], &b.values()[*index]);
                        let order = if *ascending { order } else { order.reverse() };
                        if order != Ordering::Equal {
                            return order;
                        }
                    }
                    Ordering::Equal
                });
            }
            let offset = offset.unwrap_or(0) as usize;
            let rows = rows.into_iter().skip(offset);
            let rows: Vec<Row> = match limit {
                Some(limit) => rows.take(limit as usize).collect(),
                None => rows.collect(),
            };
            let (columns, rows) = project(&layout, rows, &projection)?;
            Ok(Box::new(MemoryReader {
                columns,
                rows: rows.into_iter().collect(),
            }) as Box<dyn ResultReader>)
        })
    }
}

struct MemoryReader {
    columns: Vec<ColumnSchema>,
    rows: std::collections::VecDeque<Vec<Value>>,
}

impl ResultReader for MemoryReader {
    fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

fn column_schema(layout: &RowLayout, index: usize) -> ColumnSchema {
    let field = &layout.fields()[index];
    ColumnSchema {
        name: field.name.to_string(),
        data_type: field.data_type,
        maximum_length: field.maximum_length,
        is_key: field.flags.contains(FieldFlags::ID),
        is_auto_increment: field.flags.contains(FieldFlags::AUTO_INCREMENT),
        is_unique: field.flags.contains(FieldFlags::UNIQUE),
    }
}

fn field_index(layout: &RowLayout, name: &str) -> Result<usize> {
    layout.field_index(name).ok_or_else(|| {
        DataError::invalid_operation(format!(
            "unknown column `{name}` in table `{}`",
            layout.name()
        ))
    })
}

/// One representative (first seen) row per distinct group key combination.
fn group_rows(layout: &RowLayout, rows: Vec<Row>, group_by: &[String]) -> Result<Vec<Row>> {
    let mut indexes = Vec::new();
    for name in group_by {
        indexes.push(field_index(layout, name)?);
    }
    let mut seen: Vec<Vec<Value>> = Vec::new();
    let mut result = Vec::new();
    for row in rows {
        let key: Vec<Value> = indexes.iter().map(|i| row.values()[*i].clone()).collect();
        if !seen.contains(&key) {
            seen.push(key);
            result.push(row);
        }
    }
    Ok(result)
}

fn project(
    layout: &RowLayout,
    rows: Vec<Row>,
    projection: &Projection,
) -> Result<(Vec<ColumnSchema>, Vec<Vec<Value>>)> {
    match projection {
        Projection::All => {
            let columns = (0..layout.len()).map(|i| column_schema(layout, i)).collect();
            Ok((columns, rows.into_iter().map(|r| r.values().to_vec()).collect()))
        }
        Projection::Count => Ok((
            vec![ColumnSchema {
                name: "COUNT(*)".to_owned(),
                data_type: silo_core::DataType::Int64,
                maximum_length: 0.0,
                is_key: false,
                is_auto_increment: false,
                is_unique: false,
            }],
            vec![vec![Value::Int64(Some(rows.len() as i64))]],
        )),
        Projection::Columns(names) => {
            let mut indexes = Vec::new();
            for name in names {
                indexes.push(field_index(layout, name)?);
            }
            let columns = indexes.iter().map(|i| column_schema(layout, *i)).collect();
            let rows = rows
                .into_iter()
                .map(|r| indexes.iter().map(|i| r.values()[*i].clone()).collect())
                .collect();
            Ok((columns, rows))
        }
    }
}

/// NULL-first total order over comparable value pairs, used for ORDER BY.
fn compare(a: &Value, b: &Value) -> Ordering {
    fn as_i128(v: &Value) -> Option<i128> {
        Some(match v {
            Value::Int8(Some(v)) => *v as i128,
            Value::Int16(Some(v)) => *v as i128,
            Value::Int32(Some(v)) => *v as i128,
            Value::Int64(Some(v)) => *v as i128,
            Value::UInt8(Some(v)) => *v as i128,
            Value::UInt16(Some(v)) => *v as i128,
            Value::UInt32(Some(v)) => *v as i128,
            Value::UInt64(Some(v)) => *v as i128,
            Value::Enum(Some(v)) => *v as i128,
            _ => return None,
        })
    }
    fn as_f64(v: &Value) -> Option<f64> {
        Some(match v {
            Value::Float32(Some(v)) => *v as f64,
            Value::Float64(Some(v)) => *v,
            _ => return None,
        })
    }
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    if let (Some(a), Some(b)) = (as_i128(a), as_i128(b)) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (as_f64(a), as_f64(b)) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    match (a, b) {
        (Value::Bool(Some(a)), Value::Bool(Some(b))) => a.cmp(b),
        (Value::Decimal(Some(a)), Value::Decimal(Some(b))) => a.cmp(b),
        (Value::String(Some(a)), Value::String(Some(b))) => a.cmp(b),
        (Value::DateTime(Some(a)), Value::DateTime(Some(b))) => a.cmp(b),
        (Value::TimeSpan(Some(a)), Value::TimeSpan(Some(b))) => a.cmp(b),
        (Value::Binary(Some(a)), Value::Binary(Some(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

fn matches(command: &SqlCommand, layout: &RowLayout, row: &Row, filter: &Expr) -> Result<bool> {
    Ok(match filter {
        Expr::True => true,
        Expr::False => false,
        Expr::IsNull(name) => row.values()[field_index(layout, name)?].is_null(),
        Expr::Compare { column, op, parameter } => {
            let value = &row.values()[field_index(layout, column)?];
            let bound = resolve(command, parameter)?;
            if value.is_null() || bound.is_null() {
                false
            } else {
                let order = compare(value, &bound);
                match op.as_str() {
                    "=" => order == Ordering::Equal,
                    ">" => order == Ordering::Greater,
                    "<" => order == Ordering::Less,
                    ">=" => order != Ordering::Less,
                    "<=" => order != Ordering::Greater,
                    other => {
                        return Err(DataError::invalid_operation(format!(
                            "unsupported comparison `{other}`"
                        )));
                    }
                }
            }
        }
        Expr::And(l, r) => matches(command, layout, row, l)? && matches(command, layout, row, r)?,
        Expr::Or(l, r) => matches(command, layout, row, l)? || matches(command, layout, row, r)?,
    })
}

fn resolve(command: &SqlCommand, parameter: &str) -> Result<Value> {
    command
        .parameter(parameter)
        .cloned()
        .ok_or_else(|| DataError::invalid_data(format!("unbound parameter `{parameter}`")))
}

enum Projection {
    All,
    Count,
    Columns(Vec<String>),
}

enum Expr {
    True,
    False,
    IsNull(String),
    Compare {
        column: String,
        op: String,
        parameter: String,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

enum Statement {
    Select {
        database: String,
        table: String,
        projection: Projection,
        filter: Expr,
        group_by: Vec<String>,
        order_by: Vec<(String, bool)>,
        limit: Option<u64>,
        offset: Option<u64>,
    },
    Insert {
        database: String,
        table: String,
        columns: Vec<String>,
        parameters: Vec<String>,
    },
    Update {
        database: String,
        table: String,
        assignments: Vec<(String, String)>,
        filter: Expr,
    },
    Delete {
        database: String,
        table: String,
        filter: Expr,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Word(String),
    Param(String),
    Number(u64),
    Op(String),
    LParen,
    RParen,
    Comma,
    Dot,
    Star,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ' ' | '\n' | '\t' | ';' => {}
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            ',' => tokens.push(Token::Comma),
            '.' => tokens.push(Token::Dot),
            '*' => tokens.push(Token::Star),
            '"' => {
                let mut ident = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                ident.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => ident.push(c),
                        None => {
                            return Err(DataError::invalid_data(
                                "unterminated quoted identifier",
                            ));
                        }
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            '@' => {
                let mut name = String::new();
                while let Some(c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        name.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Param(name));
            }
            '=' => tokens.push(Token::Op("=".to_owned())),
            '<' | '>' => {
                let mut op = c.to_string();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    op.push('=');
                }
                tokens.push(Token::Op(op));
            }
            c if c.is_ascii_digit() => {
                let mut number = c.to_digit(10).expect("digit") as u64;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    number = number * 10 + d as u64;
                    chars.next();
                }
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = c.to_string();
                while let Some(c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        word.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word.to_ascii_uppercase()));
            }
            other => {
                return Err(DataError::invalid_data(format!(
                    "unexpected character `{other}` in statement"
                )));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Result<Token> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| DataError::invalid_data("unexpected end of statement"))?;
        self.position += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        let token = self.next()?;
        if token != *expected {
            return Err(DataError::invalid_data(format!(
                "expected {expected:?}, found {token:?}"
            )));
        }
        Ok(())
    }

    fn expect_word(&mut self, word: &str) -> Result<()> {
        self.expect(&Token::Word(word.to_owned()))
    }

    fn accept_word(&mut self, word: &str) -> bool {
        if self.peek() == Some(&Token::Word(word.to_owned())) {
            self.position += 1;
            return true;
        }
        false
    }

    fn ident(&mut self) -> Result<String> {
        match self.next()? {
            Token::Ident(name) => Ok(name),
            other => Err(DataError::invalid_data(format!(
                "expected an identifier, found {other:?}"
            ))),
        }
    }

    fn param(&mut self) -> Result<String> {
        match self.next()? {
            Token::Param(name) => Ok(name),
            other => Err(DataError::invalid_data(format!(
                "expected a parameter, found {other:?}"
            ))),
        }
    }

    fn number(&mut self) -> Result<u64> {
        match self.next()? {
            Token::Number(v) => Ok(v),
            other => Err(DataError::invalid_data(format!(
                "expected a number, found {other:?}"
            ))),
        }
    }

    fn table_ref(&mut self) -> Result<(String, String)> {
        let database = self.ident()?;
        self.expect(&Token::Dot)?;
        let table = self.ident()?;
        Ok((database, table))
    }

    fn filter(&mut self) -> Result<Expr> {
        if self.accept_word("WHERE") {
            self.expression()
        } else {
            Ok(Expr::True)
        }
    }

    fn expression(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::LParen) => {
                self.next()?;
                let lhs = self.expression()?;
                let and = match self.next()? {
                    Token::Word(w) if w == "AND" => true,
                    Token::Word(w) if w == "OR" => false,
                    other => {
                        return Err(DataError::invalid_data(format!(
                            "expected AND/OR, found {other:?}"
                        )));
                    }
                };
                let rhs = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(if and {
                    Expr::And(Box::new(lhs), Box::new(rhs))
                } else {
                    Expr::Or(Box::new(lhs), Box::new(rhs))
                })
            }
            Some(Token::Word(w)) if w == "FALSE" => {
                self.next()?;
                Ok(Expr::False)
            }
            Some(Token::Number(_)) => {
                // The T-SQL style no-data filter `1 = 0`.
                self.number()?;
                let op = match self.next()? {
                    Token::Op(op) => op,
                    other => {
                        return Err(DataError::invalid_data(format!(
                            "expected an operator, found {other:?}"
                        )));
                    }
                };
                let rhs = self.number()?;
                if op == "=" && rhs != 0 {
                    return Err(DataError::invalid_data("unsupported constant filter"));
                }
                Ok(Expr::False)
            }
            _ => {
                let column = self.ident()?;
                if self.accept_word("IS") {
                    self.expect_word("NULL")?;
                    return Ok(Expr::IsNull(column));
                }
                let op = match self.next()? {
                    Token::Op(op) => op,
                    other => {
                        return Err(DataError::invalid_data(format!(
                            "expected an operator, found {other:?}"
                        )));
                    }
                };
                let parameter = self.param()?;
                Ok(Expr::Compare {
                    column,
                    op,
                    parameter,
                })
            }
        }
    }

    fn trailing_clauses(
        &mut self,
    ) -> Result<(Vec<String>, Vec<(String, bool)>, Option<u64>, Option<u64>)> {
        let mut group_by = Vec::new();
        let mut order_by = Vec::new();
        let mut limit = None;
        let mut offset = None;
        if self.accept_word("GROUP") {
            self.expect_word("BY")?;
            loop {
                group_by.push(self.ident()?);
                if !matches!(self.peek(), Some(Token::Comma)) {
                    break;
                }
                self.next()?;
            }
        }
        if self.accept_word("ORDER") {
            self.expect_word("BY")?;
            loop {
                // Tolerate the paging shim `ORDER BY (SELECT NULL)`.
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.next()?;
                    self.expect_word("SELECT")?;
                    self.expect_word("NULL")?;
                    self.expect(&Token::RParen)?;
                } else {
                    let name = self.ident()?;
                    let ascending = if self.accept_word("ASC") {
                        true
                    } else {
                        !self.accept_word("DESC")
                    };
                    order_by.push((name, ascending));
                }
                if !matches!(self.peek(), Some(Token::Comma)) {
                    break;
                }
                self.next()?;
            }
        }
        if self.accept_word("LIMIT") {
            limit = Some(self.number()?);
        }
        if self.accept_word("OFFSET") {
            offset = Some(self.number()?);
            if self.accept_word("ROWS") {
                // OFFSET/FETCH order is reversed relative to LIMIT/OFFSET.
                if self.accept_word("FETCH") {
                    self.expect_word("NEXT")?;
                    limit = Some(self.number()?);
                    self.expect_word("ROWS")?;
                    self.expect_word("ONLY")?;
                }
            }
        }
        Ok((group_by, order_by, limit, offset))
    }
}

fn parse(text: &str) -> Result<Statement> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        position: 0,
    };
    match parser.next()? {
        Token::Word(w) if w == "SELECT" => {
            let projection = match parser.peek() {
                Some(Token::Star) => {
                    parser.next()?;
                    Projection::All
                }
                Some(Token::Word(w)) if w == "COUNT" => {
                    parser.next()?;
                    parser.expect(&Token::LParen)?;
                    parser.expect(&Token::Star)?;
                    parser.expect(&Token::RParen)?;
                    Projection::Count
                }
                _ => {
                    let mut columns = Vec::new();
                    loop {
                        columns.push(parser.ident()?);
                        if !matches!(parser.peek(), Some(Token::Comma)) {
                            break;
                        }
                        parser.next()?;
                    }
                    Projection::Columns(columns)
                }
            };
            parser.expect_word("FROM")?;
            let (database, table) = parser.table_ref()?;
            let filter = parser.filter()?;
            let (group_by, order_by, limit, offset) = parser.trailing_clauses()?;
            Ok(Statement::Select {
                database,
                table,
                projection,
                filter,
                group_by,
                order_by,
                limit,
                offset,
            })
        }
        Token::Word(w) if w == "INSERT" => {
            parser.expect_word("INTO")?;
            let (database, table) = parser.table_ref()?;
            parser.expect(&Token::LParen)?;
            let mut columns = Vec::new();
            loop {
                columns.push(parser.ident()?);
                if !matches!(parser.peek(), Some(Token::Comma)) {
                    break;
                }
                parser.next()?;
            }
            parser.expect(&Token::RParen)?;
            parser.expect_word("VALUES")?;
            parser.expect(&Token::LParen)?;
            let mut parameters = Vec::new();
            loop {
                parameters.push(parser.param()?);
                if !matches!(parser.peek(), Some(Token::Comma)) {
                    break;
                }
                parser.next()?;
            }
            parser.expect(&Token::RParen)?;
            Ok(Statement::Insert {
                database,
                table,
                columns,
                parameters,
            })
        }
        Token::Word(w) if w == "UPDATE" => {
            let (database, table) = parser.table_ref()?;
            parser.expect_word("SET")?;
            let mut assignments = Vec::new();
            loop {
                let column = parser.ident()?;
                parser.expect(&Token::Op("=".to_owned()))?;
                assignments.push((column, parser.param()?));
                if !matches!(parser.peek(), Some(Token::Comma)) {
                    break;
                }
                parser.next()?;
            }
            let filter = parser.filter()?;
            Ok(Statement::Update {
                database,
                table,
                assignments,
                filter,
            })
        }
        Token::Word(w) if w == "DELETE" => {
            parser.expect_word("FROM")?;
            let (database, table) = parser.table_ref()?;
            let filter = parser.filter()?;
            Ok(Statement::Delete {
                database,
                table,
                filter,
            })
        }
        other => Err(DataError::invalid_data(format!(
            "unsupported statement starting with {other:?}"
        ))),
    }
}
