use crate::{DataError, DataType, DateTimeType, FieldDescriptor, Result, Value};
use std::fmt::Write;
use time::Duration;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        let mut buffer = ryu::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Statically reported capability flags of one backend. The core branches
/// on these instead of knowing dialects by name.
#[derive(Debug, Clone, Copy)]
pub struct DialectCapabilities {
    /// Named parameter placeholders (`@name`) vs. positional-only (`?`).
    pub named_parameters: bool,
    /// Character introducing a parameter placeholder.
    pub parameter_prefix: char,
    /// `SELECT *` combined with an arbitrary-field `GROUP BY` is valid SQL.
    /// Dialects without it get the per-group representative-row fallback.
    pub select_star_group_by: bool,
    /// The bound database of an open connection can be changed. Governs the
    /// pool's connection matching strategy.
    pub can_change_database: bool,
    /// Floating point columns can store IEEE infinities. Dialects without
    /// them get max/min finite sentinel substitution in the codec.
    pub has_ieee_infinity: bool,
}

/// Per-type precision ceilings of one backend. Callers use these to decide
/// whether two values are "equal enough" after a round trip.
#[derive(Debug, Clone, Copy)]
pub struct TypePrecision {
    pub float_epsilon: f64,
    /// Smallest DateTime difference the backend can distinguish.
    pub date_time_granularity: Duration,
    /// Smallest TimeSpan difference the backend can distinguish.
    pub time_span_granularity: Duration,
    /// Default decimal precision when a field does not declare one.
    pub decimal_precision: u8,
    /// Default decimal scale when a field does not declare one.
    pub decimal_scale: u8,
}

impl Default for TypePrecision {
    fn default() -> Self {
        TypePrecision {
            float_epsilon: f64::EPSILON,
            date_time_granularity: Duration::nanoseconds(100),
            time_span_granularity: Duration::nanoseconds(100),
            decimal_precision: 28,
            decimal_scale: 8,
        }
    }
}

/// Rewrite a descriptor's stored type for backends that keep temporal and
/// enum fields in scalar columns. This is the common part of
/// [`Dialect::database_field_properties`]; dialect implementations layer
/// their own integer/decimal promotions on top.
pub fn storage_field_properties(field: &FieldDescriptor) -> FieldDescriptor {
    let mut field = field.clone();
    match field.data_type {
        DataType::DateTime | DataType::TimeSpan => {
            field.type_at_database = match field.date_time_type {
                DateTimeType::Native => field.data_type,
                DateTimeType::BigIntTicks | DateTimeType::BigIntHumanReadable => DataType::Int64,
                DateTimeType::DecimalSeconds => DataType::Decimal,
                DateTimeType::DoubleSeconds | DateTimeType::DoubleEpoch => DataType::Float64,
            };
        }
        DataType::Enum => field.type_at_database = DataType::Int64,
        _ => {}
    }
    field
}

/// One backend's SQL syntax and capability profile, composed into the
/// execution engine as a strategy object. Default methods implement a
/// neutral double-quoting SQL flavor; backends override what differs.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> DialectCapabilities;

    fn precision(&self) -> TypePrecision {
        TypePrecision::default()
    }

    /// Quote a field name, doubling embedded quote characters.
    fn write_field_name(&self, out: &mut String, name: &str) {
        out.push('"');
        for c in name.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    }

    /// Fully qualified table name (database + table).
    fn write_table_name(&self, out: &mut String, database: &str, table: &str) {
        self.write_field_name(out, database);
        out.push('.');
        self.write_field_name(out, table);
    }

    /// Placeholder text and parameter name for the 1-based parameter
    /// `index`. Positional dialects return an empty name and emit the bare
    /// prefix character.
    fn parameter(&self, index: usize) -> (String, String) {
        let capabilities = self.capabilities();
        if capabilities.named_parameters {
            let name = format!("p{index}");
            (format!("{}{name}", capabilities.parameter_prefix), name)
        } else {
            (capabilities.parameter_prefix.to_string(), String::new())
        }
    }

    /// Paging clause. The semantics are fixed — skip `offset` rows in the
    /// specified order, then take at most `limit` — only the text varies.
    /// `ordered` tells dialects that require an ORDER BY alongside paging
    /// whether one was already written.
    fn write_limit_offset(
        &self,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
        _ordered: bool,
    ) {
        if let Some(limit) = limit {
            out.push_str(" LIMIT ");
            write_integer!(out, limit);
        }
        if let Some(offset) = offset {
            out.push_str(" OFFSET ");
            write_integer!(out, offset);
        }
    }

    /// Escape a string for contexts where parameter binding is unavailable:
    /// backslash-escapes `\ NUL ' " BS LF CR TAB` and wraps the result in
    /// single quotes.
    fn escape_string(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\0' => out.push_str("\\0"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\u{8}' => out.push_str("\\b"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c => out.push(c),
            }
        }
        out.push('\'');
        out
    }

    /// Binary literal as a hex blob (`X'ABCD'`).
    fn write_binary_literal(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    /// Render a value as inline SQL text, for contexts where parameter
    /// binding is unavailable. Parameterized paths never use this.
    fn write_value_literal(&self, out: &mut String, value: &Value) -> Result<()> {
        match value {
            v if v.is_null() => out.push_str("NULL"),
            Value::Bool(Some(v)) => out.push_str(["FALSE", "TRUE"][*v as usize]),
            Value::Int8(Some(v)) => write_integer!(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::UInt8(Some(v)) => write_integer!(out, *v),
            Value::UInt16(Some(v)) => write_integer!(out, *v),
            Value::UInt32(Some(v)) => write_integer!(out, *v),
            Value::UInt64(Some(v)) => write_integer!(out, *v),
            Value::Enum(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) if v.is_finite() => write_float!(out, *v),
            Value::Float64(Some(v)) if v.is_finite() => write_float!(out, *v),
            Value::Float32(..) | Value::Float64(..) => {
                return Err(DataError::invalid_operation(
                    "a non-finite float has no literal representation, bind it as a parameter",
                ));
            }
            Value::Decimal(Some(v)) => drop(write!(out, "{v}")),
            Value::String(Some(v)) => out.push_str(&self.escape_string(v)),
            Value::Binary(Some(v)) => self.write_binary_literal(out, v),
            Value::DateTime(Some(v)) => drop(write!(
                out,
                "'{:04}-{:02}-{:02} {:02}:{:02}:{:02}'",
                v.year(),
                v.month() as u8,
                v.day(),
                v.hour(),
                v.minute(),
                v.second()
            )),
            Value::TimeSpan(Some(v)) => write_float!(out, v.as_seconds_f64()),
            _ => unreachable!("null variants are handled above"),
        }
        Ok(())
    }

    /// Rewrite a descriptor into what this backend actually stores.
    fn database_field_properties(&self, field: &FieldDescriptor) -> FieldDescriptor {
        storage_field_properties(field)
    }

    /// A query returning the table's column metadata and no data rows.
    fn no_data_query(&self, database: &str, table: &str) -> String {
        let mut out = String::from("SELECT * FROM ");
        self.write_table_name(&mut out, database, table);
        out.push_str(" WHERE FALSE;");
        out
    }

    /// Query returning the last automatically generated row identifier on
    /// the current connection, when the backend exposes one.
    fn last_insert_id_query(&self) -> Option<&'static str> {
        None
    }

    /// Query listing the table names of a database, when the backend
    /// exposes one.
    fn list_tables_query(&self, _database: &str) -> Option<String> {
        None
    }
}

/// Neutral dialect: double-quoted identifiers, named `@pN` parameters,
/// `LIMIT n OFFSET m` paging, full IEEE floats. Useful for tests and as the
/// base behavior backends override.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities {
            named_parameters: true,
            parameter_prefix: '@',
            select_star_group_by: true,
            can_change_database: true,
            has_ieee_infinity: true,
        }
    }
}
