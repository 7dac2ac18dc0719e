use silo_core::{
    DataType, Dialect, DialectCapabilities, FieldDescriptor, TypePrecision,
    storage_field_properties,
};
use time::Duration;

/// MySQL flavor: backtick quoting, positional `?` parameters,
/// `LIMIT n OFFSET m` paging. MySQL can rebind an open connection with
/// `USE` and accepts `SELECT *` together with an arbitrary-field
/// `GROUP BY`; its FLOAT/DOUBLE columns cannot store IEEE infinities, so
/// the codec substitutes the max/min finite sentinels.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities {
            named_parameters: false,
            parameter_prefix: '?',
            select_star_group_by: true,
            can_change_database: true,
            has_ieee_infinity: false,
        }
    }

    fn precision(&self) -> TypePrecision {
        TypePrecision {
            float_epsilon: 1e-7,
            // DATETIME stores whole seconds; finer stamps need a non-native
            // date_time_type.
            date_time_granularity: Duration::seconds(1),
            time_span_granularity: Duration::seconds(1),
            decimal_precision: 65,
            decimal_scale: 30,
        }
    }

    fn write_field_name(&self, out: &mut String, name: &str) {
        out.push('`');
        for c in name.chars() {
            if c == '`' {
                out.push('`');
            }
            out.push(c);
        }
        out.push('`');
    }

    fn write_limit_offset(
        &self,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
        _ordered: bool,
    ) {
        let mut buffer = itoa::Buffer::new();
        match (limit, offset) {
            (Some(limit), None) => {
                out.push_str(" LIMIT ");
                out.push_str(buffer.format(limit));
            }
            // MySQL has no standalone OFFSET clause.
            (limit, Some(offset)) => {
                out.push_str(" LIMIT ");
                out.push_str(buffer.format(limit.unwrap_or(u64::MAX)));
                out.push_str(" OFFSET ");
                out.push_str(buffer.format(offset));
            }
            (None, None) => {}
        }
    }

    fn database_field_properties(&self, field: &FieldDescriptor) -> FieldDescriptor {
        let mut field = storage_field_properties(field);
        if field.data_type == DataType::Decimal && field.maximum_length == 0.0 {
            let precision = self.precision();
            field.maximum_length =
                precision.decimal_precision as f32 + precision.decimal_scale as f32 / 100.0;
        }
        field
    }

    fn last_insert_id_query(&self) -> Option<&'static str> {
        Some("SELECT LAST_INSERT_ID();")
    }

    fn list_tables_query(&self, database: &str) -> Option<String> {
        Some(format!(
            "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_SCHEMA = {};",
            self.escape_string(database)
        ))
    }
}
