use silo_core::{
    DataType, Dialect, DialectCapabilities, FieldDescriptor, TypePrecision,
    storage_field_properties,
};
use time::Duration;

/// MSSQL (T-SQL) flavor: bracket quoting, named `@pN` parameters,
/// `OFFSET … ROWS FETCH NEXT … ROWS ONLY` paging. T-SQL refuses `SELECT *`
/// with an arbitrary-field `GROUP BY`, so grouped reads go through the
/// representative-row fallback. TINYINT is unsigned and the unsigned
/// widths have no native column type, hence the width promotions.
#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlDialect;

impl Dialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities {
            named_parameters: true,
            parameter_prefix: '@',
            select_star_group_by: false,
            can_change_database: true,
            has_ieee_infinity: true,
        }
    }

    fn precision(&self) -> TypePrecision {
        TypePrecision {
            float_epsilon: 1e-9,
            // The classic DATETIME type ticks at 1/300 of a second.
            date_time_granularity: Duration::nanoseconds(3_333_333),
            time_span_granularity: Duration::nanoseconds(3_333_333),
            decimal_precision: 38,
            decimal_scale: 18,
        }
    }

    fn write_field_name(&self, out: &mut String, name: &str) {
        out.push('[');
        for c in name.chars() {
            if c == ']' {
                out.push(']');
            }
            out.push(c);
        }
        out.push(']');
    }

    fn write_table_name(&self, out: &mut String, database: &str, table: &str) {
        self.write_field_name(out, database);
        out.push_str(".[dbo].");
        self.write_field_name(out, table);
    }

    fn write_limit_offset(
        &self,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
        ordered: bool,
    ) {
        if limit.is_none() && offset.is_none() {
            return;
        }
        // OFFSET/FETCH is only valid after an ORDER BY.
        if !ordered {
            out.push_str(" ORDER BY (SELECT NULL)");
        }
        let mut buffer = itoa::Buffer::new();
        out.push_str(" OFFSET ");
        out.push_str(buffer.format(offset.unwrap_or(0)));
        out.push_str(" ROWS");
        if let Some(limit) = limit {
            out.push_str(" FETCH NEXT ");
            out.push_str(buffer.format(limit));
            out.push_str(" ROWS ONLY");
        }
    }

    fn database_field_properties(&self, field: &FieldDescriptor) -> FieldDescriptor {
        let mut field = storage_field_properties(field);
        match field.data_type {
            DataType::Int8 | DataType::UInt8 => field.type_at_database = DataType::Int16,
            DataType::UInt16 => field.type_at_database = DataType::Int32,
            DataType::UInt32 => field.type_at_database = DataType::Int64,
            DataType::UInt64 => {
                field.type_at_database = DataType::Decimal;
                if field.maximum_length == 0.0 {
                    field.maximum_length = 20.0;
                }
            }
            DataType::Decimal if field.maximum_length == 0.0 => {
                let precision = self.precision();
                field.maximum_length =
                    precision.decimal_precision as f32 + precision.decimal_scale as f32 / 100.0;
            }
            _ => {}
        }
        field
    }

    fn no_data_query(&self, database: &str, table: &str) -> String {
        let mut out = String::from("SELECT * FROM ");
        self.write_table_name(&mut out, database, table);
        out.push_str(" WHERE 1 = 0;");
        out
    }

    fn last_insert_id_query(&self) -> Option<&'static str> {
        Some("SELECT SCOPE_IDENTITY();")
    }

    fn list_tables_query(&self, database: &str) -> Option<String> {
        let mut out = String::from("SELECT [name] FROM ");
        self.write_field_name(&mut out, database);
        out.push_str(".[sys].[tables];");
        Some(out)
    }
}
