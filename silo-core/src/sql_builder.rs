use crate::{
    ComparisonMode, DataError, Dialect, FieldDescriptor, Result, ResultOption, Row, RowLayout,
    Search, SqlCommand, SqlParam, codec, separated_by,
};

/// Compiles [`Search`] trees and [`ResultOption`] sets into dialect
/// specific SQL text plus an ordered parameter list.
///
/// The compiler is a pure function of (layout, expression, options): it
/// keeps no state between calls. Every value position is emitted as a bound
/// parameter, converted through the value codec, in placeholder emission
/// order — on positional dialects the parameter list order is the
/// placeholder order.
pub struct SqlBuilder<'a> {
    dialect: &'a dyn Dialect,
    layout: &'a RowLayout,
    database: &'a str,
    table: &'a str,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(
        dialect: &'a dyn Dialect,
        layout: &'a RowLayout,
        database: &'a str,
        table: &'a str,
    ) -> Self {
        SqlBuilder {
            dialect,
            layout,
            database,
            table,
        }
    }

    fn field(&self, name: &str) -> Result<&FieldDescriptor> {
        self.layout.field(name).ok_or_else(|| {
            DataError::invalid_operation(format!(
                "field `{name}` is not part of layout `{}`",
                self.layout.name()
            ))
        })
    }

    fn write_table_name(&self, out: &mut String) {
        self.dialect.write_table_name(out, self.database, self.table);
    }

    fn push_parameter(&self, out: &mut String, parameters: &mut Vec<SqlParam>, value: crate::Value) {
        let (placeholder, name) = self.dialect.parameter(parameters.len() + 1);
        out.push_str(&placeholder);
        parameters.push(SqlParam { name, value });
    }

    fn write_search(
        &self,
        out: &mut String,
        parameters: &mut Vec<SqlParam>,
        search: &Search,
    ) -> Result<()> {
        match search {
            Search::None => {}
            Search::Field { mode, field, value } => {
                let descriptor = self.field(field)?;
                let database_value = codec::get_database_value(self.dialect, descriptor, value)?;
                self.dialect
                    .write_field_name(out, &descriptor.name_at_database);
                if *mode == ComparisonMode::Equals && database_value.is_null() {
                    out.push_str(" IS NULL");
                } else {
                    out.push(' ');
                    out.push_str(mode.sql());
                    out.push(' ');
                    self.push_parameter(out, parameters, database_value);
                }
            }
            Search::And(lhs, rhs) | Search::Or(lhs, rhs) => {
                out.push('(');
                self.write_search(out, parameters, lhs)?;
                out.push_str(if matches!(search, Search::And(..)) {
                    " AND "
                } else {
                    " OR "
                });
                self.write_search(out, parameters, rhs)?;
                out.push(')');
            }
        }
        Ok(())
    }

    fn write_where(
        &self,
        out: &mut String,
        parameters: &mut Vec<SqlParam>,
        search: &Search,
    ) -> Result<()> {
        if !search.is_none() {
            out.push_str(" WHERE ");
            self.write_search(out, parameters, search)?;
        }
        Ok(())
    }

    /// Append GROUP BY / ORDER BY / paging clauses. Exclusivity of limit and
    /// offset is checked here, before any text reaches the caller.
    fn write_options(&self, out: &mut String, options: &ResultOption) -> Result<()> {
        let limit = options.get_limit()?;
        let offset = options.get_offset()?;
        let groups = options.groups();
        let sorts = options.sorts();
        if !groups.is_empty() {
            out.push_str(" GROUP BY ");
            let mut failed = None;
            separated_by(
                out,
                groups.iter().copied(),
                |out, name| match self.field(name) {
                    Ok(f) => self.dialect.write_field_name(out, &f.name_at_database),
                    Err(e) => failed = Some(e),
                },
                ",",
            );
            if let Some(e) = failed {
                return Err(e);
            }
        }
        if !sorts.is_empty() {
            out.push_str(" ORDER BY ");
            let mut failed = None;
            separated_by(
                out,
                sorts.iter().copied(),
                |out, (name, ascending)| match self.field(name) {
                    Ok(f) => {
                        self.dialect.write_field_name(out, &f.name_at_database);
                        out.push_str(if ascending { " ASC" } else { " DESC" });
                    }
                    Err(e) => failed = Some(e),
                },
                ",",
            );
            if let Some(e) = failed {
                return Err(e);
            }
        }
        self.dialect
            .write_limit_offset(out, limit, offset, !sorts.is_empty());
        Ok(())
    }

    fn check_group_sort(&self, options: &ResultOption) -> Result<()> {
        if !options.groups().is_empty()
            && !options.sorts().is_empty()
            && !self.dialect.capabilities().select_star_group_by
        {
            return Err(DataError::invalid_operation(format!(
                "dialect `{}` cannot combine grouping and sorting in one query",
                self.dialect.name()
            )));
        }
        Ok(())
    }

    /// `SELECT * FROM … [WHERE …][GROUP BY …][ORDER BY …][paging];`
    pub fn select(&self, search: &Search, options: &ResultOption) -> Result<SqlCommand> {
        self.check_group_sort(options)?;
        let mut out = String::with_capacity(128);
        let mut parameters = Vec::new();
        out.push_str("SELECT * FROM ");
        self.write_table_name(&mut out);
        self.write_where(&mut out, &mut parameters, search)?;
        self.write_options(&mut out, options)?;
        out.push(';');
        Ok(SqlCommand::with_parameters(out, parameters))
    }

    /// Select an explicit column subset; used by the per-group
    /// representative-row fallback.
    pub fn select_fields(
        &self,
        fields: &[&str],
        search: &Search,
        options: &ResultOption,
    ) -> Result<SqlCommand> {
        self.check_group_sort(options)?;
        let mut out = String::with_capacity(128);
        let mut parameters = Vec::new();
        out.push_str("SELECT ");
        let mut failed = None;
        separated_by(
            &mut out,
            fields.iter().copied(),
            |out, name| match self.field(name) {
                Ok(f) => self.dialect.write_field_name(out, &f.name_at_database),
                Err(e) => failed = Some(e),
            },
            ",",
        );
        if let Some(e) = failed {
            return Err(e);
        }
        out.push_str(" FROM ");
        self.write_table_name(&mut out);
        self.write_where(&mut out, &mut parameters, search)?;
        self.write_options(&mut out, options)?;
        out.push(';');
        Ok(SqlCommand::with_parameters(out, parameters))
    }

    /// `SELECT COUNT(*) FROM … [WHERE …];`
    pub fn count(&self, search: &Search) -> Result<SqlCommand> {
        let mut out = String::with_capacity(64);
        let mut parameters = Vec::new();
        out.push_str("SELECT COUNT(*) FROM ");
        self.write_table_name(&mut out);
        self.write_where(&mut out, &mut parameters, search)?;
        out.push(';');
        Ok(SqlCommand::with_parameters(out, parameters))
    }

    /// `INSERT INTO … (…) VALUES (…);` — auto increment fields are left to
    /// the backend.
    pub fn insert(&self, row: &Row) -> Result<SqlCommand> {
        if row.len() != self.layout.len() {
            return Err(DataError::invalid_data(format!(
                "row with {} values does not fit layout `{}` with {} fields",
                row.len(),
                self.layout.name(),
                self.layout.len()
            )));
        }
        let fields = self
            .layout
            .fields()
            .iter()
            .filter(|f| !f.is_auto_increment())
            .collect::<Vec<_>>();
        let mut out = String::with_capacity(128);
        let mut parameters = Vec::new();
        out.push_str("INSERT INTO ");
        self.write_table_name(&mut out);
        out.push_str(" (");
        separated_by(
            &mut out,
            &fields,
            |out, f| self.dialect.write_field_name(out, &f.name_at_database),
            ",",
        );
        out.push_str(") VALUES (");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let value = codec::get_database_value(self.dialect, field, &row.values()[field.index])?;
            self.push_parameter(&mut out, &mut parameters, value);
        }
        out.push_str(");");
        Ok(SqlCommand::with_parameters(out, parameters))
    }

    /// `UPDATE … SET … WHERE <id> = …;` — requires an ID field.
    pub fn update(&self, row: &Row) -> Result<SqlCommand> {
        let id_field = self.layout.id_field().ok_or_else(|| {
            DataError::invalid_operation(format!(
                "cannot update layout `{}` without an ID field",
                self.layout.name()
            ))
        })?;
        if row.len() != self.layout.len() {
            return Err(DataError::invalid_data(format!(
                "row with {} values does not fit layout `{}` with {} fields",
                row.len(),
                self.layout.name(),
                self.layout.len()
            )));
        }
        let mut out = String::with_capacity(128);
        let mut parameters = Vec::new();
        out.push_str("UPDATE ");
        self.write_table_name(&mut out);
        out.push_str(" SET ");
        let mut first = true;
        for field in self.layout.fields().iter().filter(|f| !f.is_id()) {
            if !first {
                out.push(',');
            }
            first = false;
            self.dialect.write_field_name(&mut out, &field.name_at_database);
            out.push_str(" = ");
            let value = codec::get_database_value(self.dialect, field, &row.values()[field.index])?;
            self.push_parameter(&mut out, &mut parameters, value);
        }
        out.push_str(" WHERE ");
        self.dialect
            .write_field_name(&mut out, &id_field.name_at_database);
        out.push_str(" = ");
        let id = codec::get_database_value(self.dialect, id_field, &row.values()[id_field.index])?;
        self.push_parameter(&mut out, &mut parameters, id);
        out.push(';');
        Ok(SqlCommand::with_parameters(out, parameters))
    }

    /// `DELETE FROM … [WHERE …];` — a [`Search::None`] deletes every row.
    pub fn delete(&self, search: &Search) -> Result<SqlCommand> {
        let mut out = String::with_capacity(64);
        let mut parameters = Vec::new();
        out.push_str("DELETE FROM ");
        self.write_table_name(&mut out);
        self.write_where(&mut out, &mut parameters, search)?;
        out.push(';');
        Ok(SqlCommand::with_parameters(out, parameters))
    }
}
