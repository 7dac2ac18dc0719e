use crate::{
    AsValue, DataError, Dialect, Driver, Record, Result, ResultOption, Row, RowLayout, Search,
    SqlBuilder, SqlCommand, SqlStorage, Value, codec,
};
use std::sync::Arc;

/// One table of one database, seen through a layout. All operations funnel
/// through the search compiler and the execution engine; the facade itself
/// is mechanical.
pub struct SqlTable<D: Driver> {
    storage: Arc<SqlStorage<D>>,
    database: String,
    name: String,
    layout: RowLayout,
}

impl<D: Driver> SqlTable<D> {
    /// Open a table with a schema-discovered (untyped) layout.
    pub fn open(
        storage: Arc<SqlStorage<D>>,
        database: impl Into<String>,
        name: &str,
    ) -> Result<Self> {
        let database = database.into();
        let layout = storage.query_schema(&database, name)?;
        Ok(SqlTable {
            storage,
            database,
            name: name.to_owned(),
            layout,
        })
    }

    /// Open a table with a typed layout. The layout's name is the table
    /// name; with `schema_check` enabled the live schema is asserted to be
    /// structurally compatible before the table is used.
    pub fn with_layout(
        storage: Arc<SqlStorage<D>>,
        database: impl Into<String>,
        layout: RowLayout,
    ) -> Result<Self> {
        let database = database.into();
        if storage.options().schema_check {
            let live = storage.query_schema(&database, layout.name())?;
            layout.check_layout(&live)?;
        }
        Ok(SqlTable {
            name: layout.name().to_owned(),
            storage,
            database,
            layout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    pub fn storage(&self) -> &Arc<SqlStorage<D>> {
        &self.storage
    }

    fn builder(&self) -> SqlBuilder<'_> {
        SqlBuilder::new(
            self.storage.dialect(),
            &self.layout,
            &self.database,
            &self.name,
        )
    }

    /// Rows of the grouped key query that backs both grouped counting and
    /// the representative-row fallback.
    fn group_key_rows(&self, search: &Search, options: &ResultOption) -> Result<Vec<Row>> {
        let groups = options.groups();
        let mut key_options = groups.iter().fold(ResultOption::none(), |acc, g| {
            acc + ResultOption::group((*g).to_string())
        });
        if let Some(limit) = options.get_limit()? {
            key_options = key_options + ResultOption::limit(limit);
        }
        if let Some(offset) = options.get_offset()? {
            key_options = key_options + ResultOption::offset(offset);
        }
        let command = self.builder().select_fields(&groups, search, &key_options)?;
        self.storage
            .query(&command, None, &self.database, &self.name)
    }

    /// Number of rows matching `search`; with grouping, the number of
    /// distinct groups.
    pub fn count(&self, search: &Search, options: &ResultOption) -> Result<u64> {
        if !options.groups().is_empty() {
            return Ok(self.group_key_rows(search, options)?.len() as u64);
        }
        let command = self.builder().count(search)?;
        match self
            .storage
            .query_value(&command, None, &self.database, &self.name)?
        {
            Some(value) => u64::try_from_value(value),
            None => Ok(0),
        }
    }

    pub fn exists(&self, search: &Search) -> Result<bool> {
        Ok(self.count(search, &ResultOption::none())? > 0)
    }

    /// All rows matching `search`, shaped by `options`.
    ///
    /// On dialects that cannot `SELECT *` with an arbitrary-field group by,
    /// grouping uses a fallback: the group keys are fetched first, then one
    /// representative row per group — the most recently inserted member
    /// (ID descending, limit 1). The tie-break reproduces the behavior of
    /// other backends, it is not a semantic guarantee.
    pub fn get_rows(&self, search: &Search, options: &ResultOption) -> Result<Vec<Row>> {
        let groups = options.groups();
        if groups.is_empty() || self.storage.dialect().capabilities().select_star_group_by {
            let command = self.builder().select(search, options)?;
            return self
                .storage
                .query(&command, Some(&self.layout), &self.database, &self.name);
        }
        if !options.sorts().is_empty() {
            return Err(DataError::invalid_operation(format!(
                "dialect `{}` cannot combine grouping and sorting",
                self.storage.dialect().name()
            )));
        }
        let key_rows = self.group_key_rows(search, options)?;
        let mut rows = Vec::with_capacity(key_rows.len());
        for key in key_rows {
            let mut member_search = Search::None;
            for (i, name) in groups.iter().enumerate() {
                member_search = member_search
                    & Search::field_equals((*name).to_string(), key.values()[i].clone());
            }
            let mut member_options = ResultOption::limit(1);
            if let Some(id) = self.layout.id_field() {
                member_options = ResultOption::sort_descending(id.name.clone()) + member_options;
            }
            let command = self.builder().select(&member_search, &member_options)?;
            let mut found =
                self.storage
                    .query(&command, Some(&self.layout), &self.database, &self.name)?;
            if let Some(row) = found.pop() {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// The single row matching `search`. Unlike the scalar `query_value`,
    /// an empty result is an error here.
    pub fn get_row(&self, search: &Search, options: &ResultOption) -> Result<Row> {
        let mut rows = self.get_rows(search, options)?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(DataError::invalid_data(format!(
                "no row in `{}` matches {search}",
                self.name
            ))),
            n => Err(DataError::invalid_data(format!(
                "{n} rows in `{}` match {search}, expected exactly one",
                self.name
            ))),
        }
    }

    /// Row at a position, in storage order.
    pub fn get_row_at(&self, index: u64) -> Result<Row> {
        let options = ResultOption::offset(index) + ResultOption::limit(1);
        self.get_row(&Search::None, &options)
    }

    pub fn get_records<R: Record>(
        &self,
        search: &Search,
        options: &ResultOption,
    ) -> Result<Vec<R>> {
        self.get_rows(search, options)?.iter().map(R::from_row).collect()
    }

    /// Insert a row. When the layout has an auto incremented ID field and
    /// the backend exposes a last-inserted-id query, the returned row
    /// carries the generated identifier.
    pub fn insert(&self, row: &Row) -> Result<Row> {
        let command = self.builder().insert(row)?;
        self.storage.execute(&command, &self.database, &self.name)?;
        let id_field = match self.layout.id_field() {
            Some(field) if field.is_auto_increment() => field,
            _ => return Ok(row.clone()),
        };
        let Some(query) = self.storage.dialect().last_insert_id_query() else {
            return Ok(row.clone());
        };
        // The id query is connection scoped; the LIFO pool hands back the
        // connection the insert just used.
        let command = SqlCommand::new(query);
        match self
            .storage
            .query_value(&command, None, &self.database, &self.name)?
        {
            Some(id) => {
                let id = codec::get_local_value(self.storage.dialect(), id_field, &id)?;
                row.with_id(&self.layout, id)
            }
            None => Ok(row.clone()),
        }
    }

    /// Update the row identified by its ID field. Exactly one row must be
    /// affected.
    pub fn update(&self, row: &Row) -> Result<()> {
        let command = self.builder().update(row)?;
        let affected = self.storage.execute(&command, &self.database, &self.name)?;
        if affected != 1 {
            return Err(DataError::invalid_data(format!(
                "update on `{}` affected {affected} rows instead of one",
                self.name
            )));
        }
        Ok(())
    }

    /// Delete every row matching `search`, returning the affected count.
    pub fn delete(&self, search: &Search) -> Result<u64> {
        let command = self.builder().delete(search)?;
        self.storage.execute(&command, &self.database, &self.name)
    }

    /// The scalar value of `field` in the single row matching `search`,
    /// `Ok(None)` when nothing matches.
    pub fn get_value(&self, field: &str, search: &Search) -> Result<Option<Value>> {
        let command = self.builder().select_fields(
            &[field],
            search,
            &ResultOption::none(),
        )?;
        self.storage
            .query_value(&command, Some(field), &self.database, &self.name)
    }
}
