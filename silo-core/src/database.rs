use crate::{
    AsValue, DataError, Dialect, Driver, Result, RowLayout, SqlCommand, SqlStorage, SqlTable,
};
use std::sync::Arc;

/// One named database of a storage instance, a factory for table facades.
pub struct SqlDatabase<D: Driver> {
    storage: Arc<SqlStorage<D>>,
    name: String,
}

impl<D: Driver> SqlDatabase<D> {
    pub fn new(storage: Arc<SqlStorage<D>>, name: impl Into<String>) -> Self {
        SqlDatabase {
            storage,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &Arc<SqlStorage<D>> {
        &self.storage
    }

    /// Open a table with a schema-discovered layout.
    pub fn table(&self, name: &str) -> Result<SqlTable<D>> {
        SqlTable::open(self.storage.clone(), self.name.clone(), name)
    }

    /// Open a table bound to a typed layout (the layout name is the table
    /// name).
    pub fn table_with_layout(&self, layout: RowLayout) -> Result<SqlTable<D>> {
        SqlTable::with_layout(self.storage.clone(), self.name.clone(), layout)
    }

    /// Table names of this database, when the dialect can list them.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let query = self
            .storage
            .dialect()
            .list_tables_query(&self.name)
            .ok_or_else(|| {
                DataError::invalid_operation(format!(
                    "dialect `{}` cannot enumerate tables",
                    self.storage.dialect().name()
                ))
            })?;
        let command = SqlCommand::new(query);
        self.storage
            .query(&command, None, &self.name, "")?
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .next()
                    .ok_or_else(|| DataError::invalid_data("empty table listing row"))
                    .and_then(String::try_from_value)
            })
            .collect()
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.table_names()?.iter().any(|t| t == name))
    }
}
