use crate::{DataError, Result, RowLayout, Value};

/// A fixed-size ordered array of values aligned 1:1 with a [`RowLayout`]'s
/// fields. A row owns its values exclusively and is never partially
/// mutated: operations like [`Row::with_id`] return a new row with one slot
/// replaced. A row is meaningless without its paired layout.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Row {
    values: Box<[Value]>,
}

impl Row {
    pub fn new(values: impl Into<Box<[Value]>>) -> Row {
        Row {
            values: values.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the layout's ID field, if the layout declares one.
    pub fn id(&self, layout: &RowLayout) -> Option<&Value> {
        layout.id_field_index().and_then(|i| self.get(i))
    }

    /// A copy of this row with the slot at `index` replaced.
    pub fn with_value(&self, index: usize, value: Value) -> Result<Row> {
        if index >= self.values.len() {
            return Err(DataError::invalid_data(format!(
                "field index {index} is outside a row with {} values",
                self.values.len()
            )));
        }
        let mut values = self.values.clone();
        values[index] = value;
        Ok(Row { values })
    }

    /// A copy of this row with the layout's ID slot replaced.
    pub fn with_id(&self, layout: &RowLayout, id: Value) -> Result<Row> {
        let index = layout.id_field_index().ok_or_else(|| {
            DataError::invalid_operation(format!("layout `{layout}` has no ID field"))
        })?;
        self.with_value(index, id)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.values.into_vec().into_iter()
    }
}
