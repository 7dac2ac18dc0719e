use crate::{DataError, FieldDescriptor, FieldFlags, Result};
use std::{borrow::Cow, fmt, sync::Arc};

/// Ordered, immutable sequence of [`FieldDescriptor`]s describing a row's
/// shape, plus derived lookups. Layouts are created once — from an explicit
/// builder registration or from live schema discovery — and never mutated;
/// transformations produce new layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    name: Cow<'static, str>,
    fields: Arc<[FieldDescriptor]>,
    typed: bool,
    id_field_index: Option<usize>,
}

impl RowLayout {
    /// Build a layout bound to a concrete struct shape. At most one field
    /// may carry the ID flag.
    pub fn typed(
        name: impl Into<Cow<'static, str>>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<RowLayout> {
        let name = name.into();
        let ids = fields.iter().filter(|f| f.is_id()).count();
        if ids > 1 {
            return Err(DataError::schema_mismatch(
                name,
                format!("a typed layout allows a single ID field, found {ids}"),
            ));
        }
        Ok(Self::build(name, fields, true))
    }

    /// Build a layout discovered from a live schema (no struct binding).
    pub fn untyped(name: impl Into<Cow<'static, str>>, fields: Vec<FieldDescriptor>) -> RowLayout {
        Self::build(name.into(), fields, false)
    }

    fn build(name: Cow<'static, str>, mut fields: Vec<FieldDescriptor>, typed: bool) -> RowLayout {
        for (i, field) in fields.iter_mut().enumerate() {
            field.index = i;
        }
        let id_field_index = fields.iter().position(FieldDescriptor::is_id);
        RowLayout {
            name,
            fields: fields.into(),
            typed,
            id_field_index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether this layout is bound to a concrete struct shape.
    pub fn is_typed(&self) -> bool {
        self.typed
    }

    pub fn id_field_index(&self) -> Option<usize> {
        self.id_field_index
    }

    pub fn id_field(&self) -> Option<&FieldDescriptor> {
        self.id_field_index.map(|i| &self.fields[i])
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Assert structural compatibility with another layout: same field
    /// count, and each corresponding descriptor equal in name, datatype and
    /// flags. Failure is a [`DataError::SchemaMismatch`].
    pub fn check_layout(&self, other: &RowLayout) -> Result<()> {
        if self.len() != other.len() {
            return Err(DataError::schema_mismatch(
                self.name.clone(),
                format!(
                    "field count {} does not match layout `{}` with {} fields",
                    self.len(),
                    other.name,
                    other.len()
                ),
            ));
        }
        for (mine, theirs) in self.fields.iter().zip(other.fields.iter()) {
            if !mine.matches(theirs) {
                return Err(DataError::schema_mismatch(
                    self.name.clone(),
                    format!("field {mine} does not match {theirs}"),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for RowLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} fields)", self.name, self.len())
    }
}

/// Explicit registration step producing a typed [`RowLayout`]: the field
/// list is declared in code, in order, with the same descriptor semantics a
/// schema discovery would produce.
pub struct LayoutBuilder {
    name: Cow<'static, str>,
    fields: Vec<FieldDescriptor>,
}

impl LayoutBuilder {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        LayoutBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    /// Shorthand for an auto incremented Int64 ID field.
    pub fn id(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.field(
            FieldDescriptor::new(name, crate::DataType::Int64)
                .with_flags(FieldFlags::ID | FieldFlags::AUTO_INCREMENT),
        )
    }

    pub fn build(self) -> Result<RowLayout> {
        RowLayout::typed(self.name, self.fields)
    }
}
