use crate::{Result, Row, RowLayout};

/// Binding between a concrete struct and its typed [`RowLayout`].
///
/// Implementations declare the layout explicitly (one registration step,
/// usually a `LayoutBuilder` chain kept next to the struct) and convert
/// to/from rows by field position. The layout's field order is the row's
/// value order.
pub trait Record: Sized {
    /// The typed layout this struct binds to. Cheap to call repeatedly, the
    /// descriptor slice is reference counted.
    fn layout() -> RowLayout;

    /// Convert this struct into a row aligned with [`Record::layout`].
    fn to_row(&self) -> Result<Row>;

    /// Rebuild a struct from a row aligned with [`Record::layout`].
    fn from_row(row: &Row) -> Result<Self>;
}
