use thiserror::Error;

/// Classification of data layer failures.
///
/// Instances are wrapped into [`crate::Error`] at the API boundary; callers
/// that need to branch on the class use `downcast_ref::<DataError>()`. The
/// execution engine never looks at this type to decide retries — retry
/// eligibility depends only on the observable connection state.
#[derive(Debug, Error)]
pub enum DataError {
    /// A result set had an unexpected shape (wrong row count, wrong column
    /// count, unnamed ambiguous column). Never retried.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The caller combined operations in an unsupported way (duplicate
    /// limit/offset directives, group by combined with sort on a dialect
    /// that cannot express it, unknown field names).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A value cannot be stored in its field without loss (decimal overflow,
    /// string too long, unsupported characters for the declared encoding).
    #[error("value {value} is out of range for field `{field}`: {message}")]
    ValueOutOfRange {
        field: String,
        value: String,
        message: String,
    },

    /// Two layouts that were expected to be structurally compatible are not.
    #[error("layout `{layout}` mismatch: {message}")]
    SchemaMismatch { layout: String, message: String },

    /// An operation was attempted on a storage that was already closed.
    #[error("{0} was already closed")]
    Disposed(&'static str),
}

impl DataError {
    pub fn invalid_data(message: impl Into<String>) -> crate::Error {
        DataError::InvalidData(message.into()).into()
    }

    pub fn invalid_operation(message: impl Into<String>) -> crate::Error {
        DataError::InvalidOperation(message.into()).into()
    }

    pub fn out_of_range(
        field: impl Into<String>,
        value: impl std::fmt::Debug,
        message: impl Into<String>,
    ) -> crate::Error {
        DataError::ValueOutOfRange {
            field: field.into(),
            value: format!("{:?}", value),
            message: message.into(),
        }
        .into()
    }

    pub fn schema_mismatch(layout: impl Into<String>, message: impl Into<String>) -> crate::Error {
        DataError::SchemaMismatch {
            layout: layout.into(),
            message: message.into(),
        }
        .into()
    }
}
