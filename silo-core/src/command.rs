use crate::{Value, truncate_long};
use std::fmt::{self, Display, Formatter};

/// A parameter bound to a command. `name` is empty on positional-only
/// dialects; the vector order always matches placeholder emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParam {
    pub name: String,
    pub value: Value,
}

/// SQL text plus its bound parameters, ready for a driver to run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SqlCommand {
    pub text: String,
    pub parameters: Vec<SqlParam>,
}

impl SqlCommand {
    pub fn new(text: impl Into<String>) -> SqlCommand {
        SqlCommand {
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters(text: impl Into<String>, parameters: Vec<SqlParam>) -> SqlCommand {
        SqlCommand {
            text: text.into(),
            parameters,
        }
    }

    /// Parameter lookup by name, for named-parameter drivers.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

impl From<&str> for SqlCommand {
    fn from(text: &str) -> Self {
        SqlCommand::new(text)
    }
}

impl From<String> for SqlCommand {
    fn from(text: String) -> Self {
        SqlCommand::new(text)
    }
}

impl Display for SqlCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&truncate_long(&self.text))
    }
}
