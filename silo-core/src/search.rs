use crate::Value;
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
    ops::{BitAnd, BitOr},
};

/// Comparison applied to a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    Equals,
    Greater,
    Smaller,
    GreaterOrEqual,
    SmallerOrEqual,
}

impl ComparisonMode {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            ComparisonMode::Equals => "=",
            ComparisonMode::Greater => ">",
            ComparisonMode::Smaller => "<",
            ComparisonMode::GreaterOrEqual => ">=",
            ComparisonMode::SmallerOrEqual => "<=",
        }
    }
}

/// Immutable tree of field comparisons combined with AND/OR, rendered by
/// the search compiler into a WHERE clause plus an ordered parameter list.
///
/// Trees compose with the `&` and `|` operators; [`Search::None`] is the
/// neutral element and matches everything.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Search {
    #[default]
    None,
    Field {
        mode: ComparisonMode,
        field: Cow<'static, str>,
        value: Value,
    },
    And(Box<Search>, Box<Search>),
    Or(Box<Search>, Box<Search>),
}

impl Search {
    fn field(
        mode: ComparisonMode,
        field: impl Into<Cow<'static, str>>,
        value: impl Into<Value>,
    ) -> Search {
        Search::Field {
            mode,
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field_equals(field: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Search {
        Self::field(ComparisonMode::Equals, field, value)
    }

    pub fn field_greater(field: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Search {
        Self::field(ComparisonMode::Greater, field, value)
    }

    pub fn field_smaller(field: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Search {
        Self::field(ComparisonMode::Smaller, field, value)
    }

    pub fn field_greater_or_equal(
        field: impl Into<Cow<'static, str>>,
        value: impl Into<Value>,
    ) -> Search {
        Self::field(ComparisonMode::GreaterOrEqual, field, value)
    }

    pub fn field_smaller_or_equal(
        field: impl Into<Cow<'static, str>>,
        value: impl Into<Value>,
    ) -> Search {
        Self::field(ComparisonMode::SmallerOrEqual, field, value)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Search::None)
    }
}

impl BitAnd for Search {
    type Output = Search;
    fn bitand(self, rhs: Search) -> Search {
        match (self, rhs) {
            (Search::None, rhs) => rhs,
            (lhs, Search::None) => lhs,
            (lhs, rhs) => Search::And(Box::new(lhs), Box::new(rhs)),
        }
    }
}

impl BitOr for Search {
    type Output = Search;
    fn bitor(self, rhs: Search) -> Search {
        match (self, rhs) {
            (Search::None, rhs) => rhs,
            (lhs, Search::None) => lhs,
            (lhs, rhs) => Search::Or(Box::new(lhs), Box::new(rhs)),
        }
    }
}

impl Display for Search {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Search::None => f.write_str("*"),
            Search::Field { mode, field, value } => {
                write!(f, "{field} {} {value:?}", mode.sql())
            }
            Search::And(l, r) => write!(f, "({l} AND {r})"),
            Search::Or(l, r) => write!(f, "({l} OR {r})"),
        }
    }
}
