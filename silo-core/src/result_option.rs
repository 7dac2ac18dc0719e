use crate::{DataError, Result};
use std::{borrow::Cow, ops::Add};

/// One result shaping directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Directive {
    SortAscending(Cow<'static, str>),
    SortDescending(Cow<'static, str>),
    Limit(u64),
    Offset(u64),
    Group(Cow<'static, str>),
}

/// An immutable, composable set of result shaping directives: sorting,
/// paging and grouping. Sets combine with `+`, preserving directive order.
///
/// Sort directives are additive (the first becomes the primary ORDER BY
/// key); limit and offset are each singular — supplying two is a usage
/// error detected when the set is rendered, not when it is built.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultOption {
    directives: Vec<Directive>,
}

impl ResultOption {
    pub fn none() -> ResultOption {
        ResultOption::default()
    }

    fn single(directive: Directive) -> ResultOption {
        ResultOption {
            directives: vec![directive],
        }
    }

    pub fn sort_ascending(field: impl Into<Cow<'static, str>>) -> ResultOption {
        Self::single(Directive::SortAscending(field.into()))
    }

    pub fn sort_descending(field: impl Into<Cow<'static, str>>) -> ResultOption {
        Self::single(Directive::SortDescending(field.into()))
    }

    pub fn limit(count: u64) -> ResultOption {
        Self::single(Directive::Limit(count))
    }

    pub fn offset(count: u64) -> ResultOption {
        Self::single(Directive::Offset(count))
    }

    pub fn group(field: impl Into<Cow<'static, str>>) -> ResultOption {
        Self::single(Directive::Group(field.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Sort keys in the order supplied, each with its own direction
    /// (`true` = ascending).
    pub fn sorts(&self) -> Vec<(&str, bool)> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                Directive::SortAscending(f) => Some((f.as_ref(), true)),
                Directive::SortDescending(f) => Some((f.as_ref(), false)),
                _ => None,
            })
            .collect()
    }

    pub fn groups(&self) -> Vec<&str> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                Directive::Group(f) => Some(f.as_ref()),
                _ => None,
            })
            .collect()
    }

    /// The limit directive, erroring when more than one was supplied.
    pub fn get_limit(&self) -> Result<Option<u64>> {
        Self::exclusive(
            "limit",
            self.directives.iter().filter_map(|d| match d {
                Directive::Limit(n) => Some(*n),
                _ => None,
            }),
        )
    }

    /// The offset directive, erroring when more than one was supplied.
    pub fn get_offset(&self) -> Result<Option<u64>> {
        Self::exclusive(
            "offset",
            self.directives.iter().filter_map(|d| match d {
                Directive::Offset(n) => Some(*n),
                _ => None,
            }),
        )
    }

    fn exclusive(kind: &str, mut values: impl Iterator<Item = u64>) -> Result<Option<u64>> {
        let first = values.next();
        if values.next().is_some() {
            return Err(DataError::invalid_operation(format!(
                "more than one {kind} directive in a result option set"
            )));
        }
        Ok(first)
    }
}

impl Add for ResultOption {
    type Output = ResultOption;
    fn add(mut self, rhs: ResultOption) -> ResultOption {
        self.directives.extend(rhs.directives);
        self
    }
}
