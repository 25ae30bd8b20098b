//! Aggregated errors.
//!
//! An [`AggregateError`] is a deduplicated set of [`SingleError`]s exposed
//! through the same [`ErrorContract`] as a single error. Adding an aggregate
//! to an aggregate merges the members, so nesting never occurs.

use crate::error::{ErrorContract, SingleError};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between member messages in [`AggregateError::message`].
pub const MESSAGE_SEPARATOR: &str = ", ";

/// A deduplicated set of errors.
///
/// Members keep insertion order, which makes the joined message
/// deterministic.
///
/// # Example
///
/// ```
/// use aletheia_core::{AggregateError, ErrorContract, SingleError};
///
/// let mut agg = AggregateError::of(["a", "a", "b"]);
/// assert_eq!(agg.len(), 2);
///
/// agg.add_aggregate(AggregateError::of(["b", "c"]));
/// assert_eq!(agg.message(), "a, b, c");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateError {
    errors: IndexSet<SingleError>,
}

impl AggregateError {
    /// Creates an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an aggregate from anything convertible into single errors.
    pub fn of<I>(members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SingleError>,
    {
        members.into_iter().map(Into::into).collect()
    }

    /// Inserts an error. Returns `false` if an equal error was present.
    pub fn add_error(&mut self, error: impl Into<SingleError>) -> bool {
        self.errors.insert(error.into())
    }

    /// Merges every member of `other` into this aggregate.
    pub fn add_aggregate(&mut self, other: AggregateError) {
        self.errors.extend(other.errors);
    }

    /// Number of distinct members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `true` if an equal error is a member.
    #[must_use]
    pub fn contains(&self, error: &SingleError) -> bool {
        self.errors.contains(error)
    }

    /// Iterates the members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SingleError> {
        self.errors.iter()
    }

    /// Distinct member messages in insertion order.
    ///
    /// Two members differing only by cause share one message here.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        let distinct: IndexSet<&str> = self.errors.iter().map(SingleError::text).collect();
        distinct.into_iter().collect()
    }
}

impl ErrorContract for AggregateError {
    fn message(&self) -> String {
        self.messages().join(MESSAGE_SEPARATOR)
    }

    /// Non-empty, and the joined message holds more than blanks and
    /// separators.
    fn is_error(&self) -> bool {
        !self.errors.is_empty()
            && self
                .messages()
                .iter()
                .any(|message| !message.trim().is_empty())
    }

    fn pretty_print(&self) -> String {
        let members: Vec<String> = self.errors.iter().map(ErrorContract::pretty_print).collect();
        format!("Aggregate Error:\n{}", members.join("\n"))
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for AggregateError {}

impl From<SingleError> for AggregateError {
    fn from(error: SingleError) -> Self {
        let mut errors = IndexSet::new();
        errors.insert(error);
        Self { errors }
    }
}

impl<E: Into<SingleError>> FromIterator<E> for AggregateError {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<E: Into<SingleError>> Extend<E> for AggregateError {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.errors.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for AggregateError {
    type Item = SingleError;
    type IntoIter = indexmap::set::IntoIter<SingleError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a AggregateError {
    type Item = &'a SingleError;
    type IntoIter = indexmap::set::Iter<'a, SingleError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
