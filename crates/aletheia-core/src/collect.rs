//! Collecting outcomes into partitions.

use crate::aggregate::AggregateError;
use crate::error::SingleError;
use crate::outcome::{Outcome, Side};

/// Success and error values split out of one or more outcomes.
///
/// # Example
///
/// ```
/// use aletheia_core::{Outcome, Partitioned};
///
/// let parts: Partitioned<i32, &str> =
///     vec![Outcome::ok(1), Outcome::err("x"), Outcome::ok(2)].into_iter().collect();
/// assert_eq!(parts.oks, vec![1, 2]);
/// assert_eq!(parts.into_result(), Err(vec!["x"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioned<T, E> {
    /// Success values in production order.
    pub oks: Vec<T>,
    /// Error values in production order.
    pub errs: Vec<E>,
}

impl<T, E> Partitioned<T, E> {
    /// Returns `true` if no error was collected.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errs.is_empty()
    }

    /// All success values, or all errors if there was any.
    pub fn into_result(self) -> Result<Vec<T>, Vec<E>> {
        if self.errs.is_empty() {
            Ok(self.oks)
        } else {
            Err(self.errs)
        }
    }

    /// All success values, or the deduplicated aggregate of the errors.
    pub fn aggregate(self) -> Result<Vec<T>, AggregateError>
    where
        E: Into<SingleError>,
    {
        if self.errs.is_empty() {
            Ok(self.oks)
        } else {
            Err(self.errs.into_iter().collect())
        }
    }

    pub(crate) fn push_side(&mut self, side: Side<T, E>) {
        match side {
            Side::Ok(value) => self.oks.extend(value),
            Side::Err(error) => self.errs.extend(error),
        }
    }
}

impl<T, E> Default for Partitioned<T, E> {
    fn default() -> Self {
        Self {
            oks: Vec::new(),
            errs: Vec::new(),
        }
    }
}

impl<T: Send + 'static, E: Send + 'static> Extend<Outcome<T, E>> for Partitioned<T, E> {
    fn extend<I: IntoIterator<Item = Outcome<T, E>>>(&mut self, iter: I) {
        for outcome in iter {
            for side in outcome.into_sides() {
                self.push_side(side);
            }
        }
    }
}

impl<T: Send + 'static, E: Send + 'static> FromIterator<Outcome<T, E>> for Partitioned<T, E> {
    fn from_iter<I: IntoIterator<Item = Outcome<T, E>>>(iter: I) -> Self {
        let mut parts = Self::default();
        parts.extend(iter);
        parts
    }
}

impl<T: Send + 'static, E: Send + 'static> FromIterator<Result<T, E>> for Partitioned<T, E> {
    fn from_iter<I: IntoIterator<Item = Result<T, E>>>(iter: I) -> Self {
        let mut parts = Self::default();
        for result in iter {
            match result {
                Ok(value) => parts.oks.push(value),
                Err(error) => parts.errs.push(error),
            }
        }
        parts
    }
}
