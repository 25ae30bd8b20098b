//! The success/failure container.
//!
//! An [`Outcome`] is either `Ok` or `Err` over an [`Item`], or a
//! [`ResultStream`] of outcomes produced by [`Outcome::from_results`] or by
//! flat-mapping a sequence. Composition never panics and never turns a
//! value into an error on its own: `map` touches the Ok side only, `filter`
//! and `cast` fall back to an empty Ok, and `Err` passes through untouched.
//!
//! # Example
//!
//! ```
//! use aletheia_core::Outcome;
//!
//! let doubled: Outcome<i32, String> = Outcome::ok(21).map(|v| v * 2);
//! assert_eq!(doubled.or_else(0), 42);
//!
//! let narrowed = Outcome::<i32, String>::ok(5).cast::<String>();
//! assert!(narrowed.into_ok().is_none());
//! ```

use crate::aggregate::AggregateError;
use crate::cache::Many;
use crate::collect::Partitioned;
use crate::error::SingleError;
use crate::item::Item;
use crate::stream::ResultStream;
use std::any::Any;
use std::fmt;
use std::iter;

/// A success or failure over zero, one, or many values.
pub enum Outcome<T, E> {
    /// Success side.
    Ok(Item<T>),
    /// Failure side.
    Err(Item<E>),
    /// A lazy sequence of outcomes.
    Stream(ResultStream<T, E>),
}

/// One flattened element of an outcome: a single value on one side.
pub(crate) enum Side<T, E> {
    Ok(Option<T>),
    Err(Option<E>),
}

type Sides<T, E> = Box<dyn Iterator<Item = Side<T, E>> + Send>;

impl<T, E> Side<T, E> {
    pub(crate) fn into_outcome(self) -> Outcome<T, E> {
        match self {
            Self::Ok(value) => Outcome::Ok(Item::Single(value)),
            Self::Err(error) => Outcome::Err(Item::Single(error)),
        }
    }

    fn map<U>(self, f: &mut impl FnMut(T) -> U) -> Side<U, E> {
        match self {
            Self::Ok(value) => Side::Ok(value.map(f)),
            Self::Err(error) => Side::Err(error),
        }
    }

    fn try_map<U>(self, f: &mut impl FnMut(T) -> Option<U>) -> Side<U, E> {
        match self {
            Self::Ok(value) => Side::Ok(value.and_then(f)),
            Self::Err(error) => Side::Err(error),
        }
    }

    fn map_err<F>(self, f: &mut impl FnMut(E) -> F) -> Side<T, F> {
        match self {
            Self::Ok(value) => Side::Ok(value),
            Self::Err(error) => Side::Err(error.map(f)),
        }
    }
}

impl<T, E> Outcome<T, E> {
    /// Creates a success holding `value`.
    #[must_use]
    pub fn ok(value: T) -> Self {
        Self::Ok(Item::single(value))
    }

    /// Creates a failure holding `error`.
    #[must_use]
    pub fn err(error: E) -> Self {
        Self::Err(Item::single(error))
    }

    /// Creates a success holding nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::Ok(Item::none())
    }

    /// Returns `true` for the stream shape.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Returns `true` if a success value is present.
    ///
    /// Sequence-backed outcomes answer through the stream cache.
    pub fn is_ok(&mut self) -> bool {
        match self {
            Self::Ok(item) => item.is_present(),
            Self::Err(_) => false,
            Self::Stream(stream) => stream.has_any_ok(),
        }
    }

    /// Returns `true` if an error value is present.
    pub fn is_err(&mut self) -> bool {
        match self {
            Self::Ok(_) => false,
            Self::Err(item) => item.is_present(),
            Self::Stream(stream) => stream.has_any_err(),
        }
    }

    /// Returns `true` if neither a success nor an error value is present.
    pub fn is_empty(&mut self) -> bool {
        match self {
            Self::Ok(item) => !item.is_present(),
            Self::Err(item) => !item.is_present(),
            Self::Stream(stream) => !stream.has_any_ok() && !stream.has_any_err(),
        }
    }

    /// Borrows the first success value.
    pub fn ok_ref(&mut self) -> Option<&T> {
        match self {
            Self::Ok(item) => item.first(),
            Self::Err(_) => None,
            Self::Stream(stream) => stream.first_ok(),
        }
    }

    /// Borrows the first error value.
    pub fn err_ref(&mut self) -> Option<&E> {
        match self {
            Self::Ok(_) => None,
            Self::Err(item) => item.first(),
            Self::Stream(stream) => stream.first_err(),
        }
    }

    /// Reduces to the first success value.
    pub fn into_ok(self) -> Option<T> {
        match self {
            Self::Ok(item) => item.into_option(),
            Self::Err(_) => None,
            Self::Stream(stream) => stream.into_first_ok(),
        }
    }

    /// Reduces to the first error value.
    pub fn into_err(self) -> Option<E> {
        match self {
            Self::Ok(_) => None,
            Self::Err(item) => item.into_option(),
            Self::Stream(stream) => stream.into_first_err(),
        }
    }

    /// Returns the first success value or `default`.
    ///
    /// Sequence-backed outcomes are reduced through retrieve-first.
    pub fn or_else(self, default: T) -> T {
        self.into_ok().unwrap_or(default)
    }

    /// Returns the first success value or computes one.
    pub fn or_else_get(self, supplier: impl FnOnce() -> T) -> T {
        self.into_ok().unwrap_or_else(supplier)
    }

    /// Returns `true` for shapes backed by a lazy sequence.
    pub(crate) fn is_nested(&self) -> bool {
        matches!(self, Self::Ok(Item::Many(_)) | Self::Err(Item::Many(_)) | Self::Stream(_))
    }

    pub(crate) fn contributes_ok(&self) -> bool {
        matches!(
            self,
            Self::Ok(Item::Single(Some(_)) | Item::Many(_)) | Self::Stream(_)
        )
    }

    pub(crate) fn contributes_err(&self) -> bool {
        matches!(
            self,
            Self::Err(Item::Single(Some(_)) | Item::Many(_)) | Self::Stream(_)
        )
    }

    /// Appends every success value, materializing nested sequences.
    pub(crate) fn collect_oks<'a>(&'a mut self, out: &mut Vec<&'a T>) {
        match self {
            Self::Ok(Item::Single(value)) => out.extend(value.as_ref()),
            Self::Ok(Item::Many(many)) => out.extend(many.values()),
            Self::Stream(stream) => out.extend(stream.ok_values()),
            Self::Err(_) => {}
        }
    }

    /// Appends every error value, materializing nested sequences.
    pub(crate) fn collect_errs<'a>(&'a mut self, out: &mut Vec<&'a E>) {
        match self {
            Self::Err(Item::Single(error)) => out.extend(error.as_ref()),
            Self::Err(Item::Many(many)) => out.extend(many.values()),
            Self::Stream(stream) => out.extend(stream.err_values()),
            Self::Ok(_) => {}
        }
    }
}

impl<T: Send + 'static, E: Send + 'static> Outcome<T, E> {
    /// Creates a success over a lazy sequence.
    pub fn ok_many<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::Ok(Item::many(values))
    }

    /// Creates a failure over a lazy sequence.
    pub fn err_many<I>(errors: I) -> Self
    where
        I: IntoIterator<Item = E>,
        I::IntoIter: Send + 'static,
    {
        Self::Err(Item::many(errors))
    }

    /// Wraps a sequence of standard results.
    ///
    /// Nothing is pulled here; partitions are computed on first query.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send + 'static,
    {
        Self::Stream(ResultStream::from_results(results))
    }

    /// Wraps a sequence of outcomes, keeping nested shapes as given.
    ///
    /// Retrieve-first operations descend into nested shapes; the `is_ok` and
    /// `is_err` scans answer `false` when they reach one.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Outcome<T, E>>,
        I::IntoIter: Send + 'static,
    {
        Self::Stream(ResultStream::from_outcomes(outcomes))
    }

    /// Applies `f` to success values. Errors pass through.
    pub fn map<U: Send + 'static>(
        self,
        mut f: impl FnMut(T) -> U + Send + 'static,
    ) -> Outcome<U, E> {
        match self {
            Self::Ok(item) => Outcome::Ok(item.map(f)),
            Self::Err(error) => Outcome::Err(error),
            Self::Stream(stream) => {
                let options = stream.traversal_options();
                let sides = stream.into_sides().map(move |side| side.map(&mut f));
                Outcome::Stream(ResultStream::from_sides(sides, options))
            }
        }
    }

    /// Applies `f` to error values. Successes pass through.
    pub fn map_err<F: Send + 'static>(
        self,
        mut f: impl FnMut(E) -> F + Send + 'static,
    ) -> Outcome<T, F> {
        match self {
            Self::Ok(item) => Outcome::Ok(item),
            Self::Err(error) => Outcome::Err(error.map(f)),
            Self::Stream(stream) => {
                let options = stream.traversal_options();
                let sides = stream.into_sides().map(move |side| side.map_err(&mut f));
                Outcome::Stream(ResultStream::from_sides(sides, options))
            }
        }
    }

    /// Chains a computation that may itself fail.
    ///
    /// An empty success stays empty without calling `f`. Over a sequence,
    /// `f` runs per element and inner successes and failures are merged
    /// into one stream.
    pub fn and_then<U: Send + 'static>(
        self,
        mut f: impl FnMut(T) -> Outcome<U, E> + Send + 'static,
    ) -> Outcome<U, E> {
        match self {
            Self::Ok(Item::Single(Some(value))) => f(value),
            Self::Ok(Item::Single(None)) => Outcome::empty(),
            Self::Err(error) => Outcome::Err(error),
            Self::Ok(Item::Many(many)) => {
                let options = many.options().traversal_only();
                let sides = many.into_iter().flat_map(move |value| f(value).into_sides());
                Outcome::Stream(ResultStream::from_sides(sides, options))
            }
            Self::Stream(stream) => {
                let options = stream.traversal_options();
                let sides = stream.into_sides().flat_map(move |side| -> Sides<U, E> {
                    match side {
                        Side::Ok(Some(value)) => f(value).into_sides(),
                        Side::Ok(None) => Box::new(iter::once(Side::Ok(None))),
                        Side::Err(error) => Box::new(iter::once(Side::Err(error))),
                    }
                });
                Outcome::Stream(ResultStream::from_sides(sides, options))
            }
        }
    }

    /// Keeps success values satisfying `predicate`; anything else becomes an
    /// empty success. Errors pass through.
    pub fn filter(self, mut predicate: impl FnMut(&T) -> bool + Send + 'static) -> Self {
        match self {
            Self::Ok(item) => Self::Ok(item.filter(predicate)),
            Self::Err(error) => Self::Err(error),
            Self::Stream(stream) => {
                let options = stream.traversal_options();
                let sides = stream.into_sides().map(move |side| match side {
                    Side::Ok(value) => Side::Ok(value.filter(|v| predicate(v))),
                    Side::Err(error) => Side::Err(error),
                });
                Self::Stream(ResultStream::from_sides(sides, options))
            }
        }
    }

    /// Narrows success values to `U` at runtime.
    ///
    /// A value of another type yields an empty success; sequence elements
    /// of another type become null slots. Errors pass through.
    #[must_use]
    pub fn cast<U: Send + 'static>(self) -> Outcome<U, E> {
        self.cast_with(downcast::<T, U>)
    }

    /// Converts success values with an explicit conversion; `None` yields an
    /// empty success.
    pub fn cast_with<U: Send + 'static>(
        self,
        mut convert: impl FnMut(T) -> Option<U> + Send + 'static,
    ) -> Outcome<U, E> {
        match self {
            Self::Ok(Item::Single(value)) => Outcome::Ok(Item::Single(value.and_then(convert))),
            Self::Ok(Item::Many(many)) => Outcome::Ok(Item::Many(many.try_map(convert))),
            Self::Err(error) => Outcome::Err(error),
            Self::Stream(stream) => {
                let options = stream.traversal_options();
                let sides = stream
                    .into_sides()
                    .map(move |side| side.try_map(&mut convert));
                Outcome::Stream(ResultStream::from_sides(sides, options))
            }
        }
    }

    /// Consumes the outcome into its success and error partitions.
    pub fn into_partitioned(self) -> Partitioned<T, E> {
        let mut parts = Partitioned::default();
        for side in self.into_sides() {
            parts.push_side(side);
        }
        parts
    }

    /// Collects outcomes into one: every success value if there was no
    /// error, otherwise the aggregate of every error.
    pub fn all<I>(outcomes: I) -> Outcome<Vec<T>, AggregateError>
    where
        I: IntoIterator<Item = Outcome<T, E>>,
        E: Into<SingleError>,
    {
        let parts: Partitioned<T, E> = outcomes.into_iter().collect();
        match parts.aggregate() {
            Ok(values) => Outcome::ok(values),
            Err(errors) => Outcome::err(errors),
        }
    }

    /// Flattens into single-sided elements, lazily for sequences.
    pub(crate) fn into_sides(self) -> Sides<T, E> {
        match self {
            Self::Ok(Item::Single(value)) => Box::new(iter::once(Side::Ok(value))),
            Self::Ok(Item::Many(many)) => Box::new(many.into_iter().map(|v| Side::Ok(Some(v)))),
            Self::Err(Item::Single(error)) => Box::new(iter::once(Side::Err(error))),
            Self::Err(Item::Many(many)) => {
                Box::new(many.into_iter().map(|e| Side::Err(Some(e))))
            }
            Self::Stream(stream) => stream.into_sides(),
        }
    }
}

fn downcast<T: Any, U: Any>(value: T) -> Option<U> {
    let boxed: Box<dyn Any> = Box::new(value);
    match boxed.downcast::<U>() {
        Ok(narrowed) => Some(*narrowed),
        Err(_) => {
            tracing::trace!(
                from = std::any::type_name::<T>(),
                to = std::any::type_name::<U>(),
                "cast mismatch, yielding empty"
            );
            None
        }
    }
}

impl<T, E> Default for Outcome<T, E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(error) => Self::err(error),
        }
    }
}

impl<T, E> From<Many<T>> for Outcome<T, E> {
    fn from(many: Many<T>) -> Self {
        Self::Ok(Item::Many(many))
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Outcome<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok(item) => f.debug_tuple("Ok").field(item).finish(),
            Self::Err(item) => f.debug_tuple("Err").field(item).finish(),
            Self::Stream(stream) => f.debug_tuple("Stream").field(stream).finish(),
        }
    }
}
