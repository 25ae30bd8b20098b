//! Sequences of outcomes with lazily computed partitions.
//!
//! A [`ResultStream`] is what [`Outcome::from_results`] produces: a lazy
//! [`Many`] whose elements are themselves outcomes. The Ok and Err sides of
//! the whole are answered through persistent stream cache operations, so
//! querying them in any order, any number of times, is consistent.

use crate::cache::{CachedAnswer, Many, Operation, Probe, Scan, StreamOptions};
use crate::collect::Partitioned;
use crate::item::Item;
use crate::outcome::{Outcome, Side};
use std::fmt;

/// A lazy sequence of outcomes.
///
/// # Example
///
/// ```
/// use aletheia_core::{Outcome, ResultStream};
///
/// let mut stream: ResultStream<i32, String> =
///     ResultStream::from_results(vec![Ok(1), Err("x".to_string()), Ok(2)]);
///
/// assert_eq!(stream.err_values(), vec!["x"]);
/// assert_eq!(stream.ok_values(), vec![&1, &2]);
/// ```
pub struct ResultStream<T, E> {
    inner: Many<Outcome<T, E>>,
}

impl<T, E> ResultStream<T, E> {
    /// Wraps an existing sequence of outcomes.
    #[must_use]
    pub fn from_many(inner: Many<Outcome<T, E>>) -> Self {
        Self { inner }
    }

    /// Applies traversal options and seeds the cache with their hints.
    #[must_use]
    pub fn with_options(self, options: StreamOptions) -> Self {
        Self {
            inner: self.inner.with_options(options),
        }
    }

    /// Borrows the underlying sequence, e.g. to inspect cached answers.
    #[must_use]
    pub fn as_many(&self) -> &Many<Outcome<T, E>> {
        &self.inner
    }

    /// Mutably borrows the underlying sequence.
    pub fn as_many_mut(&mut self) -> &mut Many<Outcome<T, E>> {
        &mut self.inner
    }

    /// Unwraps the underlying sequence.
    #[must_use]
    pub fn into_many(self) -> Many<Outcome<T, E>> {
        self.inner
    }

    /// Returns `true` if any element holds a present `Ok` value.
    ///
    /// Returns `false` without caching when the scan reaches an element that
    /// is itself sequence-backed, since such an element cannot be replayed
    /// from a cache entry. [`ResultStream::first_ok`] has no such limitation.
    pub fn has_any_ok(&mut self) -> bool {
        self.has_any(Operation::HasAnyOk, probe_ok)
    }

    /// Returns `true` if any element holds a present `Err` value.
    ///
    /// Same nested-sequence limitation as [`ResultStream::has_any_ok`].
    pub fn has_any_err(&mut self) -> bool {
        self.has_any(Operation::HasAnyErr, probe_err)
    }

    /// Returns the first present `Ok` value, caching its position.
    ///
    /// A nested element counts when its own first `Ok` value is present, and
    /// that value is returned. The nested element keeps its own cache, so the
    /// cached position stays valid.
    pub fn first_ok(&mut self) -> Option<&T> {
        let pos = self.first_position(Operation::RetrieveFirstOk, first_ok_probe)?;
        self.inner.slots_mut().get_mut(pos)?.as_mut()?.ok_ref()
    }

    /// Returns the first present `Err` value, caching its position.
    pub fn first_err(&mut self) -> Option<&E> {
        let pos = self.first_position(Operation::RetrieveFirstErr, first_err_probe)?;
        self.inner.slots_mut().get_mut(pos)?.as_mut()?.err_ref()
    }

    /// Materializes the sequence and returns the `Ok` partition.
    ///
    /// Nested sequences are materialized and flattened in place.
    pub fn ok_values(&mut self) -> Vec<&T> {
        let positions = self.partition(Operation::RetrieveAllOk, Outcome::contributes_ok);
        let mut values = Vec::new();
        for (idx, slot) in self.inner.slots_mut().iter_mut().enumerate() {
            if let (Ok(_), Some(outcome)) = (positions.binary_search(&idx), slot.as_mut()) {
                outcome.collect_oks(&mut values);
            }
        }
        values
    }

    /// Materializes the sequence and returns the `Err` partition.
    pub fn err_values(&mut self) -> Vec<&E> {
        let positions = self.partition(Operation::RetrieveAllErr, Outcome::contributes_err);
        let mut values = Vec::new();
        for (idx, slot) in self.inner.slots_mut().iter_mut().enumerate() {
            if let (Ok(_), Some(outcome)) = (positions.binary_search(&idx), slot.as_mut()) {
                outcome.collect_errs(&mut values);
            }
        }
        values
    }

    /// Consumes the stream and returns its first present `Ok` value.
    pub fn into_first_ok(mut self) -> Option<T> {
        let pos = self.first_position(Operation::RetrieveFirstOk, first_ok_probe)?;
        self.inner
            .slots_mut()
            .get_mut(pos)
            .and_then(Option::take)
            .and_then(Outcome::into_ok)
    }

    /// Consumes the stream and returns its first present `Err` value.
    pub fn into_first_err(mut self) -> Option<E> {
        let pos = self.first_position(Operation::RetrieveFirstErr, first_err_probe)?;
        self.inner
            .slots_mut()
            .get_mut(pos)
            .and_then(Option::take)
            .and_then(Outcome::into_err)
    }

    fn has_any(&mut self, op: Operation, probe: fn(&Outcome<T, E>) -> Probe) -> bool {
        if let Some(flag) = self.inner.cached_flag(op) {
            return flag;
        }
        match self.inner.scan(|outcome| probe(outcome)) {
            Scan::Found(_) => {
                self.inner.store(op, CachedAnswer::Flag(true));
                true
            }
            Scan::Exhausted => {
                self.inner.store(op, CachedAnswer::Flag(false));
                false
            }
            Scan::Aborted(position) => {
                tracing::warn!(
                    operation = %op,
                    position,
                    "nested sequence reached during scan, answering false without caching"
                );
                false
            }
        }
    }

    fn first_position(
        &mut self,
        op: Operation,
        probe: fn(&mut Outcome<T, E>) -> Probe,
    ) -> Option<usize> {
        if let Some(pos) = self.inner.cached_position(op) {
            return pos;
        }
        let flag_op = if op == Operation::RetrieveFirstOk {
            Operation::HasAnyOk
        } else {
            Operation::HasAnyErr
        };
        match self.inner.scan(probe) {
            Scan::Found(pos) => {
                self.inner.store(op, CachedAnswer::Position(Some(pos)));
                // has-any keeps answering false for nested elements
                let nested = self
                    .inner
                    .slots()
                    .get(pos)
                    .and_then(Option::as_ref)
                    .is_some_and(Outcome::is_nested);
                if !nested {
                    self.inner.store(flag_op, CachedAnswer::Flag(true));
                }
                Some(pos)
            }
            Scan::Exhausted => {
                self.inner.store(op, CachedAnswer::Position(None));
                None
            }
            Scan::Aborted(_) => None,
        }
    }

    fn partition(&mut self, op: Operation, contributes: fn(&Outcome<T, E>) -> bool) -> Vec<usize> {
        if let Some(positions) = self.inner.cached_positions(op) {
            return positions;
        }
        self.inner.pull_all();
        let positions: Vec<usize> = self
            .inner
            .slots()
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().filter(|o| contributes(o)).map(|_| idx))
            .collect();
        self.inner
            .store(op, CachedAnswer::Positions(positions.clone()));
        positions
    }
}

impl<T: Send + 'static, E: Send + 'static> ResultStream<T, E> {
    /// Builds a stream from standard results.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send + 'static,
    {
        Self::from_many(Many::new(results.into_iter().map(Outcome::from)))
    }

    /// Builds a stream from outcomes, kept as given.
    ///
    /// Elements that are themselves sequence-backed are kept nested; the
    /// `has_any_*` scans answer `false` when they reach one.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Outcome<T, E>>,
        I::IntoIter: Send + 'static,
    {
        Self::from_many(Many::new(outcomes))
    }

    pub(crate) fn from_sides<I>(sides: I, options: StreamOptions) -> Self
    where
        I: Iterator<Item = Side<T, E>> + Send + 'static,
    {
        Self::from_many(Many::new(sides.map(Side::into_outcome)).with_options(options))
    }

    /// Flattens every element into single-sided values, lazily.
    pub(crate) fn into_sides(self) -> Box<dyn Iterator<Item = Side<T, E>> + Send> {
        Box::new(self.inner.into_iter().flat_map(Outcome::into_sides))
    }

    /// Consumes the stream into its `Ok` and `Err` partitions.
    pub fn into_partitioned(self) -> Partitioned<T, E> {
        let mut parts = Partitioned::default();
        for side in self.into_sides() {
            parts.push_side(side);
        }
        parts
    }

    pub(crate) fn traversal_options(&self) -> StreamOptions {
        self.inner.options().traversal_only()
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for ResultStream<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResultStream").field(&self.inner).finish()
    }
}

fn probe_ok<T, E>(outcome: &Outcome<T, E>) -> Probe {
    match outcome {
        Outcome::Ok(Item::Single(Some(_))) => Probe::Match,
        Outcome::Ok(Item::Many(_)) | Outcome::Stream(_) => Probe::Abort,
        Outcome::Ok(Item::Single(None)) | Outcome::Err(_) => Probe::Skip,
    }
}

fn probe_err<T, E>(outcome: &Outcome<T, E>) -> Probe {
    match outcome {
        Outcome::Err(Item::Single(Some(_))) => Probe::Match,
        Outcome::Err(Item::Many(_)) | Outcome::Stream(_) => Probe::Abort,
        Outcome::Err(Item::Single(None)) | Outcome::Ok(_) => Probe::Skip,
    }
}

fn first_ok_probe<T, E>(outcome: &mut Outcome<T, E>) -> Probe {
    if outcome.ok_ref().is_some() {
        Probe::Match
    } else {
        Probe::Skip
    }
}

fn first_err_probe<T, E>(outcome: &mut Outcome<T, E>) -> Probe {
    if outcome.err_ref().is_some() {
        Probe::Match
    } else {
        Probe::Skip
    }
}
