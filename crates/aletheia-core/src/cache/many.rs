//! The once-traversable sequence item.

use super::{CachedAnswer, CloseSummary, Operation, StreamOptions};
use crate::item::Item;
use crate::observe;
use std::collections::BTreeMap;
use std::fmt;

type Source<T> = Box<dyn Iterator<Item = Option<T>> + Send>;
type Finalizer = Box<dyn FnOnce(&CloseSummary) + Send>;

/// Traversal state of a [`Many`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Nothing has been pulled from the source yet.
    Fresh,
    /// A prefix is buffered, the rest of the source is untouched.
    Partial,
    /// Every element is buffered.
    Materialized,
    /// The elements were handed out by an uncached drain.
    Spent,
}

/// Result of scanning a sequence with a [`Probe`] function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    Found(usize),
    Exhausted,
    Aborted(usize),
}

/// Verdict of a probe on one non-null element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    Match,
    Skip,
    Abort,
}

/// A lazy, once-traversable sequence of nullable elements.
///
/// Elements are pulled from the source only when an operation needs them and
/// are kept in a buffer afterwards. Null elements (`None` slots) are
/// preserved, so `[None, None, Some(5)]` is a three-element sequence with one
/// non-null value.
///
/// Queries that may pull take `&mut self`, in the manner of
/// [`Peekable::peek`](std::iter::Peekable::peek).
///
/// # Example
///
/// ```
/// use aletheia_core::cache::Many;
///
/// let mut many = Many::new((1..).take(100));
/// assert_eq!(many.first(), Some(&1));
/// assert_eq!(many.buffered(), 1);
/// assert!(!many.is_completely_empty());
/// assert_eq!(many.buffered(), 100);
/// ```
pub struct Many<T> {
    buffer: Vec<Option<T>>,
    source: Option<Source<T>>,
    cache: BTreeMap<Operation, CachedAnswer>,
    options: StreamOptions,
    observed: usize,
    non_null: usize,
    exhausted: bool,
    spent: bool,
    warned_unbounded: bool,
    finalizers: Vec<Finalizer>,
}

impl<T> Many<T> {
    /// Creates an already materialized sequence.
    #[must_use]
    pub fn from_vec(values: Vec<T>) -> Self {
        Self::from_slots(values.into_iter().map(Some).collect())
    }

    /// Creates an already materialized sequence with null slots.
    #[must_use]
    pub fn from_slots(slots: Vec<Option<T>>) -> Self {
        let non_null = slots.iter().filter(|slot| slot.is_some()).count();
        Self {
            observed: slots.len(),
            non_null,
            buffer: slots,
            source: None,
            cache: BTreeMap::new(),
            options: StreamOptions::default(),
            exhausted: true,
            spent: false,
            warned_unbounded: false,
            finalizers: Vec::new(),
        }
    }

    /// Creates an empty sequence.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_slots(Vec::new())
    }

    /// Applies traversal options and seeds the cache with their hints.
    #[must_use]
    pub fn with_options(mut self, options: StreamOptions) -> Self {
        for (op, answer) in options.seeds() {
            self.cache.insert(op, answer);
        }
        self.options = options;
        self
    }

    /// Registers a finalizer run when this sequence, or whatever consumes
    /// it, is dropped.
    #[must_use]
    pub fn on_close(mut self, finalizer: impl FnOnce(&CloseSummary) + Send + 'static) -> Self {
        self.add_on_close(finalizer);
        self
    }

    /// Registers a finalizer in place.
    pub fn add_on_close(&mut self, finalizer: impl FnOnce(&CloseSummary) + Send + 'static) {
        self.finalizers.push(Box::new(finalizer));
    }

    /// Returns the traversal options.
    #[must_use]
    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Returns the current traversal state.
    #[must_use]
    pub fn traversal(&self) -> Traversal {
        if self.spent {
            Traversal::Spent
        } else if self.source.is_none() {
            Traversal::Materialized
        } else if self.observed == 0 {
            Traversal::Fresh
        } else {
            Traversal::Partial
        }
    }

    /// Number of elements currently held in the buffer.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of elements pulled or supplied so far.
    #[must_use]
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Returns the cached answer for an operation without evaluating it.
    #[must_use]
    pub fn cached(&self, op: Operation) -> Option<&CachedAnswer> {
        self.cache.get(&op)
    }

    /// Forgets every cached answer. Buffered elements are kept.
    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }

    /// Returns `true` if at least one element is non-null.
    ///
    /// Stops pulling at the first non-null element and caches the answer.
    /// Never returns on an infinite source holding only nulls.
    pub fn has_any_non_null(&mut self) -> bool {
        let op = Operation::HasAnyNonNull;
        if let Some(flag) = self.cached_flag(op) {
            return flag;
        }
        let found = self.non_null > 0 || matches!(self.scan(|_| Probe::Match), Scan::Found(_));
        self.store(op, CachedAnswer::Flag(found));
        found
    }

    /// Returns `true` if the sequence holds no element at all, null or not.
    ///
    /// Observes the whole sequence, so on an infinite source it only returns
    /// when the options carry a non-zero `max_size`.
    pub fn is_completely_empty(&mut self) -> bool {
        let op = Operation::IsCompletelyEmpty;
        if let Some(flag) = self.cached_flag(op) {
            return flag;
        }
        self.pull_all();
        let empty = self.observed == 0;
        self.store(op, CachedAnswer::Flag(empty));
        empty
    }

    /// Returns the first non-null element, caching its position.
    pub fn first(&mut self) -> Option<&T> {
        let pos = self.first_position();
        pos.and_then(|idx| self.buffer.get(idx)).and_then(Option::as_ref)
    }

    /// Materializes the whole sequence and returns every slot.
    ///
    /// Bounded by `max_size` on infinite sources.
    pub fn retrieve_all(&mut self) -> &[Option<T>] {
        let op = Operation::RetrieveAll;
        if self.cached_positions(op).is_none() {
            self.pull_all();
            let positions = self
                .buffer
                .iter()
                .enumerate()
                .filter_map(|(idx, slot)| slot.as_ref().map(|_| idx))
                .collect();
            self.store(op, CachedAnswer::Positions(positions));
        }
        &self.buffer
    }

    /// Materializes the sequence and iterates its non-null values.
    pub fn values(&mut self) -> impl Iterator<Item = &T> + '_ {
        self.retrieve_all().iter().flatten()
    }

    /// Pulls until `limit` elements are buffered and returns them.
    ///
    /// This is the bounded operation for infinite sources. A zero limit
    /// means unbounded and is logged, since the buffer grows without end.
    pub fn bounded(&mut self, limit: usize) -> &[Option<T>] {
        if limit == 0 {
            tracing::warn!(
                operation = %Operation::Bounded,
                "bounded traversal without a limit, buffer memory is unbounded"
            );
            while self.pull() {}
            return &self.buffer;
        }
        while self.buffer.len() < limit && self.pull() {}
        let end = limit.min(self.buffer.len());
        &self.buffer[..end]
    }

    /// Hands out every non-null element without caching.
    ///
    /// The sequence is spent afterwards: a second drain returns an empty
    /// vector. Positional answers are invalidated, predicate answers stay.
    pub fn drain(&mut self) -> Vec<T> {
        self.pull_all();
        self.source = None;
        self.spent = true;
        self.cache.retain(|_, answer| !answer.is_positional());
        tracing::trace!(
            operation = %Operation::Drain,
            observed = self.observed,
            "stream drained"
        );
        self.buffer.drain(..).flatten().collect()
    }

    /// Consumes the sequence and returns its first non-null element.
    pub fn into_first(mut self) -> Option<T> {
        let pos = self.first_position();
        pos.and_then(|idx| self.buffer.get_mut(idx)).and_then(Option::take)
    }

    pub(crate) fn first_position(&mut self) -> Option<usize> {
        let op = Operation::RetrieveFirst;
        if let Some(pos) = self.cached_position(op) {
            return pos;
        }
        let pos = match self.scan(|_| Probe::Match) {
            Scan::Found(idx) => Some(idx),
            Scan::Exhausted | Scan::Aborted(_) => None,
        };
        self.store(op, CachedAnswer::Position(pos));
        if pos.is_some() {
            self.cache
                .entry(Operation::HasAnyNonNull)
                .or_insert(CachedAnswer::Flag(true));
        }
        pos
    }

    /// Walks the buffer, then the source, probing each non-null element.
    ///
    /// Probes get mutable access so nested sequences can be pulled.
    pub(crate) fn scan(&mut self, mut probe: impl FnMut(&mut T) -> Probe) -> Scan {
        let mut idx = 0;
        loop {
            if idx == self.buffer.len() && !self.pull() {
                return Scan::Exhausted;
            }
            if let Some(value) = &mut self.buffer[idx] {
                match probe(value) {
                    Probe::Match => return Scan::Found(idx),
                    Probe::Abort => return Scan::Aborted(idx),
                    Probe::Skip => {}
                }
            }
            idx += 1;
        }
    }

    /// Pulls every element, or up to the `All` bound on infinite sources.
    pub(crate) fn pull_all(&mut self) {
        if let Some(bound) = self.options.all_bound() {
            while self.buffer.len() < bound && self.pull() {}
            return;
        }
        if self.options.infinite && !self.warned_unbounded && self.source.is_some() {
            tracing::warn!(
                observed = self.observed,
                "infinite stream has no max size, full traversal may never return"
            );
            self.warned_unbounded = true;
        }
        while self.pull() {}
    }

    pub(crate) fn slots(&self) -> &[Option<T>] {
        &self.buffer
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<T>] {
        &mut self.buffer
    }

    pub(crate) fn cached_flag(&self, op: Operation) -> Option<bool> {
        let flag = self.cache.get(&op).and_then(CachedAnswer::as_flag);
        observe::cache_lookup(op, flag.is_some());
        flag
    }

    pub(crate) fn cached_position(&self, op: Operation) -> Option<Option<usize>> {
        let pos = match self.cache.get(&op) {
            Some(CachedAnswer::Position(pos)) => Some(*pos),
            _ => None,
        };
        observe::cache_lookup(op, pos.is_some());
        pos
    }

    pub(crate) fn cached_positions(&self, op: Operation) -> Option<Vec<usize>> {
        let positions = match self.cache.get(&op) {
            Some(CachedAnswer::Positions(positions)) => Some(positions.clone()),
            _ => None,
        };
        observe::cache_lookup(op, positions.is_some());
        positions
    }

    pub(crate) fn store(&mut self, op: Operation, answer: CachedAnswer) {
        if op.is_persistent() {
            self.cache.insert(op, answer);
        }
    }

    fn pull(&mut self) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        if let Some(slot) = source.next() {
            self.observed += 1;
            if slot.is_some() {
                self.non_null += 1;
            }
            self.buffer.push(slot);
            observe::element_pulled();
            true
        } else {
            self.source = None;
            self.exhausted = true;
            tracing::trace!(observed = self.observed, "stream source exhausted");
            false
        }
    }

    fn summary(&self) -> CloseSummary {
        let mut summary = CloseSummary {
            observed: self.observed,
            non_null: self.non_null,
            exhausted: self.exhausted,
            answers: self.cache.clone(),
        };
        summary.finalize();
        summary
    }
}

impl<T: Send + 'static> Many<T> {
    /// Wraps a lazy source of values.
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_nullable(values.into_iter().map(Some))
    }

    /// Wraps a lazy source whose elements may be null.
    pub fn from_nullable<I>(slots: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
        I::IntoIter: Send + 'static,
    {
        Self::assemble(
            Box::new(slots.into_iter()),
            StreamOptions::default(),
            BTreeMap::new(),
            Vec::new(),
        )
    }

    /// Lazily applies `f` to each non-null element.
    ///
    /// Null slots stay null, so existence answers already cached carry over.
    pub fn map<U, F>(mut self, mut f: F) -> Many<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        let carried: BTreeMap<_, _> = if self.spent {
            BTreeMap::new()
        } else {
            self.cache
                .iter()
                .filter(|(op, _)| {
                    matches!(op, Operation::HasAnyNonNull | Operation::IsCompletelyEmpty)
                })
                .map(|(op, answer)| (*op, answer.clone()))
                .collect()
        };
        let options = self.options.clone();
        let finalizers = std::mem::take(&mut self.finalizers);
        let slots = self.take_slots().map(move |slot| slot.map(&mut f));
        Many::assemble(Box::new(slots), options, carried, finalizers)
    }

    /// Lazily drops non-null elements failing `predicate`.
    pub fn filter<P>(mut self, mut predicate: P) -> Many<T>
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        let options = self.options.traversal_only();
        let finalizers = std::mem::take(&mut self.finalizers);
        let slots = self
            .take_slots()
            .filter(move |slot| slot.as_ref().map_or(true, &mut predicate));
        Many::assemble(Box::new(slots), options, BTreeMap::new(), finalizers)
    }

    /// Lazily maps each element to an item and concatenates the results in
    /// production order.
    ///
    /// Null slots stay null; an empty single contributes nothing.
    pub fn flat_map<U, F>(mut self, mut f: F) -> Many<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Item<U> + Send + 'static,
    {
        let options = self.options.traversal_only();
        let finalizers = std::mem::take(&mut self.finalizers);
        let slots = self
            .take_slots()
            .flat_map(move |slot| -> Source<U> {
                match slot.map(&mut f) {
                    None => Box::new(std::iter::once(None)),
                    Some(Item::Single(value)) => Box::new(value.into_iter().map(Some)),
                    Some(Item::Many(many)) => Box::new(many.into_iter().map(Some)),
                }
            });
        Many::assemble(Box::new(slots), options, BTreeMap::new(), finalizers)
    }

    /// Lazily converts each non-null element; failed conversions become
    /// null slots, so positions are preserved.
    pub fn try_map<U, F>(mut self, mut f: F) -> Many<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Option<U> + Send + 'static,
    {
        let options = self.options.traversal_only();
        let finalizers = std::mem::take(&mut self.finalizers);
        let slots = self.take_slots().map(move |slot| slot.and_then(&mut f));
        Many::assemble(Box::new(slots), options, BTreeMap::new(), finalizers)
    }

    fn assemble(
        slots: Source<T>,
        options: StreamOptions,
        cache: BTreeMap<Operation, CachedAnswer>,
        finalizers: Vec<Finalizer>,
    ) -> Self {
        Self {
            buffer: Vec::new(),
            source: Some(slots),
            cache,
            options,
            observed: 0,
            non_null: 0,
            exhausted: false,
            spent: false,
            warned_unbounded: false,
            finalizers,
        }
    }

    /// Buffered prefix chained with the untouched remainder of the source.
    fn take_slots(&mut self) -> Source<T> {
        let buffer = std::mem::take(&mut self.buffer);
        let source = self.source.take();
        Box::new(buffer.into_iter().chain(source.into_iter().flatten()))
    }
}

impl StreamOptions {
    /// Keeps the traversal bound, drops hints that a transformation may
    /// invalidate.
    pub(crate) fn traversal_only(&self) -> Self {
        Self {
            infinite: self.infinite,
            max_size: self.max_size,
            ..Self::default()
        }
    }
}

impl<T> Default for Many<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> FromIterator<T> for Many<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T> From<Vec<T>> for Many<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_vec(values)
    }
}

impl<T: fmt::Debug> fmt::Debug for Many<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Many")
            .field("traversal", &self.traversal())
            .field("buffer", &self.buffer)
            .field("cache", &self.cache)
            .field("finalizers", &self.finalizers.len())
            .finish_non_exhaustive()
    }
}

impl<T> Drop for Many<T> {
    fn drop(&mut self) {
        if self.finalizers.is_empty() {
            return;
        }
        let summary = self.summary();
        for finalizer in self.finalizers.drain(..) {
            finalizer(&summary);
        }
    }
}

impl<T: Send + 'static> IntoIterator for Many<T> {
    type Item = T;
    type IntoIter = ManyIntoIter<T>;

    fn into_iter(mut self) -> ManyIntoIter<T> {
        let summary = CloseSummary {
            observed: self.observed,
            non_null: self.non_null,
            exhausted: self.exhausted,
            answers: self.cache.clone(),
        };
        let replay = self.buffer.len();
        let finalizers = std::mem::take(&mut self.finalizers);
        ManyIntoIter {
            slots: self.take_slots(),
            replay,
            summary,
            finalizers,
        }
    }
}

/// Owning iterator over the non-null elements of a [`Many`].
///
/// Finalizers registered on the sequence run when this iterator is dropped.
pub struct ManyIntoIter<T> {
    slots: Source<T>,
    replay: usize,
    summary: CloseSummary,
    finalizers: Vec<Finalizer>,
}

impl<T> Iterator for ManyIntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            let Some(slot) = self.slots.next() else {
                self.summary.exhausted = true;
                return None;
            };
            // Buffered slots were counted when they were first pulled.
            if self.replay > 0 {
                self.replay -= 1;
            } else {
                self.summary.observed += 1;
                self.summary.non_null += usize::from(slot.is_some());
            }
            if slot.is_some() {
                return slot;
            }
        }
    }
}

impl<T> fmt::Debug for ManyIntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManyIntoIter")
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl<T> Drop for ManyIntoIter<T> {
    fn drop(&mut self) {
        if self.finalizers.is_empty() {
            return;
        }
        let mut summary = std::mem::take(&mut self.summary);
        summary.finalize();
        for finalizer in self.finalizers.drain(..) {
            finalizer(&summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::CountingSource;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_has_any_non_null_short_circuits() {
        let source = CountingSource::new(vec![None, None, Some(5), Some(1_000)]);
        let pulls = source.counter();
        let mut many = Many::from_nullable(source);

        assert!(many.has_any_non_null());
        assert_eq!(pulls.get(), 3);

        assert!(many.has_any_non_null());
        assert_eq!(pulls.get(), 3);
        assert_eq!(
            many.cached(Operation::HasAnyNonNull),
            Some(&CachedAnswer::Flag(true))
        );
    }

    #[test]
    fn test_has_any_non_null_all_nulls() {
        let mut many: Many<i32> = Many::from_nullable(vec![None, None]);
        assert!(!many.has_any_non_null());
        assert_eq!(many.traversal(), Traversal::Materialized);
    }

    #[test]
    fn test_is_completely_empty_idempotent() {
        let mut empty: Many<i32> = Many::new(Vec::new());
        assert!(empty.is_completely_empty());
        assert!(empty.is_completely_empty());

        let mut nulls: Many<i32> = Many::from_nullable(vec![None]);
        assert!(!nulls.is_completely_empty());
        assert!(!nulls.is_completely_empty());
    }

    #[test]
    fn test_is_completely_empty_drains_whole_source() {
        let source = CountingSource::new(vec![Some(1), Some(2), Some(3)]);
        let pulls = source.counter();
        let mut many = Many::from_nullable(source);

        assert!(!many.is_completely_empty());
        assert_eq!(pulls.get(), 3);
        assert_eq!(many.traversal(), Traversal::Materialized);
    }

    #[test]
    fn test_first_is_cached() {
        let source = CountingSource::new(vec![None, Some("a"), Some("b")]);
        let pulls = source.counter();
        let mut many = Many::from_nullable(source);

        assert_eq!(many.first(), Some(&"a"));
        assert_eq!(many.first(), Some(&"a"));
        assert_eq!(pulls.get(), 2);
        assert_eq!(
            many.cached(Operation::RetrieveFirst),
            Some(&CachedAnswer::Position(Some(1)))
        );
        assert_eq!(many.traversal(), Traversal::Partial);
    }

    #[test]
    fn test_swap_keeps_pulled_prefix() {
        let mut many = Many::new(vec![1, 2, 3, 4]);
        assert_eq!(many.first(), Some(&1));
        let all: Vec<_> = many.values().copied().collect();
        assert_eq!(all, vec![1, 2, 3, 4]);
        assert_eq!(many.first(), Some(&1));
    }

    #[test]
    fn test_drain_is_uncached() {
        let mut many = Many::new(vec![1, 2, 3]);
        assert_eq!(many.first(), Some(&1));
        assert_eq!(many.drain(), vec![1, 2, 3]);
        assert!(many.drain().is_empty());
        assert_eq!(many.traversal(), Traversal::Spent);
        assert!(many.cached(Operation::RetrieveFirst).is_none());
        assert_eq!(many.first(), None);
        assert!(many.has_any_non_null());
        assert!(!many.is_completely_empty());
    }

    #[test]
    fn test_map_is_lazy() {
        let source = CountingSource::new(vec![Some(1), None, Some(3)]);
        let pulls = source.counter();
        let mut mapped = Many::from_nullable(source).map(|v| v * 10);
        assert_eq!(pulls.get(), 0);

        assert_eq!(mapped.first(), Some(&10));
        assert_eq!(pulls.get(), 1);
        assert_eq!(mapped.retrieve_all(), &[Some(10), None, Some(30)]);
    }

    #[test]
    fn test_map_carries_existence_answers() {
        let mut many = Many::new(vec![1, 2]);
        assert!(many.has_any_non_null());
        let mapped = many.map(|v| v + 1);
        assert_eq!(
            mapped.cached(Operation::HasAnyNonNull),
            Some(&CachedAnswer::Flag(true))
        );
    }

    #[test]
    fn test_filter_drops_failing_elements() {
        let mut evens = Many::new(1..=6).filter(|v| v % 2 == 0);
        assert_eq!(evens.values().copied().collect::<Vec<_>>(), vec![2, 4, 6]);
    }

    #[test]
    fn test_flat_map_concatenates_in_order() {
        let mut many = Many::new(vec![1, 2, 3]).flat_map(|v| {
            if v == 2 {
                Item::none()
            } else {
                Item::many(vec![v, v * 100])
            }
        });
        assert_eq!(
            many.values().copied().collect::<Vec<_>>(),
            vec![1, 100, 3, 300]
        );
    }

    #[test]
    fn test_try_map_keeps_positions() {
        let mut parsed = Many::new(vec!["1", "x", "3"]).try_map(|s| s.parse::<i32>().ok());
        assert_eq!(parsed.retrieve_all(), &[Some(1), None, Some(3)]);
    }

    #[test]
    fn test_bounded_on_infinite_source() {
        let mut naturals = Many::new(0..);
        assert_eq!(naturals.bounded(3), &[Some(0), Some(1), Some(2)]);
        assert_eq!(naturals.bounded(2), &[Some(0), Some(1)]);
        assert_eq!(naturals.buffered(), 3);
    }

    #[test]
    fn test_infinite_options_bound_all_operations() {
        let mut naturals = Many::new(0_u64..).with_options(StreamOptions::infinite(10));
        assert!(!naturals.is_completely_empty());
        assert_eq!(naturals.retrieve_all().len(), 10);
        assert_eq!(naturals.traversal(), Traversal::Partial);
    }

    #[test]
    fn test_hints_skip_traversal() {
        let source = CountingSource::new(vec![Some(1)]);
        let pulls = source.counter();
        let mut many =
            Many::from_nullable(source).with_options(StreamOptions::default().with_known_empty());
        assert!(many.is_completely_empty());
        assert!(!many.has_any_non_null());
        assert_eq!(pulls.get(), 0);
    }

    #[test]
    fn test_reset_cache_keeps_buffer() {
        let mut many = Many::new(vec![7]);
        assert!(many.has_any_non_null());
        many.reset_cache();
        assert!(many.cached(Operation::HasAnyNonNull).is_none());
        assert_eq!(many.buffered(), 1);
        assert!(many.has_any_non_null());
    }

    #[test]
    fn test_on_close_runs_on_drop() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let mut many = Many::new(vec![1, 2]).on_close(move |summary| {
            *sink.lock() = Some(summary.clone());
        });
        assert!(!many.is_completely_empty());
        drop(many);

        let summary = seen.lock().clone().unwrap();
        assert_eq!(summary.observed, 2);
        assert!(summary.exhausted);
        assert_eq!(summary.flag(Operation::HasAnyNonNull), Some(true));
        assert_eq!(summary.flag(Operation::IsCompletelyEmpty), Some(false));
    }

    #[test]
    fn test_on_close_travels_through_combinators() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let many = Many::new(vec![1, 2, 3])
            .on_close(move |_| *counter.lock() += 1)
            .map(|v| v * 2)
            .filter(|v| *v > 2);

        let collected: Vec<_> = many.into_iter().collect();
        assert_eq!(collected, vec![4, 6]);
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn test_into_iter_summary_counts_remaining() {
        let seen = Arc::new(Mutex::new(CloseSummary::default()));
        let sink = Arc::clone(&seen);
        let mut many = Many::from_nullable(vec![Some(1), None, Some(3)])
            .on_close(move |summary| *sink.lock() = summary.clone());
        assert_eq!(many.first(), Some(&1));

        assert_eq!(many.into_iter().count(), 2);
        let summary = seen.lock();
        assert_eq!(summary.observed, 3);
        assert_eq!(summary.non_null, 2);
        assert!(summary.exhausted);
    }

    #[test]
    fn test_into_first() {
        let many = Many::from_nullable(vec![None, Some(String::from("x"))]);
        assert_eq!(many.into_first(), Some(String::from("x")));
        assert_eq!(Many::<i32>::empty().into_first(), None);
    }

    #[test]
    fn test_many_is_drained_on_another_thread() {
        let closed = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&closed);
        let mut many = Many::new((1..).take(4)).on_close(move |_| *flag.lock() = true);
        assert_eq!(many.first(), Some(&1));

        let total = std::thread::spawn(move || many.into_iter().sum::<i32>())
            .join()
            .unwrap();
        assert_eq!(total, 10);
        assert!(*closed.lock());
    }
}
