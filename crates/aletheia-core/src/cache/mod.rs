//! Stream cache: operation taxonomy and materialization for [`Many`] items.
//!
//! A [`Many`] wraps an iterator that can be pulled at most once. Every query
//! against it is an [`Operation`] classified along two axes:
//!
//! - [`Reach`]: `Any` operations stop at the first match, `All` operations
//!   must observe the whole sequence.
//! - [`Termination`]: `Finite` operations end by themselves, `Infinite`
//!   operations need a caller-supplied bound, `OnClose` operations run as
//!   finalizers when the owning value is dropped.
//!
//! Persistent operations write their answer into the item's cache the first
//! time they run. Elements pulled while answering are kept in a buffer, so a
//! later query reads the buffer first and only then continues the untouched
//! remainder of the source.
//!
//! # Example
//!
//! ```
//! use aletheia_core::cache::{Many, Operation};
//!
//! let mut many = Many::new(vec![1, 2, 3]);
//! assert!(many.has_any_non_null());
//! assert_eq!(many.first(), Some(&1));
//! assert!(many.cached(Operation::HasAnyNonNull).is_some());
//! ```

mod many;

pub use many::{Many, ManyIntoIter, Traversal};
pub(crate) use many::{Probe, Scan};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether an operation may stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reach {
    /// Stops at the first element satisfying its predicate.
    Any,
    /// Must observe every element before answering.
    All,
}

/// How an operation terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Terminates on its own.
    Finite,
    /// Requires an external bound such as a maximum element count.
    Infinite,
    /// Runs as a finalizer when the owning item is discarded.
    OnClose,
}

/// A classified stream cache operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Is there at least one non-null element?
    HasAnyNonNull,
    /// Does the sequence hold no element at all?
    IsCompletelyEmpty,
    /// Does any element hold a present `Ok` value?
    HasAnyOk,
    /// Does any element hold a present `Err` value?
    HasAnyErr,
    /// Position of the first non-null element.
    RetrieveFirst,
    /// Position of the first element holding a present `Ok` value.
    RetrieveFirstOk,
    /// Position of the first element holding a present `Err` value.
    RetrieveFirstErr,
    /// Full materialization of the sequence.
    RetrieveAll,
    /// Positions of every element contributing to the `Ok` partition.
    RetrieveAllOk,
    /// Positions of every element contributing to the `Err` partition.
    RetrieveAllErr,
    /// Uncached hand-out of every element.
    Drain,
    /// Materialize at most a caller-supplied number of elements.
    Bounded,
    /// Finalizer run when the item is dropped.
    OnClose,
}

impl Operation {
    /// Returns every operation, in declaration order.
    pub const ALL: [Operation; 13] = [
        Self::HasAnyNonNull,
        Self::IsCompletelyEmpty,
        Self::HasAnyOk,
        Self::HasAnyErr,
        Self::RetrieveFirst,
        Self::RetrieveFirstOk,
        Self::RetrieveFirstErr,
        Self::RetrieveAll,
        Self::RetrieveAllOk,
        Self::RetrieveAllErr,
        Self::Drain,
        Self::Bounded,
        Self::OnClose,
    ];

    /// Returns the reach of this operation.
    #[must_use]
    pub const fn reach(self) -> Reach {
        match self {
            Self::HasAnyNonNull
            | Self::HasAnyOk
            | Self::HasAnyErr
            | Self::RetrieveFirst
            | Self::RetrieveFirstOk
            | Self::RetrieveFirstErr
            | Self::Bounded => Reach::Any,
            Self::IsCompletelyEmpty
            | Self::RetrieveAll
            | Self::RetrieveAllOk
            | Self::RetrieveAllErr
            | Self::Drain
            | Self::OnClose => Reach::All,
        }
    }

    /// Returns how this operation terminates.
    #[must_use]
    pub const fn termination(self) -> Termination {
        match self {
            Self::Bounded => Termination::Infinite,
            Self::OnClose => Termination::OnClose,
            _ => Termination::Finite,
        }
    }

    /// Returns `true` if the answer is cached after the first evaluation.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        !matches!(self, Self::Drain | Self::Bounded | Self::OnClose)
    }

    /// Returns `true` for boolean predicate operations.
    #[must_use]
    pub const fn is_predicate(self) -> bool {
        matches!(
            self,
            Self::HasAnyNonNull | Self::IsCompletelyEmpty | Self::HasAnyOk | Self::HasAnyErr
        )
    }

    /// Stable snake_case name, used as a metric label and log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HasAnyNonNull => "has_any_non_null",
            Self::IsCompletelyEmpty => "is_completely_empty",
            Self::HasAnyOk => "has_any_ok",
            Self::HasAnyErr => "has_any_err",
            Self::RetrieveFirst => "retrieve_first",
            Self::RetrieveFirstOk => "retrieve_first_ok",
            Self::RetrieveFirstErr => "retrieve_first_err",
            Self::RetrieveAll => "retrieve_all",
            Self::RetrieveAllOk => "retrieve_all_ok",
            Self::RetrieveAllErr => "retrieve_all_err",
            Self::Drain => "drain",
            Self::Bounded => "bounded",
            Self::OnClose => "on_close",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A realized answer stored in a [`Many`]'s cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachedAnswer {
    /// Answer of a predicate operation.
    Flag(bool),
    /// Buffer index of a retrieved element, `None` if there was none.
    Position(Option<usize>),
    /// Buffer indices of a retrieved partition.
    Positions(Vec<usize>),
}

impl CachedAnswer {
    /// Returns the flag if this is a predicate answer.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns `true` if this answer points into the buffer.
    #[must_use]
    pub fn is_positional(&self) -> bool {
        !matches!(self, Self::Flag(_))
    }
}

/// Options controlling how a [`Many`] is traversed and which answers are
/// known before traversal.
///
/// The `known_*` hints seed the cache, so the corresponding predicate never
/// pulls from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StreamOptions {
    /// The source may never end.
    #[serde(default)]
    pub infinite: bool,

    /// Upper bound on elements observed by `All` operations over an infinite
    /// source. Zero means unbounded.
    #[serde(default)]
    pub max_size: usize,

    /// The sequence is known to hold no element.
    #[serde(default)]
    pub known_empty: bool,

    /// The sequence is known to hold a non-null element.
    #[serde(default)]
    pub known_non_empty: bool,

    /// The sequence of results is known to hold a present `Ok`.
    #[serde(default)]
    pub known_ok: bool,

    /// The sequence of results is known to hold a present `Err`.
    #[serde(default)]
    pub known_err: bool,
}

impl StreamOptions {
    /// Options for a source that may never end, observing at most `max_size`
    /// elements in `All` operations.
    #[must_use]
    pub fn infinite(max_size: usize) -> Self {
        Self {
            infinite: true,
            max_size,
            ..Self::default()
        }
    }

    /// Marks the sequence as known to be empty.
    #[must_use]
    pub fn with_known_empty(mut self) -> Self {
        self.known_empty = true;
        self
    }

    /// Marks the sequence as known to hold a non-null element.
    #[must_use]
    pub fn with_known_non_empty(mut self) -> Self {
        self.known_non_empty = true;
        self
    }

    /// Marks the sequence as known to hold a present `Ok`.
    #[must_use]
    pub fn with_known_ok(mut self) -> Self {
        self.known_ok = true;
        self
    }

    /// Marks the sequence as known to hold a present `Err`.
    #[must_use]
    pub fn with_known_err(mut self) -> Self {
        self.known_err = true;
        self
    }

    /// Bound applied to `All` operations, `None` when unbounded.
    pub(crate) fn all_bound(&self) -> Option<usize> {
        (self.infinite && self.max_size > 0).then_some(self.max_size)
    }

    /// Answers implied by the hints.
    pub(crate) fn seeds(&self) -> impl Iterator<Item = (Operation, CachedAnswer)> {
        let mut seeds = Vec::new();
        if self.known_empty {
            seeds.push((Operation::IsCompletelyEmpty, CachedAnswer::Flag(true)));
            seeds.push((Operation::HasAnyNonNull, CachedAnswer::Flag(false)));
        }
        if self.known_non_empty {
            seeds.push((Operation::IsCompletelyEmpty, CachedAnswer::Flag(false)));
            seeds.push((Operation::HasAnyNonNull, CachedAnswer::Flag(true)));
        }
        if self.known_ok {
            seeds.push((Operation::HasAnyOk, CachedAnswer::Flag(true)));
        }
        if self.known_err {
            seeds.push((Operation::HasAnyErr, CachedAnswer::Flag(true)));
        }
        seeds.into_iter()
    }
}

/// What an on-close finalizer sees when the owning item is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloseSummary {
    /// Number of elements pulled from the source.
    pub observed: usize,
    /// Number of non-null elements pulled from the source.
    pub non_null: usize,
    /// Whether the source reported its end.
    pub exhausted: bool,
    /// Cached answers, completed with finalized predicates when exhausted.
    pub answers: BTreeMap<Operation, CachedAnswer>,
}

impl CloseSummary {
    /// Returns the answer for a predicate operation, if known.
    #[must_use]
    pub fn flag(&self, op: Operation) -> Option<bool> {
        self.answers.get(&op).and_then(CachedAnswer::as_flag)
    }

    /// Fills in predicate answers that can be derived once the source ended.
    ///
    /// An unresolved `Any` predicate found no match and becomes `false`; an
    /// unresolved `All` predicate found no counterexample and becomes `true`.
    pub(crate) fn finalize(&mut self) {
        if !self.exhausted {
            return;
        }
        self.answers
            .entry(Operation::HasAnyNonNull)
            .or_insert(CachedAnswer::Flag(self.non_null > 0));
        self.answers
            .entry(Operation::IsCompletelyEmpty)
            .or_insert(CachedAnswer::Flag(self.observed == 0));
        for op in Operation::ALL.into_iter().filter(|op| op.is_predicate()) {
            let default = op.reach() == Reach::All;
            self.answers.entry(op).or_insert(CachedAnswer::Flag(default));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_classification() {
        assert_eq!(Operation::HasAnyNonNull.reach(), Reach::Any);
        assert_eq!(Operation::IsCompletelyEmpty.reach(), Reach::All);
        assert_eq!(Operation::RetrieveAllOk.reach(), Reach::All);
        assert_eq!(Operation::Bounded.termination(), Termination::Infinite);
        assert_eq!(Operation::OnClose.termination(), Termination::OnClose);
        assert_eq!(Operation::HasAnyErr.termination(), Termination::Finite);
    }

    #[test]
    fn test_persistence() {
        let uncached: Vec<_> = Operation::ALL
            .into_iter()
            .filter(|op| !op.is_persistent())
            .collect();
        assert_eq!(
            uncached,
            vec![Operation::Drain, Operation::Bounded, Operation::OnClose]
        );
    }

    #[test]
    fn test_operation_names_are_unique() {
        let mut names: Vec<_> = Operation::ALL.iter().map(|op| op.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Operation::ALL.len());
        assert_eq!(Operation::RetrieveFirstOk.to_string(), "retrieve_first_ok");
    }

    #[test]
    fn test_options_seeds() {
        let seeds: BTreeMap<_, _> = StreamOptions::default()
            .with_known_non_empty()
            .with_known_err()
            .seeds()
            .collect();
        assert_eq!(seeds[&Operation::HasAnyNonNull], CachedAnswer::Flag(true));
        assert_eq!(seeds[&Operation::IsCompletelyEmpty], CachedAnswer::Flag(false));
        assert_eq!(seeds[&Operation::HasAnyErr], CachedAnswer::Flag(true));
        assert!(!seeds.contains_key(&Operation::HasAnyOk));
    }

    #[test]
    fn test_all_bound() {
        assert_eq!(StreamOptions::default().all_bound(), None);
        assert_eq!(StreamOptions::infinite(0).all_bound(), None);
        assert_eq!(StreamOptions::infinite(16).all_bound(), Some(16));
    }

    #[test]
    fn test_close_summary_finalize() {
        let mut summary = CloseSummary {
            observed: 2,
            non_null: 1,
            exhausted: true,
            answers: BTreeMap::new(),
        };
        summary.finalize();
        assert_eq!(summary.flag(Operation::HasAnyNonNull), Some(true));
        assert_eq!(summary.flag(Operation::IsCompletelyEmpty), Some(false));
        assert_eq!(summary.flag(Operation::HasAnyOk), Some(false));
    }

    #[test]
    fn test_close_summary_not_exhausted_is_untouched() {
        let mut summary = CloseSummary::default();
        summary.finalize();
        assert!(summary.answers.is_empty());
    }

    #[test]
    fn test_options_serde() {
        let options: StreamOptions =
            serde_json::from_str(r#"{"infinite": true, "max_size": 8}"#).unwrap();
        assert_eq!(options, StreamOptions::infinite(8));
    }
}
