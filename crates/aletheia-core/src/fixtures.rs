//! Test fixtures for Aletheia development and testing.
//!
//! This module provides instrumented producers and resource handles that can
//! be used in tests across the Aletheia codebase.
//!
//! # Example
//!
//! ```
//! use aletheia_core::cache::Many;
//! use aletheia_core::fixtures::CountingSource;
//!
//! let source = CountingSource::new(vec![None, Some(1), Some(2)]);
//! let pulls = source.counter();
//! let mut many = Many::from_nullable(source);
//!
//! assert!(many.has_any_non_null());
//! assert_eq!(pulls.get(), 2);
//! ```

use crate::closable::Close;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A shared counter observed from outside the value that bumps it.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    /// Current value.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A finite producer of nullable elements that counts how often it is
/// pulled.
#[derive(Debug)]
pub struct CountingSource<T> {
    slots: std::vec::IntoIter<Option<T>>,
    pulls: Counter,
}

impl<T> CountingSource<T> {
    /// Creates a producer yielding `slots` in order.
    #[must_use]
    pub fn new(slots: Vec<Option<T>>) -> Self {
        Self {
            slots: slots.into_iter(),
            pulls: Counter::default(),
        }
    }

    /// Returns a handle on the pull count.
    #[must_use]
    pub fn counter(&self) -> Counter {
        self.pulls.clone()
    }
}

impl<T> Iterator for CountingSource<T> {
    type Item = Option<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.next()?;
        self.pulls.bump();
        Some(slot)
    }
}

/// A producer that yields `prefix` and panics if pulled any further.
///
/// Stands in for an element that is too expensive to ever compute, so a
/// test fails loudly if an operation pulls past what it needs.
///
/// # Panics
///
/// Panics when pulled past the prefix.
pub fn expensive_after<T>(prefix: Vec<Option<T>>) -> impl Iterator<Item = Option<T>> {
    prefix
        .into_iter()
        .map(Some)
        .chain(std::iter::once_with(|| -> Option<Option<T>> {
            panic!("expensive element was pulled")
        }))
        .map_while(|slot| slot)
}

/// A closable handle recording how often it was closed.
#[derive(Debug)]
pub struct TrackedHandle {
    label: String,
    closes: Counter,
    fail: bool,
}

impl TrackedHandle {
    /// A handle whose close succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            label: "tracked".to_string(),
            closes: Counter::default(),
            fail: false,
        }
    }

    /// A handle whose close fails with "close refused".
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Returns the handle's label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns a handle on the close count.
    #[must_use]
    pub fn closes(&self) -> Counter {
        self.closes.clone()
    }
}

impl Default for TrackedHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Close for TrackedHandle {
    type Error = std::io::Error;

    fn close(&mut self) -> Result<(), Self::Error> {
        self.closes.bump();
        if self.fail {
            Err(std::io::Error::other("close refused"))
        } else {
            Ok(())
        }
    }
}
