//! Item abstraction: zero, one, or many values.
//!
//! An [`Item`] is the container under every [`Outcome`](crate::Outcome)
//! side. A `Single` holds at most one value and never changes after
//! construction. A `Many` holds a lazy [`Many`] sequence whose presence can
//! only be known by looking, through the stream cache.

use crate::cache::Many;
use std::fmt;

/// Zero or one value, or a lazy sequence of values.
pub enum Item<T> {
    /// At most one value.
    Single(Option<T>),
    /// A lazy, once-traversable sequence.
    Many(Many<T>),
}

impl<T> Item<T> {
    /// Creates a present single item.
    #[must_use]
    pub fn single(value: T) -> Self {
        Self::Single(Some(value))
    }

    /// Creates an absent single item.
    #[must_use]
    pub fn none() -> Self {
        Self::Single(None)
    }

    /// Returns `true` for the `Many` shape.
    #[must_use]
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Returns `true` if a value is present.
    ///
    /// For `Many` this is the cached has-any-non-null operation and may pull
    /// from the source.
    pub fn is_present(&mut self) -> bool {
        match self {
            Self::Single(value) => value.is_some(),
            Self::Many(many) => many.has_any_non_null(),
        }
    }

    /// Returns `true` if no value is present.
    pub fn is_empty(&mut self) -> bool {
        !self.is_present()
    }

    /// Borrows the single value, or the first non-null element of a `Many`.
    pub fn first(&mut self) -> Option<&T> {
        match self {
            Self::Single(value) => value.as_ref(),
            Self::Many(many) => many.first(),
        }
    }

    /// Reduces a `Many` to a `Single` holding its first non-null element.
    #[must_use]
    pub fn reduce_first(self) -> Self {
        match self {
            Self::Single(_) => self,
            Self::Many(many) => Self::Single(many.into_first()),
        }
    }

    /// Returns the held value or `default`.
    ///
    /// # Panics
    ///
    /// Panics on an un-reduced `Many`. The first element has to be selected
    /// explicitly with [`Item::reduce_first`] before a default applies.
    pub fn or_else(self, default: T) -> T {
        match self {
            Self::Single(value) => value.unwrap_or(default),
            Self::Many(_) => {
                panic!("Item::or_else called on an unreduced Many; call reduce_first first")
            }
        }
    }

    /// Converts a single item into an `Option`, reducing a `Many` to its
    /// first non-null element.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Single(value) => value,
            Self::Many(many) => many.into_first(),
        }
    }
}

impl<T: Send + 'static> Item<T> {
    /// Creates a lazy sequence item.
    pub fn many<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::Many(Many::new(values))
    }

    /// Applies `f` to the held value, lazily for `Many`.
    pub fn map<U: Send + 'static>(self, f: impl FnMut(T) -> U + Send + 'static) -> Item<U> {
        match self {
            Self::Single(value) => Item::Single(value.map(f)),
            Self::Many(many) => Item::Many(many.map(f)),
        }
    }

    /// Applies `f` to the held value and flattens, concatenating for `Many`.
    pub fn flat_map<U: Send + 'static>(
        self,
        mut f: impl FnMut(T) -> Item<U> + Send + 'static,
    ) -> Item<U> {
        match self {
            Self::Single(Some(value)) => f(value),
            Self::Single(None) => Item::Single(None),
            Self::Many(many) => Item::Many(many.flat_map(f)),
        }
    }

    /// Keeps values satisfying `predicate`.
    pub fn filter(self, mut predicate: impl FnMut(&T) -> bool + Send + 'static) -> Self {
        match self {
            Self::Single(value) => Self::Single(value.filter(|v| predicate(v))),
            Self::Many(many) => Self::Many(many.filter(predicate)),
        }
    }

    /// Consumes the item into an iterator over its values.
    pub fn into_values(self) -> Box<dyn Iterator<Item = T> + Send> {
        match self {
            Self::Single(value) => Box::new(value.into_iter()),
            Self::Many(many) => Box::new(many.into_iter()),
        }
    }
}

impl<T> Default for Item<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> From<Option<T>> for Item<T> {
    fn from(value: Option<T>) -> Self {
        Self::Single(value)
    }
}

impl<T> From<Many<T>> for Item<T> {
    fn from(many: Many<T>) -> Self {
        Self::Many(many)
    }
}

impl<T: fmt::Debug> fmt::Debug for Item<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => f.debug_tuple("Single").field(value).finish(),
            Self::Many(many) => f.debug_tuple("Many").field(many).finish(),
        }
    }
}
