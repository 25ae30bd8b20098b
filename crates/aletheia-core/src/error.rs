//! Error values carried by outcomes.
//!
//! This module provides [`SingleError`], the standard error payload of an
//! `Err` outcome, the [`ErrorContract`] shared with
//! [`AggregateError`](crate::AggregateError), and [`ResourceError`] for
//! closable resources.
//!
//! Errors never escape the algebra as panics: a failing computation is
//! turned into a `SingleError` and returned through `Err`.
//!
//! # Example
//!
//! ```
//! use aletheia_core::{ErrorContract, SingleError};
//!
//! let err = SingleError::from_message("connection refused");
//! assert!(err.is_error());
//! assert!(!SingleError::from_message("   ").is_error());
//! ```

use crate::monitor::ResourceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Common contract of single and aggregated errors.
pub trait ErrorContract {
    /// Human-readable message.
    fn message(&self) -> String;

    /// Whether this value represents an actual error.
    ///
    /// A blank message means "no error".
    fn is_error(&self) -> bool {
        !self.message().trim().is_empty()
    }

    /// Multi-line rendering for logs and reports.
    fn pretty_print(&self) -> String {
        self.message()
    }
}

/// A single error: a message plus an optional rendered cause chain.
///
/// Equality and hashing cover both fields, which is what deduplication in
/// [`AggregateError`](crate::AggregateError) relies on.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[error("{message}")]
pub struct SingleError {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cause: Option<String>,
}

impl SingleError {
    /// Creates an error from a plain message.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates an error from a thrown error, keeping its source chain.
    #[must_use]
    pub fn from_thrown(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: error.to_string(),
            cause: (!chain.is_empty()).then(|| chain.join(": ")),
        }
    }

    /// Creates an error with an explicit cause description.
    #[must_use]
    pub fn with_cause(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Borrows the message.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.message
    }

    /// Returns the rendered cause chain, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

impl ErrorContract for SingleError {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn pretty_print(&self) -> String {
        match &self.cause {
            Some(cause) => format!("{}\n  caused by: {cause}", self.message),
            None => self.message.clone(),
        }
    }
}

impl From<anyhow::Error> for SingleError {
    fn from(error: anyhow::Error) -> Self {
        let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        Self {
            message: error.to_string(),
            cause: (!chain.is_empty()).then(|| chain.join(": ")),
        }
    }
}

impl From<std::io::Error> for SingleError {
    fn from(error: std::io::Error) -> Self {
        Self::from_thrown(&error)
    }
}

impl From<&str> for SingleError {
    fn from(message: &str) -> Self {
        Self::from_message(message)
    }
}

impl From<String> for SingleError {
    fn from(message: String) -> Self {
        Self::from_message(message)
    }
}

/// Errors raised while closing or detaching a resource.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The handle's own close routine failed.
    #[error("failed to close resource {id} ({type_name})")]
    CloseFailed {
        /// Identifier assigned at registration.
        id: ResourceId,
        /// Type name of the handle.
        type_name: &'static str,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The handle was already moved out of its owner.
    #[error("resource {id} was already detached")]
    AlreadyDetached {
        /// Identifier assigned at registration.
        id: ResourceId,
    },
}

impl ResourceError {
    /// Create a new close failure.
    pub fn close_failed(
        id: ResourceId,
        type_name: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::CloseFailed {
            id,
            type_name,
            source: source.into(),
        }
    }

    /// Returns the identifier of the resource involved.
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        match self {
            Self::CloseFailed { id, .. } | Self::AlreadyDetached { id } => *id,
        }
    }
}

impl From<ResourceError> for SingleError {
    fn from(error: ResourceError) -> Self {
        Self::from_thrown(&error)
    }
}

/// Displays any [`ErrorContract`] through its pretty form.
pub struct Pretty<'a, E: ?Sized>(pub &'a E);

impl<E: ErrorContract + ?Sized> fmt::Display for Pretty<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.pretty_print())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("inner")]
    struct Inner;

    #[test]
    fn test_from_message() {
        let err = SingleError::from_message("boom");
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "boom");
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_blank_message_is_not_error() {
        assert!(!SingleError::from_message("").is_error());
        assert!(!SingleError::from_message(" \t\n").is_error());
        assert!(SingleError::from_message("x").is_error());
    }

    #[test]
    fn test_from_thrown_keeps_chain() {
        let err = SingleError::from_thrown(&Outer(Inner));
        assert_eq!(err.message(), "outer");
        assert_eq!(err.cause(), Some("inner"));
        assert!(err.pretty_print().contains("caused by: inner"));
    }

    #[test]
    fn test_from_anyhow() {
        let err: SingleError = anyhow::anyhow!("root").context("while loading").into();
        assert_eq!(err.message(), "while loading");
        assert_eq!(err.cause(), Some("root"));
    }

    #[test]
    fn test_equality_includes_cause() {
        assert_eq!(
            SingleError::from_message("a"),
            SingleError::from_message("a")
        );
        assert_ne!(
            SingleError::from_message("a"),
            SingleError::with_cause("a", "b")
        );
    }

    #[test]
    fn test_serde_round_trip_shape() {
        let json = serde_json::to_string(&SingleError::from_message("m")).unwrap();
        assert_eq!(json, r#"{"message":"m"}"#);
    }

    #[test]
    fn test_resource_error_into_single_error() {
        let id = ResourceId::new();
        let err = ResourceError::close_failed(id, "File", "disk gone");
        assert_eq!(err.resource_id(), id);
        let single = SingleError::from(err);
        assert!(single.message().contains("failed to close resource"));
        assert_eq!(single.cause(), Some("disk gone"));
    }

    #[test]
    fn test_pretty_display() {
        let err = SingleError::with_cause("top", "bottom");
        assert_eq!(Pretty(&err).to_string(), "top\n  caused by: bottom");
    }
}
