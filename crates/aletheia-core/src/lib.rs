//! # Aletheia Core
//!
//! A result algebra over single values, lazy sequences and closable
//! resources.
//!
//! This crate provides the foundational types used throughout Aletheia:
//!
//! - [`Outcome`] - `Ok`/`Err` container with `map`, `and_then`, `filter`, `cast`
//! - [`Item`] - zero, one, or many values beneath each side
//! - [`cache::Many`] - once-traversable sequence with a persistent stream cache
//! - [`ResultStream`] - lazy sequence of outcomes with cached partitions
//! - [`AggregateError`] - deduplicated set of [`SingleError`]s
//! - [`ClosableOk`] - success owning a resource, tracked by [`ResourceMonitor`]
//! - [`MutableOk`] - success value that can be changed in place
//!
//! Nothing here spawns threads or blocks on its own. Queries that may pull
//! from a lazy sequence take `&mut self`.

#![doc(html_root_url = "https://docs.rs/aletheia-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod aggregate;
pub mod cache;
mod closable;
mod collect;
mod error;
pub mod fixtures;
mod item;
mod monitor;
mod mutable;
pub mod observe;
mod outcome;
mod stream;

pub use aggregate::{AggregateError, MESSAGE_SEPARATOR};
pub use cache::{CachedAnswer, CloseSummary, Many, Operation, StreamOptions};
pub use closable::{closable_ok, ClosableOk, Close};
pub use collect::Partitioned;
pub use error::{ErrorContract, Pretty, ResourceError, ResourceResult, SingleError};
pub use item::Item;
pub use monitor::{
    MonitorOptions, MonitorStats, OpenResource, ResourceId, ResourceMonitor, UNTRACKED_TYPE,
};
pub use mutable::MutableOk;
pub use outcome::Outcome;
pub use stream::ResultStream;
