//! # Aletheia
//!
//! **A generalized Result algebra for the Themis Platform**
//!
//! Aletheia generalizes `Result` so that either side may hold nothing, one
//! value, or a lazily traversed stream of values:
//!
//! - **Items** – a single optional value or a once-traversable sequence
//! - **Stream caching** – existence and first-element queries pull as little
//!   as possible and answer repeated queries without traversal
//! - **Error aggregates** – deduplicated errors behind one error contract
//! - **Closable resources** – `Ok` values owning handles, tracked by a
//!   process-wide monitor until closed
//!
//! ## Quick Start
//!
//! ```no_run
//! use aletheia::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let _runtime = aletheia::bootstrap("ALETHEIA")?;
//!
//!     let lines = vec!["1", "2", "x"];
//!     let mut parsed = Outcome::from_results(lines.into_iter().map(str::parse::<u32>));
//!     if parsed.is_err() {
//!         tracing::warn!("some lines did not parse");
//!     }
//!     let values = parsed.map(|n| n * 2).into_partitioned();
//!     assert_eq!(values.oks, vec![2, 4]);
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! ```text
//! aletheia-core       Item, Many, Outcome, ResultStream, AggregateError, ClosableOk, ResourceMonitor
//! aletheia-telemetry  logging and Prometheus metrics
//! aletheia-config     layered TOML/JSON/env configuration
//! ```

#![doc(html_root_url = "https://docs.rs/aletheia/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod runtime;

// Re-export core types
pub use aletheia_core as core;

// Re-export telemetry
pub use aletheia_telemetry as telemetry;

// Re-export configuration
pub use aletheia_config as config;

pub use runtime::{bootstrap, init, Runtime};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use aletheia::prelude::*;
///
/// let outcome: Outcome<u32, String> = Outcome::ok(1);
/// assert_eq!(outcome.or_else(0), 1);
/// ```
pub mod prelude {
    pub use aletheia_core::{
        closable_ok, AggregateError, ClosableOk, Close, ErrorContract, Item, Many, MutableOk,
        Outcome, Partitioned, ResourceMonitor, ResultStream, SingleError, StreamOptions,
    };

    pub use aletheia_config::{AletheiaConfig, ConfigLoader};

    pub use crate::Runtime;
}
