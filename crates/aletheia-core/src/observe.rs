//! Metric names and recording hooks.
//!
//! Core records through the `metrics` facade only. Without an installed
//! recorder every call is a no-op; `aletheia-telemetry` installs the
//! Prometheus recorder and describes these names.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `aletheia_stream_cache_hits_total` | Counter | `operation` |
//! | `aletheia_stream_cache_misses_total` | Counter | `operation` |
//! | `aletheia_stream_elements_pulled_total` | Counter | - |
//! | `aletheia_open_resources` | Gauge | - |
//! | `aletheia_resources_closed_total` | Counter | - |
//! | `aletheia_resource_close_failures_total` | Counter | - |

use crate::cache::Operation;
use metrics::{counter, gauge};

/// Stream cache answers served from the cache.
pub const CACHE_HITS: &str = "aletheia_stream_cache_hits_total";

/// Stream cache answers that had to be computed.
pub const CACHE_MISSES: &str = "aletheia_stream_cache_misses_total";

/// Elements pulled from stream sources.
pub const ELEMENTS_PULLED: &str = "aletheia_stream_elements_pulled_total";

/// Resources currently registered with a monitor.
pub const OPEN_RESOURCES: &str = "aletheia_open_resources";

/// Resources closed and deregistered.
pub const RESOURCES_CLOSED: &str = "aletheia_resources_closed_total";

/// Close routines that returned an error.
pub const CLOSE_FAILURES: &str = "aletheia_resource_close_failures_total";

/// Label carrying the operation name.
pub const OPERATION_LABEL: &str = "operation";

pub(crate) fn cache_lookup(op: Operation, hit: bool) {
    let name = if hit { CACHE_HITS } else { CACHE_MISSES };
    counter!(name, OPERATION_LABEL => op.as_str()).increment(1);
}

pub(crate) fn element_pulled() {
    counter!(ELEMENTS_PULLED).increment(1);
}

pub(crate) fn resource_opened() {
    gauge!(OPEN_RESOURCES).increment(1.0);
}

pub(crate) fn resource_released() {
    gauge!(OPEN_RESOURCES).decrement(1.0);
    counter!(RESOURCES_CLOSED).increment(1);
}

pub(crate) fn close_failed() {
    counter!(CLOSE_FAILURES).increment(1);
}

pub(crate) fn resources_cleared(count: usize) {
    gauge!(OPEN_RESOURCES).decrement(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            CACHE_HITS,
            CACHE_MISSES,
            ELEMENTS_PULLED,
            OPEN_RESOURCES,
            RESOURCES_CLOSED,
            CLOSE_FAILURES,
        ] {
            assert!(name.starts_with("aletheia_"));
        }
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder installed, the facade swallows everything.
        cache_lookup(Operation::HasAnyOk, true);
        cache_lookup(Operation::HasAnyOk, false);
        element_pulled();
        resource_opened();
        resource_released();
        close_failed();
    }
}
