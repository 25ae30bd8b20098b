//! Open-resource monitor.
//!
//! Every [`ClosableOk`](crate::ClosableOk) registers its handle here when it
//! is built and deregisters it when it is closed. The monitor does not
//! reclaim anything: it makes leaks observable through
//! [`ResourceMonitor::has_open_resources`] and [`ResourceMonitor::report_leaks`].
//!
//! Registration and deregistration may race across threads. The registry is
//! a sharded [`DashMap`], so each call only locks the shard it touches.
//!
//! # Example
//!
//! ```
//! use aletheia_core::ResourceMonitor;
//!
//! let monitor = ResourceMonitor::new();
//! let id = monitor.register("Connection");
//! assert!(monitor.has_open_resources());
//! assert!(monitor.deregister(id));
//! assert!(!monitor.has_open_resources());
//! ```

use crate::observe;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

static GLOBAL: OnceLock<Arc<ResourceMonitor>> = OnceLock::new();

/// Type name recorded when type tracking is disabled.
pub const UNTRACKED_TYPE: &str = "untracked";

/// Unique identifier assigned to a registered resource.
///
/// Identifiers are UUID v7, so they sort by registration time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Creates a new time-ordered identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `ResourceId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ResourceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ResourceId> for Uuid {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// A registered, not yet closed resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenResource {
    /// Identifier assigned at registration.
    pub id: ResourceId,
    /// Type name of the handle.
    pub type_name: &'static str,
    /// Registration time.
    pub opened_at: DateTime<Utc>,
}

/// Monitor behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorOptions {
    /// Log open resources at `warn` in [`ResourceMonitor::report_leaks`].
    #[serde(default = "default_true")]
    pub warn_on_leak: bool,

    /// Record handle type names.
    #[serde(default = "default_true")]
    pub track_type_names: bool,

    /// Maximum number of resources listed individually in a leak report.
    #[serde(default = "default_leak_report_limit")]
    pub leak_report_limit: usize,
}

fn default_true() -> bool {
    true
}

fn default_leak_report_limit() -> usize {
    20
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            warn_on_leak: true,
            track_type_names: true,
            leak_report_limit: default_leak_report_limit(),
        }
    }
}

/// Counters describing monitor activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MonitorStats {
    /// Resources registered since creation.
    pub registered: u64,
    /// Resources deregistered since creation.
    pub released: u64,
    /// Close routines that failed.
    pub close_failures: u64,
    /// Resources currently open.
    pub open: usize,
}

/// Registry of open resources.
#[derive(Debug, Default)]
pub struct ResourceMonitor {
    open: DashMap<ResourceId, OpenResource>,
    options: RwLock<MonitorOptions>,
    registered: AtomicU64,
    released: AtomicU64,
    close_failures: AtomicU64,
}

impl ResourceMonitor {
    /// Returns the process-wide monitor.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Creates an empty monitor with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty monitor with the given options.
    #[must_use]
    pub fn with_options(options: MonitorOptions) -> Self {
        Self {
            options: RwLock::new(options),
            ..Self::default()
        }
    }

    /// Replaces the options. Already registered resources are kept.
    pub fn configure(&self, options: MonitorOptions) {
        *self.options.write() = options;
    }

    /// Returns a copy of the current options.
    #[must_use]
    pub fn options(&self) -> MonitorOptions {
        self.options.read().clone()
    }

    /// Registers a resource and returns its identifier.
    pub fn register(&self, type_name: &'static str) -> ResourceId {
        let id = ResourceId::new();
        let type_name = if self.options.read().track_type_names {
            type_name
        } else {
            UNTRACKED_TYPE
        };
        self.open.insert(
            id,
            OpenResource {
                id,
                type_name,
                opened_at: Utc::now(),
            },
        );
        self.registered.fetch_add(1, Ordering::Relaxed);
        observe::resource_opened();
        tracing::trace!(resource_id = %id, resource_type = type_name, "resource registered");
        id
    }

    /// Removes a resource. Returns `false` if it was not registered.
    pub fn deregister(&self, id: ResourceId) -> bool {
        let Some((_, resource)) = self.open.remove(&id) else {
            return false;
        };
        self.released.fetch_add(1, Ordering::Relaxed);
        observe::resource_released();
        tracing::trace!(
            resource_id = %id,
            resource_type = resource.type_name,
            "resource deregistered"
        );
        true
    }

    pub(crate) fn record_close_failure(&self) {
        self.close_failures.fetch_add(1, Ordering::Relaxed);
        observe::close_failed();
    }

    /// Returns `true` if any registered resource was not closed.
    #[must_use]
    pub fn has_open_resources(&self) -> bool {
        !self.open.is_empty()
    }

    /// Number of open resources.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn is_open(&self, id: ResourceId) -> bool {
        self.open.contains_key(&id)
    }

    /// Snapshot of open resources, oldest first.
    #[must_use]
    pub fn open_resources(&self) -> Vec<OpenResource> {
        let mut resources: Vec<_> = self.open.iter().map(|entry| entry.value().clone()).collect();
        resources.sort_by_key(|resource| resource.id);
        resources
    }

    /// Snapshot of the activity counters.
    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            registered: self.registered.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            close_failures: self.close_failures.load(Ordering::Relaxed),
            open: self.open.len(),
        }
    }

    /// Logs open resources and returns how many there are.
    ///
    /// At most `leak_report_limit` resources are listed individually.
    pub fn report_leaks(&self) -> usize {
        let leaked = self.open_resources();
        if leaked.is_empty() {
            return 0;
        }
        let options = self.options();
        if options.warn_on_leak {
            let now = Utc::now();
            for resource in leaked.iter().take(options.leak_report_limit) {
                tracing::warn!(
                    resource_id = %resource.id,
                    resource_type = resource.type_name,
                    open_for_ms = (now - resource.opened_at).num_milliseconds(),
                    "resource was never closed"
                );
            }
            tracing::warn!(
                open = leaked.len(),
                listed = leaked.len().min(options.leak_report_limit),
                "open resources detected"
            );
        }
        leaked.len()
    }

    /// Forgets every open resource without closing it. Returns how many
    /// were dropped from the registry.
    pub fn clear(&self) -> usize {
        let count = self.open.len();
        self.open.clear();
        observe::resources_cleared(count);
        tracing::debug!(cleared = count, "resource monitor cleared");
        count
    }
}
