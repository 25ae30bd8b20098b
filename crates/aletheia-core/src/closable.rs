//! Success values that own a closable resource.
//!
//! A [`ClosableOk`] registers its handle with a [`ResourceMonitor`] when it
//! is built and closes it exactly once: explicitly through
//! [`ClosableOk::close`], through one of the consuming helpers, or on drop.
//! A handle taken out with [`ClosableOk::detach`] is never closed by its
//! former owner and stays reported as open.

use crate::error::{ResourceError, ResourceResult, SingleError};
use crate::monitor::{ResourceId, ResourceMonitor};
use crate::outcome::Outcome;
use std::any::type_name;
use std::fmt;
use std::sync::Arc;

/// A handle with an explicit, fallible close routine.
pub trait Close {
    /// Error returned by a failed close.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Releases the underlying resource.
    fn close(&mut self) -> Result<(), Self::Error>;
}

impl Close for std::fs::File {
    type Error = std::io::Error;

    fn close(&mut self) -> Result<(), Self::Error> {
        self.sync_all()
    }
}

impl<W: std::io::Write> Close for std::io::BufWriter<W> {
    type Error = std::io::Error;

    fn close(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(self)
    }
}

/// Creates a [`ClosableOk`] tracked by the global monitor.
pub fn closable_ok<R: Close>(handle: R) -> ClosableOk<R> {
    ClosableOk::new(handle)
}

/// A success value owning a closable handle.
///
/// # Example
///
/// ```
/// use aletheia_core::{ClosableOk, Close, ResourceMonitor};
/// use std::sync::Arc;
///
/// struct Conn;
///
/// impl Close for Conn {
///     type Error = std::io::Error;
///     fn close(&mut self) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
///
/// let monitor = Arc::new(ResourceMonitor::new());
/// let conn = ClosableOk::with_monitor(Conn, Arc::clone(&monitor));
/// assert!(monitor.has_open_resources());
/// drop(conn);
/// assert!(!monitor.has_open_resources());
/// ```
pub struct ClosableOk<R: Close> {
    handle: Option<R>,
    id: Option<ResourceId>,
    monitor: Arc<ResourceMonitor>,
    detached: bool,
}

impl<R: Close> ClosableOk<R> {
    /// Wraps `handle`, registering it with the global monitor.
    pub fn new(handle: R) -> Self {
        Self::with_monitor(handle, ResourceMonitor::global())
    }

    /// Wraps `handle`, registering it with `monitor`.
    pub fn with_monitor(handle: R, monitor: Arc<ResourceMonitor>) -> Self {
        let id = monitor.register(type_name::<R>());
        Self {
            handle: Some(handle),
            id: Some(id),
            monitor,
            detached: false,
        }
    }

    /// A closable success holding nothing. Nothing is registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handle: None,
            id: None,
            monitor: ResourceMonitor::global(),
            detached: false,
        }
    }

    /// Opens a handle, turning an opening failure into an `Err`.
    pub fn try_open<E>(open: impl FnOnce() -> Result<R, E>) -> Outcome<Self, SingleError>
    where
        E: Into<SingleError>,
    {
        Self::try_open_with(ResourceMonitor::global(), open)
    }

    /// Like [`ClosableOk::try_open`], registering with `monitor`.
    pub fn try_open_with<E>(
        monitor: Arc<ResourceMonitor>,
        open: impl FnOnce() -> Result<R, E>,
    ) -> Outcome<Self, SingleError>
    where
        E: Into<SingleError>,
    {
        match open() {
            Ok(handle) => Outcome::ok(Self::with_monitor(handle, monitor)),
            Err(error) => {
                let error = error.into();
                tracing::debug!(
                    resource_type = type_name::<R>(),
                    error = %error,
                    "failed to open resource"
                );
                Outcome::err(error)
            }
        }
    }

    /// Identifier assigned at registration, `None` for an empty value.
    #[must_use]
    pub fn id(&self) -> Option<ResourceId> {
        self.id
    }

    /// Returns `true` while the handle is held and not closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Borrows the handle.
    #[must_use]
    pub fn get(&self) -> Option<&R> {
        self.handle.as_ref()
    }

    /// Borrows the handle, failing if it was handed out by
    /// [`ClosableOk::detach`].
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::AlreadyDetached`] after a detach.
    pub fn try_get(&self) -> ResourceResult<Option<&R>> {
        match self.id {
            Some(id) if self.detached => Err(ResourceError::AlreadyDetached { id }),
            _ => Ok(self.handle.as_ref()),
        }
    }

    /// Mutably borrows the handle.
    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.handle.as_mut()
    }

    /// Closes the handle and deregisters it.
    ///
    /// Closing twice is a no-op. The handle is deregistered even when its
    /// close routine fails; the failure is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::CloseFailed`] if the handle's close routine
    /// fails. After [`ClosableOk::detach`] there is nothing left to close and
    /// this returns `Ok(())`.
    pub fn close(&mut self) -> ResourceResult<()> {
        let Some(id) = self.id else {
            return Ok(());
        };
        if self.detached {
            tracing::debug!(resource_id = %id, "close after detach, nothing to release");
            return Ok(());
        }
        let Some(mut handle) = self.handle.take() else {
            tracing::debug!(resource_id = %id, "resource already closed");
            return Ok(());
        };
        let result = handle.close();
        drop(handle);
        self.monitor.deregister(id);
        result.map_err(|source| {
            self.monitor.record_close_failure();
            tracing::warn!(
                resource_id = %id,
                resource_type = type_name::<R>(),
                error = %source,
                "resource close failed"
            );
            ResourceError::close_failed(id, type_name::<R>(), source)
        })
    }

    /// Runs `f` on the handle if present, then closes it.
    ///
    /// # Errors
    ///
    /// Returns the close failure, if any.
    pub fn if_present(mut self, f: impl FnOnce(&mut R)) -> ResourceResult<()> {
        if let Some(handle) = self.handle.as_mut() {
            f(handle);
        }
        self.close()
    }

    /// Runs `f` on the handle, closes it, and returns the value as an
    /// outcome. A close failure becomes the `Err`.
    pub fn map<U>(mut self, f: impl FnOnce(&mut R) -> U) -> Outcome<U, SingleError> {
        let value = self.handle.as_mut().map(f);
        match (self.close(), value) {
            (Err(error), _) => Outcome::err(error.into()),
            (Ok(()), Some(value)) => Outcome::ok(value),
            (Ok(()), None) => Outcome::empty(),
        }
    }

    /// Runs `f` on the handle without closing it.
    pub fn do_without_closing<U>(&mut self, f: impl FnOnce(&mut R) -> U) -> Option<U> {
        self.handle.as_mut().map(f)
    }

    /// Takes the handle out without closing it.
    ///
    /// The resource stays registered as open; whoever holds the handle now
    /// owns its release.
    pub fn detach(&mut self) -> Option<R> {
        let handle = self.handle.take()?;
        self.detached = true;
        if let Some(id) = self.id {
            tracing::debug!(
                resource_id = %id,
                resource_type = type_name::<R>(),
                "resource detached, it stays reported as open"
            );
        }
        Some(handle)
    }
}

impl<R: Close> Drop for ClosableOk<R> {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        if let Err(error) = self.close() {
            tracing::error!(error = %error, "resource close on drop failed");
        }
    }
}

impl<R: Close + fmt::Debug> fmt::Debug for ClosableOk<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosableOk")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TrackedHandle;

    fn monitor() -> Arc<ResourceMonitor> {
        Arc::new(ResourceMonitor::new())
    }

    #[test]
    fn test_drop_closes_and_deregisters() {
        let monitor = monitor();
        let handle = TrackedHandle::new();
        let closes = handle.closes();
        let ok = ClosableOk::with_monitor(handle, Arc::clone(&monitor));
        assert!(monitor.has_open_resources());
        drop(ok);
        assert!(!monitor.has_open_resources());
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let monitor = monitor();
        let handle = TrackedHandle::new();
        let closes = handle.closes();
        let mut ok = ClosableOk::with_monitor(handle, Arc::clone(&monitor));
        ok.close().unwrap();
        ok.close().unwrap();
        drop(ok);
        assert_eq!(closes.get(), 1);
        assert_eq!(monitor.stats().released, 1);
    }

    #[test]
    fn test_close_failure_is_reported_and_deregistered() {
        let monitor = monitor();
        let mut ok = ClosableOk::with_monitor(TrackedHandle::failing(), Arc::clone(&monitor));
        let id = ok.id().unwrap();
        let err = ok.close().unwrap_err();
        assert_eq!(err.resource_id(), id);
        assert!(!monitor.has_open_resources());
        assert_eq!(monitor.stats().close_failures, 1);
    }

    #[test]
    fn test_map_closes_and_returns_value() {
        let monitor = monitor();
        let handle = TrackedHandle::new();
        let closes = handle.closes();
        let ok = ClosableOk::with_monitor(handle, Arc::clone(&monitor));
        let out = ok.map(|h| h.label().len());
        assert_eq!(out.or_else(0), "tracked".len());
        assert_eq!(closes.get(), 1);
        assert!(!monitor.has_open_resources());
    }

    #[test]
    fn test_map_surfaces_close_failure() {
        let ok = ClosableOk::with_monitor(TrackedHandle::failing(), monitor());
        let out = ok.map(|_| 1);
        let err = out.into_err().unwrap();
        assert!(err.cause().unwrap().contains("close refused"));
    }

    #[test]
    fn test_if_present_runs_then_closes() {
        let monitor = monitor();
        let handle = TrackedHandle::new();
        let closes = handle.closes();
        let mut seen = false;
        ClosableOk::with_monitor(handle, Arc::clone(&monitor))
            .if_present(|_| seen = true)
            .unwrap();
        assert!(seen);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_do_without_closing_keeps_open() {
        let monitor = monitor();
        let mut ok = ClosableOk::with_monitor(TrackedHandle::new(), Arc::clone(&monitor));
        assert_eq!(ok.do_without_closing(|_| 5), Some(5));
        assert!(ok.is_open());
        assert!(monitor.has_open_resources());
    }

    #[test]
    fn test_detach_leaves_resource_open() {
        let monitor = monitor();
        let mut ok = ClosableOk::with_monitor(TrackedHandle::new(), Arc::clone(&monitor));
        let handle = ok.detach().unwrap();
        ok.close().unwrap();
        drop(ok);
        assert!(monitor.has_open_resources());
        assert_eq!(handle.closes().get(), 0);
    }

    #[test]
    fn test_close_after_detach_is_quiet_but_get_is_rejected() {
        let monitor = monitor();
        let mut ok = ClosableOk::with_monitor(TrackedHandle::new(), Arc::clone(&monitor));
        assert!(ok.try_get().unwrap().is_some());

        let _handle = ok.detach().unwrap();
        assert!(ok.close().is_ok());
        assert!(ok.close().is_ok());
        assert!(matches!(
            ok.try_get(),
            Err(ResourceError::AlreadyDetached { .. })
        ));
        assert!(ok.get().is_none());
        assert_eq!(monitor.stats().close_failures, 0);
    }

    #[test]
    fn test_try_open() {
        let monitor = monitor();
        let mut opened =
            ClosableOk::try_open_with(Arc::clone(&monitor), || Ok::<_, std::io::Error>(TrackedHandle::new()));
        assert!(opened.is_ok());
        assert!(monitor.has_open_resources());
        drop(opened);
        assert!(!monitor.has_open_resources());

        let failed = ClosableOk::<TrackedHandle>::try_open_with(Arc::clone(&monitor), || {
            Err(std::io::Error::other("refused"))
        });
        assert_eq!(failed.into_err().unwrap().text(), "refused");
        assert!(!monitor.has_open_resources());
    }

    #[test]
    fn test_empty_registers_nothing() {
        let mut empty = ClosableOk::<TrackedHandle>::empty();
        assert!(empty.id().is_none());
        assert!(empty.get().is_none());
        assert!(empty.close().is_ok());
    }
}
