//! Reference counting for shell host plugins.
//!
//! Explorer loads a handler DLL and asks it whether it may be unloaded;
//! Finder starts and stops its sync extension at will. Both come down to a
//! count of live host objects and a hook that runs when it drops to zero,
//! which is where an adapter shuts its [`SyncClient`](crate::ipc::SyncClient)
//! down.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

type ZeroHook = Box<dyn Fn() + Send + Sync>;

/// Count of live host objects with an on-zero hook.
pub struct HostRefCount {
    count: AtomicUsize,
    on_zero: Option<ZeroHook>,
}

impl HostRefCount {
    pub fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            on_zero: None,
        }
    }

    /// Run `hook` every time the count returns to zero.
    pub fn with_on_zero(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            count: AtomicUsize::new(0),
            on_zero: Some(Box::new(hook)),
        }
    }

    /// Take a reference. Returns the new count.
    pub fn acquire(&self) -> usize {
        let count = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("host reference acquired, {} live", count);
        count
    }

    /// Drop a reference. Returns the new count.
    ///
    /// Releasing at zero is a host bug; it is logged and leaves the count at
    /// zero without running the hook again.
    pub fn release(&self) -> usize {
        let previous = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => {
                debug!("last host reference released");
                if let Some(hook) = &self.on_zero {
                    hook();
                }
                0
            }
            Ok(n) => n - 1,
            Err(_) => {
                warn!("host reference released more often than acquired");
                0
            }
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// True when no host object is alive (`DllCanUnloadNow` answers S_OK).
    pub fn can_unload(&self) -> bool {
        self.count() == 0
    }

    /// Acquire a reference that is released when the guard drops.
    pub fn guard(self: &Arc<Self>) -> HostGuard {
        self.acquire();
        HostGuard {
            counter: Arc::clone(self),
        }
    }
}

impl Default for HostRefCount {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostRefCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRefCount")
            .field("count", &self.count())
            .field("on_zero", &self.on_zero.is_some())
            .finish()
    }
}

/// A held host reference.
#[derive(Debug)]
pub struct HostGuard {
    counter: Arc<HostRefCount>,
}

impl Drop for HostGuard {
    fn drop(&mut self) {
        self.counter.release();
    }
}
