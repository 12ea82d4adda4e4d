use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::MediaTarget;

enum Slot<T> {
    Vacant,
    Held(Arc<T>),
    Released,
}

/// Exclusive owner of one [`MediaTarget`].
///
/// The target is released exactly once, by whichever of [`release`],
/// a late [`install`] or `Drop` comes first. Safe to share between the
/// assembler task and the session that tears it down.
///
/// [`release`]: MediaLease::release
/// [`install`]: MediaLease::install
pub struct MediaLease<T: MediaTarget> {
    slot: Mutex<Slot<T>>,
}

impl<T: MediaTarget> MediaLease<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Vacant),
        }
    }

    /// Hand `target` to the lease and get a shared handle back.
    ///
    /// Returns `None` when the lease was released first; `target` is then
    /// released immediately. A previously installed target is released and
    /// replaced.
    pub fn install(&self, target: T) -> Option<Arc<T>> {
        let target = Arc::new(target);
        let previous = {
            let mut slot = self.slot.lock();
            if matches!(*slot, Slot::Released) {
                None
            } else {
                Some(std::mem::replace(&mut *slot, Slot::Held(Arc::clone(&target))))
            }
        };
        match previous {
            None => {
                debug!(url = target.object_url(), "lease already released, dropping target");
                target.release();
                None
            }
            Some(Slot::Held(old)) => {
                old.release();
                Some(target)
            }
            Some(_) => Some(target),
        }
    }

    /// Currently installed target.
    pub fn target(&self) -> Option<Arc<T>> {
        match &*self.slot.lock() {
            Slot::Held(target) => Some(Arc::clone(target)),
            _ => None,
        }
    }

    /// Release the target. Returns `true` only for the call that actually
    /// released an installed target; later calls are no-ops.
    pub fn release(&self) -> bool {
        let previous = std::mem::replace(&mut *self.slot.lock(), Slot::Released);
        match previous {
            Slot::Held(target) => {
                debug!(url = target.object_url(), "releasing media target");
                target.release();
                true
            }
            Slot::Vacant | Slot::Released => false,
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Released)
    }
}

impl<T: MediaTarget> Default for MediaLease<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MediaTarget> Drop for MediaLease<T> {
    fn drop(&mut self) {
        self.release();
    }
}
