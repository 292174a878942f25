use std::collections::HashMap;

use counsel_core::SubscriptionId;
use counsel_logging::{console_debug, console_error};

use crate::SubscriptionHandle;

/// Owns the cancellation handle of every live query the console opened.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    handles: HashMap<SubscriptionId, SubscriptionHandle>,
    opened: u64,
    closed: u64,
}

/// Lifetime counters; `opened == closed` once everything is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    pub opened: u64,
    pub closed: u64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SubscriptionId, handle: SubscriptionHandle) {
        self.opened += 1;
        if let Some(previous) = self.handles.insert(id, handle) {
            console_error!("Subscription {:?} registered twice; closing the older one", id);
            previous.unsubscribe();
            self.closed += 1;
        }
    }

    /// Returns `false` when `id` was not open. Closing twice is harmless.
    pub fn close(&mut self, id: SubscriptionId) -> bool {
        match self.handles.remove(&id) {
            Some(handle) => {
                handle.unsubscribe();
                self.closed += 1;
                console_debug!("Subscription {:?} closed", id);
                true
            }
            None => false,
        }
    }

    pub fn close_all(&mut self) {
        let ids: Vec<SubscriptionId> = self.handles.keys().copied().collect();
        for id in ids {
            self.close(id);
        }
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            opened: self.opened,
            closed: self.closed,
        }
    }
}
