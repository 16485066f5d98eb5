//! Context handle: a thread-scoped facade over one layer coordinator.

use crate::context::coordinator::Coordinator;
use crate::context::value::{ContextualValue, ValueType};
use crate::error::ContextError;
use std::sync::Arc;

/// Per-thread entry point into one coordinator
///
/// The handle owns no data beyond the coordinator reference; it exists so
/// that binding a contextual value only takes (keyset, handle, template) and
/// so that threads can be wired to distinct coordinators when independent
/// context universes are wanted. Cloning shares the coordinator.
#[derive(Clone)]
pub struct ContextHandle {
    coordinator: Arc<Coordinator>,
}

impl ContextHandle {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        ContextHandle { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Bind `value` as the layer provider for its tag, then force a full
    /// resolve of every value registered with the coordinator. Authoritative:
    /// runs regardless of dirty state; last activation per tag wins.
    pub fn activate<T: ValueType>(&self, value: &ContextualValue<T>) -> Result<(), ContextError> {
        self.coordinator.activate(value.provider())
    }

    /// Re-read active providers and recompute every registered value's
    /// resolved name; payload caches stay as they are.
    pub fn sync_layers(&self) {
        self.coordinator.sync_layers();
    }

    /// Cheap reconciliation point: refresh only values whose dirty flag is
    /// set by a tracked write or activation.
    pub fn notify_all_events(&self) -> Result<(), ContextError> {
        self.coordinator.notify_all_events()
    }

    /// Expensive reconciliation point: refresh name and content of every
    /// registered value from the current keyset state.
    pub fn notify_key_set_update(&self) -> Result<(), ContextError> {
        self.coordinator.notify_key_set_update()
    }
}

impl Default for ContextHandle {
    fn default() -> Self {
        ContextHandle::new(Arc::new(Coordinator::new()))
    }
}
