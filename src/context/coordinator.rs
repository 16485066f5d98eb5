//! Layer coordinator: shared registry of active layer bindings and of every
//! contextual value bound through it.
//!
//! The registry lock is held for the full duration of every broadcast so no
//! value observes a half-updated layer set. Registered values live in a slot
//! arena with stable indices and per-slot generations; a released slot bumps
//! its generation, so a stale id can never alias a reused slot.

use crate::error::ContextError;
use crate::resolve::LayerMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Anything able to supply the current substitution string for its layer tag
pub(crate) trait LayerProvider: Send + Sync {
    fn layer_tag(&self) -> String;
    fn current_value(&self) -> String;
}

/// Broadcast target: the cache cell of one registered contextual value
///
/// Cells never call back into the coordinator; the layer snapshot is passed
/// in. Lock order is coordinator, then cell, then keyset.
pub(crate) trait CacheSlot: Send + Sync {
    fn mark_dirty(&self);
    fn is_dirty(&self) -> bool;
    /// Recompute the resolved name only; the payload cache is untouched
    fn sync_name(&self, layers: &LayerMap);
    /// Full resolve: recompute the name, then adopt-or-materialize the value
    fn sync_full(&self, layers: &LayerMap) -> Result<(), ContextError>;
}

/// Stable arena handle held by a registered contextual value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotId {
    index: usize,
    generation: u64,
}

struct LayerBinding {
    provider: Weak<dyn LayerProvider>,
    current: String,
}

struct Slot {
    generation: u64,
    cell: Option<Weak<dyn CacheSlot>>,
}

#[derive(Default)]
struct CoordinatorState {
    layers: HashMap<String, LayerBinding>,
    slots: Vec<Slot>,
    free: Vec<usize>,
}

/// Shared coordinator backing one or more context handles
///
/// Typically one per process; distinct coordinators form independent context
/// universes.
#[derive(Default)]
pub struct Coordinator {
    state: Mutex<CoordinatorState>,
}

impl Coordinator {
    pub fn new() -> Self {
        Coordinator::default()
    }

    pub(crate) fn register(&self, cell: Weak<dyn CacheSlot>) -> SlotId {
        let mut state = self.state.lock();
        match state.free.pop() {
            Some(index) => {
                let slot = &mut state.slots[index];
                slot.cell = Some(cell);
                SlotId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                state.slots.push(Slot {
                    generation: 0,
                    cell: Some(cell),
                });
                SlotId {
                    index: state.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    pub(crate) fn release(&self, id: SlotId) {
        let mut state = self.state.lock();
        let Some(slot) = state.slots.get_mut(id.index) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        slot.cell = None;
        slot.generation += 1;
        state.free.push(id.index);
    }

    /// Current tag to substitution-string snapshot
    pub(crate) fn layer_snapshot(&self) -> LayerMap {
        snapshot_of(&self.state.lock().layers)
    }

    /// Insert-or-replace the binding for the provider's tag, mark every
    /// registered value dirty, then force a full resolve of all of them.
    pub(crate) fn activate(&self, provider: Arc<dyn LayerProvider>) -> Result<(), ContextError> {
        let mut state = self.state.lock();
        let tag = provider.layer_tag();
        let current = provider.current_value();
        debug!(tag = %tag, value = %current, "activating layer");
        state.layers.insert(
            tag,
            LayerBinding {
                provider: Arc::downgrade(&provider),
                current,
            },
        );
        let snapshot = snapshot_of(&state.layers);
        let cells = live_cells(&state.slots);
        for cell in &cells {
            cell.mark_dirty();
        }
        for cell in &cells {
            cell.sync_full(&snapshot)?;
        }
        Ok(())
    }

    /// Re-read each active provider's current string, then recompute every
    /// registered value's resolved name. Payload caches are left untouched.
    pub(crate) fn sync_layers(&self) {
        let mut state = self.state.lock();
        for (tag, binding) in state.layers.iter_mut() {
            match binding.provider.upgrade() {
                Some(provider) => binding.current = provider.current_value(),
                None => warn!(tag = %tag, "layer provider dropped, keeping last value"),
            }
        }
        let snapshot = snapshot_of(&state.layers);
        let cells = live_cells(&state.slots);
        trace!(layers = snapshot.len(), values = cells.len(), "syncing layer names");
        for cell in &cells {
            cell.sync_name(&snapshot);
        }
    }

    /// Refresh only values marked dirty by a tracked write or activation.
    /// Untracked external mutation is invisible here; clean values stay as
    /// they are.
    pub(crate) fn notify_all_events(&self) -> Result<(), ContextError> {
        let state = self.state.lock();
        let snapshot = snapshot_of(&state.layers);
        let cells = live_cells(&state.slots);
        for cell in &cells {
            if cell.is_dirty() {
                cell.sync_full(&snapshot)?;
            }
        }
        Ok(())
    }

    /// Unconditional full refresh of every registered value, for when the
    /// backing keyset was replaced or bulk-updated externally.
    pub(crate) fn notify_key_set_update(&self) -> Result<(), ContextError> {
        let state = self.state.lock();
        let snapshot = snapshot_of(&state.layers);
        let cells = live_cells(&state.slots);
        trace!(values = cells.len(), "forcing full keyset refresh");
        for cell in &cells {
            cell.sync_full(&snapshot)?;
        }
        Ok(())
    }
}

fn snapshot_of(layers: &HashMap<String, LayerBinding>) -> LayerMap {
    layers
        .iter()
        .map(|(tag, binding)| (tag.clone(), binding.current.clone()))
        .collect()
}

fn live_cells(slots: &[Slot]) -> Vec<Arc<dyn CacheSlot>> {
    slots
        .iter()
        .filter_map(|slot| slot.cell.as_ref()?.upgrade())
        .collect()
}
