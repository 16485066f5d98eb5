//! Contextual value: a typed cell bound to (keyset, context, templated key).

use crate::context::coordinator::{CacheSlot, Coordinator, LayerProvider, SlotId};
use crate::context::handle::ContextHandle;
use crate::error::ContextError;
use crate::key::{Key, KeyName, META_DEFAULT};
use crate::keyset::KeysetHandle;
use crate::resolve::{resolve_name, LayerMap};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

/// String-convertible value type for contextual cells
///
/// Conversions are strict: a cached string that does not parse as `T` fails
/// at the moment of caching with the parse failure as the reason.
pub trait ValueType: Clone + Send + Sync + 'static {
    fn from_config_str(text: &str) -> Result<Self, String>;
    fn to_config_str(&self) -> String;
}

impl ValueType for String {
    fn from_config_str(text: &str) -> Result<Self, String> {
        Ok(text.to_string())
    }

    fn to_config_str(&self) -> String {
        self.clone()
    }
}

macro_rules! parsed_value_type {
    ($($ty:ty),*) => {
        $(impl ValueType for $ty {
            fn from_config_str(text: &str) -> Result<Self, String> {
                text.parse().map_err(|e: <$ty as std::str::FromStr>::Err| e.to_string())
            }

            fn to_config_str(&self) -> String {
                self.to_string()
            }
        })*
    };
}

parsed_value_type!(i64, u64, f64, bool);

struct CellState<T> {
    resolved: KeyName,
    cached: T,
    dirty: bool,
}

/// Shared cell holding the per-value caches; the broadcast side reaches it
/// through the coordinator's slot arena, the typed side through
/// [`ContextualValue`].
pub(crate) struct ValueCell<T: ValueType> {
    keyset: KeysetHandle,
    template: Key,
    state: Mutex<CellState<T>>,
}

impl<T: ValueType> ValueCell<T> {
    fn sync_full_inner(&self, layers: &LayerMap) -> Result<(), ContextError> {
        let mut state = self.state.lock();
        let resolved = resolve_name(self.template.name(), layers);
        let cached = adopt_or_materialize::<T>(&self.keyset, &self.template, &resolved)?;
        state.resolved = resolved;
        state.cached = cached;
        state.dirty = false;
        Ok(())
    }
}

impl<T: ValueType> CacheSlot for ValueCell<T> {
    fn mark_dirty(&self) {
        self.state.lock().dirty = true;
    }

    fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    fn sync_name(&self, layers: &LayerMap) {
        let mut state = self.state.lock();
        state.resolved = resolve_name(self.template.name(), layers);
    }

    fn sync_full(&self, layers: &LayerMap) -> Result<(), ContextError> {
        self.sync_full_inner(layers)
    }
}

impl<T: ValueType> LayerProvider for ValueCell<T> {
    fn layer_tag(&self) -> String {
        self.state.lock().resolved.base_name()
    }

    fn current_value(&self) -> String {
        self.state.lock().cached.to_config_str()
    }
}

/// Typed configuration cell with a context-resolved name
///
/// Bound against a shared keyset and one coordinator; registration and
/// release of the coordinator slot follow construction and drop.
pub struct ContextualValue<T: ValueType> {
    cell: Arc<ValueCell<T>>,
    coordinator: Arc<Coordinator>,
    slot: SlotId,
}

impl<T: ValueType> std::fmt::Debug for ContextualValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextualValue")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl<T: ValueType> ContextualValue<T> {
    /// Bind a template to a keyset through a context handle.
    ///
    /// Performs the implicit first resolve: the resolved name is looked up in
    /// the keyset and an existing entry is adopted as the cache (the template
    /// default is ignored); a missing entry is materialized from the
    /// template's `default` metadata. With neither, binding fails.
    pub fn new(
        keyset: KeysetHandle,
        context: &ContextHandle,
        template: Key,
    ) -> Result<Self, ContextError> {
        let coordinator = context.coordinator().clone();
        let layers = coordinator.layer_snapshot();
        let resolved = resolve_name(template.name(), &layers);
        let cached = adopt_or_materialize::<T>(&keyset, &template, &resolved)?;
        let cell = Arc::new(ValueCell {
            keyset,
            template,
            state: Mutex::new(CellState {
                resolved,
                cached,
                dirty: false,
            }),
        });
        let slot = coordinator.register(Arc::downgrade(&cell) as Weak<dyn CacheSlot>);
        Ok(ContextualValue {
            cell,
            coordinator,
            slot,
        })
    }

    /// Resolved name as of the last resolve; no recomputation
    pub fn name(&self) -> KeyName {
        self.cell.state.lock().resolved.clone()
    }

    /// Cached content as of the last refresh
    pub fn get(&self) -> T {
        self.cell.state.lock().cached.clone()
    }

    /// Tracked write: insert-or-replace the keyset entry at the resolved
    /// name, update the cache, and set the dirty flag.
    pub fn set(&self, value: T) {
        let mut state = self.cell.state.lock();
        let rendered = state.resolved.to_string();
        let text = value.to_config_str();
        {
            let mut ks = self.cell.keyset.write();
            match ks.lookup_mut(&rendered) {
                Some(key) => key.set_string(text),
                None => {
                    ks.append(Key::from_name(state.resolved.clone()).with_value(text));
                }
            }
        }
        state.cached = value;
        state.dirty = true;
    }

    /// Unconditional single-value full resolve: recompute the name against
    /// the current layer set, adopt-or-materialize at the new name, overwrite
    /// the cache, clear the dirty flag.
    pub fn sync_cache(&self) -> Result<(), ContextError> {
        let layers = self.coordinator.layer_snapshot();
        self.cell.sync_full_inner(&layers)
    }

    pub(crate) fn provider(&self) -> Arc<dyn LayerProvider> {
        self.cell.clone()
    }
}

impl<T: ValueType> Drop for ContextualValue<T> {
    fn drop(&mut self) {
        self.coordinator.release(self.slot);
    }
}

/// Adopt an existing keyset entry at `name`, or materialize the template's
/// declared default into the keyset. The conversion to `T` happens here, at
/// caching time.
fn adopt_or_materialize<T: ValueType>(
    keyset: &KeysetHandle,
    template: &Key,
    name: &KeyName,
) -> Result<T, ContextError> {
    let rendered = name.to_string();
    let mut ks = keyset.write();
    if let Some(found) = ks.lookup(&rendered) {
        let text = found.string_value().unwrap_or_default().to_string();
        return convert::<T>(&rendered, &text);
    }
    match template.meta(META_DEFAULT) {
        Some(default) => {
            let default = default.to_string();
            debug!(name = %rendered, default = %default, "materializing default");
            let value = convert::<T>(&rendered, &default)?;
            ks.append(Key::from_name(name.clone()).with_value(default));
            Ok(value)
        }
        None => Err(ContextError::Configuration { name: rendered }),
    }
}

fn convert<T: ValueType>(name: &str, text: &str) -> Result<T, ContextError> {
    T::from_config_str(text).map_err(|reason| ContextError::Conversion {
        name: name.to_string(),
        value: text.to_string(),
        reason,
    })
}
