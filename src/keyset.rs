//! Keyset: ordered, name-unique collection of keys with cascading lookup.

use crate::key::{Key, KeyName, Namespace};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared keyset handle
///
/// A keyset is not safe for unsynchronized concurrent mutation; sharing one
/// across contextual values or threads goes through this lock, and writers
/// serialize on it.
pub type KeysetHandle = Arc<RwLock<Keyset>>;

/// Ordered, name-unique collection of [`Key`] entries
///
/// Entries are keyed by canonical rendered name, so iteration order is
/// deterministic and insert/lookup are O(log n).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keyset {
    entries: BTreeMap<String, Key>,
}

impl Keyset {
    pub fn new() -> Self {
        Keyset::default()
    }

    /// Wrap this keyset in a shared handle
    pub fn into_shared(self) -> KeysetHandle {
        Arc::new(RwLock::new(self))
    }

    /// Insert-or-replace by name; returns the replaced entry, if any
    pub fn append(&mut self, key: Key) -> Option<Key> {
        self.entries.insert(key.name().to_string(), key)
    }

    /// Exact or cascading lookup
    ///
    /// A namespaced name is matched exactly. A cascading name (leading `/`)
    /// tries the namespace roots in fixed priority order and falls back to
    /// the cascading name itself; the first present entry wins.
    pub fn lookup(&self, name: &str) -> Option<&Key> {
        if name.starts_with('/') {
            for namespace in Namespace::cascade_order() {
                let candidate = format!("{}{}", namespace.prefix(), name);
                if let Some(key) = self.entries.get(&candidate) {
                    return Some(key);
                }
            }
        }
        self.entries.get(name)
    }

    /// Exact lookup by rendered name, no cascading
    pub fn get(&self, name: &str) -> Option<&Key> {
        self.entries.get(name)
    }

    /// Mutable variant of [`lookup`](Self::lookup), same match order
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Key> {
        let resolved = self.resolve_entry_name(name)?;
        self.entries.get_mut(&resolved)
    }

    /// Lookup by structured name
    pub fn lookup_name(&self, name: &KeyName) -> Option<&Key> {
        self.lookup(&name.to_string())
    }

    pub fn remove(&mut self, name: &str) -> Option<Key> {
        let resolved = self.resolve_entry_name(name)?;
        self.entries.remove(&resolved)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name-ordered iteration over entries
    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.entries.values()
    }

    fn resolve_entry_name(&self, name: &str) -> Option<String> {
        if name.starts_with('/') {
            for namespace in Namespace::cascade_order() {
                let candidate = format!("{}{}", namespace.prefix(), name);
                if self.entries.contains_key(&candidate) {
                    return Some(candidate);
                }
            }
        }
        self.entries.contains_key(name).then(|| name.to_string())
    }
}

impl FromIterator<Key> for Keyset {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        let mut ks = Keyset::new();
        for key in iter {
            ks.append(key);
        }
        ks
    }
}
