//! Process-wide named feature flags.
//!
//! Flags are plain booleans the scheduler consults per request. Unset
//! flags read as disabled.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::info;

/// Mutable registry of feature flags.
pub struct FlagStore {
    inner: RwLock<BTreeMap<String, bool>>,
}

impl FlagStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// Flag value, defaulting to false when unset.
    pub fn get(&self, name: &str) -> bool {
        let flags = self.inner.read().expect("flags lock poisoned");
        flags.get(name).copied().unwrap_or(false)
    }

    pub fn set(&self, name: &str, enabled: bool) {
        let mut flags = self.inner.write().expect("flags lock poisoned");
        flags.insert(name.to_string(), enabled);
        info!(flag = %name, enabled, "feature flag set");
    }

    /// Remove a flag. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        let mut flags = self.inner.write().expect("flags lock poisoned");
        flags.remove(name).is_some()
    }

    pub fn list(&self) -> BTreeMap<String, bool> {
        self.inner.read().expect("flags lock poisoned").clone()
    }
}

impl Default for FlagStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flag_reads_false() {
        let store = FlagStore::new();
        assert!(!store.get("prefer_cost_optimization"));
    }

    #[test]
    fn set_and_get() {
        let store = FlagStore::new();
        store.set("prefer_cost_optimization", true);
        assert!(store.get("prefer_cost_optimization"));
        store.set("prefer_cost_optimization", false);
        assert!(!store.get("prefer_cost_optimization"));
    }

    #[test]
    fn delete_removes_flag() {
        let store = FlagStore::new();
        store.set("beta", true);
        assert!(store.delete("beta"));
        assert!(!store.delete("beta"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn list_returns_all_flags() {
        let store = FlagStore::new();
        store.set("a", true);
        store.set("b", false);
        let flags = store.list();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.get("a"), Some(&true));
        assert_eq!(flags.get("b"), Some(&false));
    }
}
