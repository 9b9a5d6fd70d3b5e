//! FR-003: Indirection registry for application settings.
//!
//! Every key is bound to a getter/setter pair instead of a raw value, so a
//! caller can install derived or validated settings at any key. Omitted
//! hooks fall back to a plain backing slot. Reading an unbound key is a
//! retrieval failure: logged, answered with an absent value.

use crate::core::types::Value;
use indexmap::IndexMap;
use std::fmt;
use tracing::warn;

/// Installable getter: produces the current value for a key.
pub type GetHook = Box<dyn Fn() -> Option<Value>>;

/// Installable setter: observes every write to a key.
pub type SetHook = Box<dyn Fn(&Value)>;

#[derive(Default)]
struct Binding {
    get: Option<GetHook>,
    set: Option<SetHook>,
    value: Option<Value>,
}

/// Key-value store where all access is indirected through bound hooks.
#[derive(Default)]
pub struct SettingsRegistry {
    bindings: IndexMap<String, Binding>,
}

impl SettingsRegistry {
    pub fn new() -> SettingsRegistry {
        SettingsRegistry::default()
    }

    /// Bind `key`. Either hook may be omitted; the default getter returns
    /// the backing value, the default setter just stores it. Re-defining a
    /// key replaces its hooks and clears the backing value.
    pub fn define(&mut self, key: &str, get: Option<GetHook>, set: Option<SetHook>) {
        self.bindings.insert(
            key.to_string(),
            Binding {
                get,
                set,
                value: None,
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Invoke the bound getter. An unbound key is logged and answered with
    /// `None` rather than propagated.
    pub fn read(&self, key: &str) -> Option<Value> {
        let Some(binding) = self.bindings.get(key) else {
            warn!("failed to retrieve setting '{}': key is not bound", key);
            return None;
        };
        match binding.get {
            Some(ref hook) => hook(),
            None => binding.value.clone(),
        }
    }

    /// Invoke the bound setter and update the backing value consumed by the
    /// default getter. Writing an unbound key installs the default binding.
    pub fn write(&mut self, key: &str, value: Value) {
        let binding = self.bindings.entry(key.to_string()).or_default();
        if let Some(ref hook) = binding.set {
            hook(&value);
        }
        binding.value = Some(value);
    }
}

impl fmt::Debug for SettingsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsRegistry")
            .field("keys", &self.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}
