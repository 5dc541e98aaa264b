//! Per-device key/value storage (the browser's local storage).
//!
//! Shared by every tab of a browser with no locking; last write wins.

use std::collections::HashMap;
use std::sync::RwLock;

pub mod keys {
    pub const GUEST_CREDITS: &str = "PixelScaleAI_guest_credits";
    pub const REFERRER: &str = "PixelScaleAI_referrer";
    pub const COOKIE_CONSENT: &str = "PixelScaleAI_cookie_consent";
    pub const LANGUAGE: &str = "PixelScaleAI_language";
}

pub trait LocalDeviceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryDeviceStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `entries`.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        for (key, value) in entries {
            store.set(key, value);
        }
        store
    }
}

impl LocalDeviceStore for MemoryDeviceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryDeviceStore::new();
        assert_eq!(store.get(keys::REFERRER), None);
        store.set(keys::REFERRER, "abc");
        assert_eq!(store.get(keys::REFERRER).as_deref(), Some("abc"));
        store.set(keys::REFERRER, "def");
        assert_eq!(store.get(keys::REFERRER).as_deref(), Some("def"));
        store.remove(keys::REFERRER);
        assert_eq!(store.get(keys::REFERRER), None);
    }

    #[test]
    fn test_with_entries() {
        let store = MemoryDeviceStore::with_entries([(keys::LANGUAGE, "en")]);
        assert_eq!(store.get(keys::LANGUAGE).as_deref(), Some("en"));
    }
}
