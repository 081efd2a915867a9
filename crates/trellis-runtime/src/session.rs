//! Flash session storage.
//!
//! A flash session is a short-lived session namespace that carries data
//! (typically flash messages) across one redirect. Its id travels in the
//! `_fid` request parameter; redirect links keep it alive.
//!
//! ```text
//! request 1: flash_session() ──► id "a3f0" ──► namespace "Trellis.Flash/a3f0"
//!            redirect link   ──► ...?_fid=a3f0
//! request 2: has_flash_session() == true ──► data still readable
//! ```
//!
//! Storage itself is a collaborator ([`SessionStore`]). The engine only
//! opens namespaces and sets their expiration at shutdown.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use trellis_types::Params;

/// Namespace prefix of flash sessions.
pub const FLASH_NAMESPACE_PREFIX: &str = "Trellis.Flash/";

/// Namespace-scoped key/value session store.
pub trait SessionStore: Send + Sync {
    /// Returns `true` if the namespace exists.
    fn has_namespace(&self, namespace: &str) -> bool;

    /// Creates the namespace if it does not exist yet.
    fn open_namespace(&self, namespace: &str);

    fn get(&self, namespace: &str, key: &str) -> Option<Value>;

    /// Stores a value, creating the namespace when needed.
    fn set(&self, namespace: &str, key: &str, value: Value);

    /// Makes the namespace expire `seconds` from now.
    fn set_expiration(&self, namespace: &str, seconds: u64);
}

/// Returns the session namespace of flash id `id`.
#[must_use]
pub fn flash_namespace(id: &str) -> String {
    format!("{FLASH_NAMESPACE_PREFIX}{id}")
}

/// Generates a fresh 4-character hexadecimal flash id.
#[must_use]
pub fn generate_flash_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(4).collect()
}

/// Handle to one open flash namespace.
#[derive(Clone)]
pub struct FlashSession {
    id: String,
    namespace: String,
    store: Arc<dyn SessionStore>,
}

impl FlashSession {
    /// Opens (creating if needed) the flash namespace for `id`.
    pub fn open(id: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        let id = id.into();
        let namespace = flash_namespace(&id);
        store.open_namespace(&namespace);
        Self {
            id,
            namespace,
            store,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(&self.namespace, key)
    }

    pub fn set(&self, key: &str, value: Value) {
        self.store.set(&self.namespace, key, value);
    }
}

impl fmt::Debug for FlashSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashSession")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[derive(Debug, Default)]
struct Namespace {
    values: Params,
    expiration: Option<u64>,
}

/// In-memory [`SessionStore`].
///
/// Expirations are recorded, not enforced.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    namespaces: Mutex<HashMap<String, Namespace>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expiration last set for `namespace`.
    #[must_use]
    pub fn expiration(&self, namespace: &str) -> Option<u64> {
        self.namespaces
            .lock()
            .get(namespace)
            .and_then(|ns| ns.expiration)
    }

    /// Names of all namespaces.
    #[must_use]
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl SessionStore for MemorySessionStore {
    fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.lock().contains_key(namespace)
    }

    fn open_namespace(&self, namespace: &str) {
        self.namespaces
            .lock()
            .entry(namespace.to_string())
            .or_default();
    }

    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        self.namespaces
            .lock()
            .get(namespace)
            .and_then(|ns| ns.values.get(key).cloned())
    }

    fn set(&self, namespace: &str, key: &str, value: Value) {
        self.namespaces
            .lock()
            .entry(namespace.to_string())
            .or_default()
            .values
            .insert(key.to_string(), value);
    }

    fn set_expiration(&self, namespace: &str, seconds: u64) {
        if let Some(ns) = self.namespaces.lock().get_mut(namespace) {
            ns.expiration = Some(seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flash_id_is_four_hex_chars() {
        let id = generate_flash_id();
        assert_eq!(id.len(), 4);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn open_creates_namespace() {
        let store = Arc::new(MemorySessionStore::new());
        let flash = FlashSession::open("ab12", store.clone());
        assert_eq!(flash.namespace(), "Trellis.Flash/ab12");
        assert!(store.has_namespace("Trellis.Flash/ab12"));

        flash.set("message", json!("Saved."));
        assert_eq!(flash.get("message"), Some(json!("Saved.")));
    }

    #[test]
    fn expiration_only_applies_to_existing_namespaces() {
        let store = MemorySessionStore::new();
        store.set_expiration("missing", 3);
        assert!(!store.has_namespace("missing"));

        store.open_namespace("present");
        store.set_expiration("present", 30);
        assert_eq!(store.expiration("present"), Some(30));
    }
}
