//! In-memory registry of active torrent handles.

use std::collections::HashMap;
use std::sync::RwLock;

/// Map of info-hash to handle, guarded by one lock.
///
/// Keys are normalized to lowercase so lookups are case-insensitive.
/// Mutation goes through `insert`/`remove`; reads take the lock briefly to
/// clone out a handle or a snapshot of all handles.
pub struct HandleRegistry<T: Clone> {
    handles: RwLock<HashMap<String, T>>,
}

impl<T: Clone> HandleRegistry<T> {
    pub fn new() -> Self {
        Self {
            handles: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, info_hash: &str) -> Option<T> {
        self.handles
            .read()
            .unwrap()
            .get(&info_hash.to_lowercase())
            .cloned()
    }

    pub fn contains(&self, info_hash: &str) -> bool {
        self.handles
            .read()
            .unwrap()
            .contains_key(&info_hash.to_lowercase())
    }

    pub fn insert(&self, info_hash: &str, handle: T) {
        self.handles
            .write()
            .unwrap()
            .insert(info_hash.to_lowercase(), handle);
    }

    pub fn remove(&self, info_hash: &str) -> Option<T> {
        self.handles
            .write()
            .unwrap()
            .remove(&info_hash.to_lowercase())
    }

    /// Clone out all handles with their keys.
    pub fn snapshot(&self) -> Vec<(String, T)> {
        self.handles
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handles.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().unwrap().is_empty()
    }
}

impl<T: Clone> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
