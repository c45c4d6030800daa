//! In-memory blob store.
//!
//! Stands in for browser object URLs on the web platform: image bytes are
//! registered under a `blob:` URL, fetched back by the encoder, and revoked
//! by cleanup. Cheap to clone; all clones share the same map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const BLOB_SCHEME: &str = "blob:snaptext/";

/// A fetched blob: bytes plus their declared mime type.
#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Arc<[u8]>,
    pub mime: String,
}

#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    entries: Arc<Mutex<HashMap<String, Blob>>>,
    next_id: Arc<AtomicU64>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return the URL that refers to them.
    pub fn insert(&self, bytes: Vec<u8>, mime: &str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}{}", BLOB_SCHEME, id);
        self.lock().insert(
            url.clone(),
            Blob {
                bytes: bytes.into(),
                mime: mime.to_string(),
            },
        );
        url
    }

    pub fn fetch(&self, url: &str) -> Option<Blob> {
        self.lock().get(url).cloned()
    }

    /// Drop the entry. Returns whether it was still registered.
    pub fn revoke(&self, url: &str) -> bool {
        self.lock().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the map half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Blob>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
