//! Revocable in-memory render resources.
//!
//! [`BlobStore::create`] registers a byte buffer under a fresh `blob:` URI
//! and returns the only [`RenderHandle`] for it. The URI resolves until the
//! handle is released, either explicitly through [`RenderHandle::release`]
//! or by dropping it, so a superseded page can never keep its buffer alive
//! in the store.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::debug;
use uuid::Uuid;

pub const PDF_MIME: &str = "application/pdf";

const URI_PREFIX: &str = "blob:pagecheck/";

/// Registered bytes plus their MIME type.
#[derive(Debug)]
pub struct Blob {
    bytes: Arc<[u8]>,
    mime: String,
}

impl Blob {
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }
}

type Entries = HashMap<String, Arc<Blob>>;

/// Registry of live blob URIs. Cheap to clone; clones share the registry.
#[derive(Clone, Default)]
pub struct BlobStore {
    entries: Arc<Mutex<Entries>>,
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("live", &self.live_count())
            .finish()
    }
}

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and hand out the owning handle.
    pub fn create(&self, bytes: Vec<u8>, mime: &str) -> RenderHandle {
        let uri = format!("{URI_PREFIX}{}", Uuid::new_v4());
        let blob = Arc::new(Blob {
            bytes: Arc::from(bytes),
            mime: mime.to_string(),
        });
        lock(&self.entries).insert(uri.clone(), Arc::clone(&blob));
        debug!("Created {} ({} bytes)", uri, blob.bytes.len());

        RenderHandle {
            uri,
            blob,
            store: Arc::downgrade(&self.entries),
            released: false,
        }
    }

    /// Look up a live URI.
    pub fn resolve(&self, uri: &str) -> Option<Arc<Blob>> {
        lock(&self.entries).get(uri).cloned()
    }

    /// Number of URIs not yet revoked.
    pub fn live_count(&self) -> usize {
        lock(&self.entries).len()
    }
}

/// Sole owner of one registered blob. Revokes its URI when released or dropped.
pub struct RenderHandle {
    uri: String,
    blob: Arc<Blob>,
    store: Weak<Mutex<Entries>>,
    released: bool,
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandle")
            .field("uri", &self.uri)
            .field("len", &self.blob.bytes.len())
            .finish()
    }
}

impl RenderHandle {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.blob.bytes
    }

    pub fn mime(&self) -> &str {
        &self.blob.mime
    }

    pub fn len(&self) -> usize {
        self.blob.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.bytes.is_empty()
    }

    /// Revoke the URI now.
    pub fn release(mut self) {
        self.revoke();
    }

    fn revoke(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(entries) = self.store.upgrade() {
            lock(&entries).remove(&self.uri);
            debug!("Revoked {}", self.uri);
        }
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        self.revoke();
    }
}
