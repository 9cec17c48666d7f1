//! In-memory collaborators for exercising selection logic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::media::{MediaAsset, MediaError, MediaLibrary, PermissionStatus};
use crate::store::{KeyValueStore, StoreError};
use crate::types::MediaKind;

/// Media library whose contents tests set directly.
#[derive(Default)]
pub(crate) struct FakeLibrary {
    assets: Mutex<Vec<MediaAsset>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FakeLibrary {
    pub(crate) fn with_ids(ids: &[&str]) -> Self {
        let library = Self::default();
        library.replace(ids);
        library
    }

    /// Replace the library contents. Ids ending in `.mov` are videos.
    pub(crate) fn replace(&self, ids: &[&str]) {
        let assets = ids
            .iter()
            .map(|id| MediaAsset {
                id: id.to_string(),
                uri: format!("file:///library/{id}"),
                kind: if id.ends_with(".mov") {
                    MediaKind::Video
                } else {
                    MediaKind::Photo
                },
            })
            .collect();
        *self.assets.lock().unwrap() = assets;
    }

    pub(crate) fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn enumerate_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaLibrary for FakeLibrary {
    async fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request_permission(&self) -> Result<PermissionStatus, MediaError> {
        Ok(PermissionStatus::Granted)
    }

    async fn enumerate(&self, kinds: &[MediaKind]) -> Result<Vec<MediaAsset>, MediaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MediaError::Io(std::io::Error::other("library unavailable")));
        }
        let mut assets: Vec<MediaAsset> = self
            .assets
            .lock()
            .unwrap()
            .iter()
            .filter(|a| kinds.contains(&a.kind))
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }
}

/// Key-value store that records writes and can be told to fail.
#[derive(Default)]
pub(crate) struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn with(entries: &[(&str, &str)]) -> Self {
        let store = Self::default();
        {
            let mut values = store.values.lock().unwrap();
            for (k, v) in entries {
                values.insert(k.to_string(), v.to_string());
            }
        }
        store
    }

    pub(crate) fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Query("read failed".to_string()));
        }
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Query("disk full".to_string()));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }
}
