//! Best-effort persistence of the selection state.
//!
//! Reads never fail the caller: a missing, unreadable or malformed value is
//! logged and reported as absent. Writes report failure but are not retried;
//! the next reconciliation pass writes again.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::keys;
use super::policy::SelectionPolicy;
use crate::store::{KeyValueStore, StoreError};

#[derive(Clone)]
pub struct SelectionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionStore").finish_non_exhaustive()
    }
}

impl SelectionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Stored selected ids, or `None` if no selection was ever saved.
    pub async fn get_selected_ids(&self) -> Option<BTreeSet<String>> {
        let raw = match self.kv.get(keys::SELECTED_MEDIA).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored selection, treating as absent");
                return None;
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => Some(ids.into_iter().collect()),
            Err(e) => {
                tracing::warn!(error = %e, "Stored selection is not a JSON id array, treating as absent");
                None
            }
        }
    }

    /// Overwrite the stored selection. Ids are written in sorted order.
    pub async fn set_selected_ids(&self, ids: &BTreeSet<String>) -> Result<(), StoreError> {
        let result = match serde_json::to_string(ids) {
            Ok(value) => self.kv.set(keys::SELECTED_MEDIA, &value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = &result {
            tracing::error!(error = %e, count = ids.len(), "Failed to save selected media");
        }
        result
    }

    /// The "sync all" flag; false when absent or unreadable.
    pub async fn get_sync_all(&self) -> bool {
        match self.kv.get(keys::ALL_SYNC_STATUS).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read sync-all flag, assuming off");
                false
            }
        }
    }

    pub async fn set_sync_all(&self, value: bool) -> Result<(), StoreError> {
        let result = self
            .kv
            .set(keys::ALL_SYNC_STATUS, if value { "true" } else { "false" })
            .await;
        if let Err(e) = &result {
            tracing::error!(error = %e, value, "Failed to save sync-all flag");
        }
        result
    }

    /// Turn sync-all on, seeding an empty selection first when none is stored
    /// so the next reconciliation has something to refresh.
    ///
    /// Returns whether a selection was seeded. If seeding fails the flag is
    /// left untouched.
    pub async fn enable_sync_all(&self) -> Result<bool, StoreError> {
        let seeded = if self.get_selected_ids().await.is_none() {
            self.set_selected_ids(&BTreeSet::new()).await?;
            true
        } else {
            false
        };
        self.set_sync_all(true).await?;
        Ok(seeded)
    }

    /// Both persisted values as a policy, or `None` if no selection was ever saved.
    pub async fn load_policy(&self) -> Option<SelectionPolicy> {
        let stored = self.get_selected_ids().await?;
        if self.get_sync_all().await {
            Some(SelectionPolicy::AllMedia { last_known: stored })
        } else {
            Some(SelectionPolicy::Explicit(stored))
        }
    }
}
