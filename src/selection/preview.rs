//! Screen-facing views of the selection: a decorated preview of the library
//! and an editable draft that saves back through [`SelectionStore`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::store::SelectionStore;
use crate::media::{MediaAsset, MediaError, MediaLibrary};
use crate::store::StoreError;
use crate::types::MediaKind;

/// Number of assets shown by a preview unless told otherwise.
pub const DEFAULT_PREVIEW_LIMIT: usize = 20;

/// A library asset decorated with its selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewItem {
    pub id: String,
    pub uri: String,
    pub kind: MediaKind,
    pub is_selected: bool,
}

/// The first `limit` assets of the library with their selection state.
///
/// Under sync-all every asset shows as selected.
pub async fn preview(
    library: &dyn MediaLibrary,
    store: &SelectionStore,
    limit: usize,
) -> Result<Vec<PreviewItem>, MediaError> {
    let stored = store.get_selected_ids().await.unwrap_or_default();
    let sync_all = store.get_sync_all().await;

    let items = library
        .enumerate(&MediaKind::ALL)
        .await?
        .into_iter()
        .take(limit)
        .map(|asset| PreviewItem {
            is_selected: sync_all || stored.contains(&asset.id),
            id: asset.id,
            uri: asset.uri,
            kind: asset.kind,
        })
        .collect();

    Ok(items)
}

/// Editable selection over the whole library.
///
/// Only ids present in the library can be selected, so a saved draft never
/// contains stale ids.
#[derive(Debug, Clone, Default)]
pub struct SelectionDraft {
    items: BTreeMap<String, bool>,
}

impl SelectionDraft {
    /// Build a draft from the full library listing and the stored selection.
    pub fn from_parts(assets: &[MediaAsset], stored: &BTreeSet<String>) -> Self {
        let items = assets
            .iter()
            .map(|asset| (asset.id.clone(), stored.contains(&asset.id)))
            .collect();
        Self { items }
    }

    /// Load a draft from the library and the stored explicit selection.
    pub async fn load(
        library: &dyn MediaLibrary,
        store: &SelectionStore,
    ) -> Result<Self, MediaError> {
        let assets = library.enumerate(&MediaKind::ALL).await?;
        let stored = store.get_selected_ids().await.unwrap_or_default();
        Ok(Self::from_parts(&assets, &stored))
    }

    /// Flip the selection of `id`. Returns the new state, or `None` if the id
    /// is not in the library.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let selected = self.items.get_mut(id)?;
        *selected = !*selected;
        Some(*selected)
    }

    /// Set the selection of `id`. Returns false if the id is not in the library.
    pub fn set(&mut self, id: &str, selected: bool) -> bool {
        match self.items.get_mut(id) {
            Some(slot) => {
                *slot = selected;
                true
            }
            None => false,
        }
    }

    /// Deselect everything, then select exactly `ids`. Returns the ids that
    /// are not in the library.
    pub fn select_only<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        for selected in self.items.values_mut() {
            *selected = false;
        }
        ids.into_iter()
            .filter(|id| !self.set(id, true))
            .map(str::to_string)
            .collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.items.get(id).copied().unwrap_or(false)
    }

    pub fn selected_ids(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of assets in the library.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Persist the selected ids, replacing the stored selection.
    pub async fn save(&self, store: &SelectionStore) -> Result<BTreeSet<String>, StoreError> {
        let ids = self.selected_ids();
        store.set_selected_ids(&ids).await?;
        tracing::info!(selected = ids.len(), "Saved media selection");
        Ok(ids)
    }
}
