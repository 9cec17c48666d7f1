//! Reconciliation of the stored selection against the live media library.
//!
//! Under sync-all the stored ids are refreshed to the whole library, picking
//! up additions and deletions. An explicit selection is only ever narrowed by
//! deletions: ids the user never chose are not added.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use super::policy::SelectionPolicy;
use super::store::SelectionStore;
use crate::media::{MediaError, MediaLibrary};
use crate::types::MediaKind;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to enumerate media library: {0}")]
    Enumeration(#[from] MediaError),
}

/// Result of a completed reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The corrected selection, sorted.
    pub ids: Vec<String>,
    pub sync_all: bool,
    /// Stored ids dropped because they are gone from the library.
    pub removed: usize,
    /// Library ids added (sync-all only).
    pub added: usize,
    /// Whether the corrected selection was written back.
    pub persisted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No selection was ever stored; nothing was read from the library or written.
    NoSelection,
    Reconciled(Reconciliation),
}

impl ReconcileOutcome {
    pub fn ids(&self) -> Option<&[String]> {
        match self {
            ReconcileOutcome::NoSelection => None,
            ReconcileOutcome::Reconciled(r) => Some(&r.ids),
        }
    }
}

/// Corrected selection for `policy` given the ids currently in the library.
pub fn reconcile_ids(policy: &SelectionPolicy, live: &BTreeSet<String>) -> BTreeSet<String> {
    match policy {
        SelectionPolicy::AllMedia { .. } => live.clone(),
        SelectionPolicy::Explicit(stored) => stored.intersection(live).cloned().collect(),
    }
}

/// Keeps the stored selection consistent with the media library.
///
/// Invocations are not serialized. Two passes racing against an unchanged
/// library compute the same set, so whichever write lands last is correct.
#[derive(Clone)]
pub struct Reconciler {
    library: Arc<dyn MediaLibrary>,
    store: SelectionStore,
}

impl Reconciler {
    pub fn new(library: Arc<dyn MediaLibrary>, store: SelectionStore) -> Self {
        Self { library, store }
    }

    /// Run one reconciliation pass.
    ///
    /// Only a failed enumeration is an error. Unreadable stored state counts
    /// as no selection, and a failed write is reported through
    /// [`Reconciliation::persisted`] for the next pass to repair.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome, ReconcileError> {
        tracing::debug!("Reconciling stored selection with media library");

        let Some(policy) = self.store.load_policy().await else {
            tracing::info!("No stored selection, skipping reconciliation");
            return Ok(ReconcileOutcome::NoSelection);
        };

        let live: BTreeSet<String> = self
            .library
            .enumerate(&MediaKind::ALL)
            .await?
            .into_iter()
            .map(|asset| asset.id)
            .collect();

        let corrected = reconcile_ids(&policy, &live);
        let stored = policy.stored_ids();
        let removed = stored.difference(&corrected).count();
        let added = corrected.difference(stored).count();

        // The store logs the failure; the next pass writes again.
        let persisted = self.store.set_selected_ids(&corrected).await.is_ok();

        tracing::info!(
            sync_all = policy.is_sync_all(),
            library = live.len(),
            selected = corrected.len(),
            removed,
            added,
            persisted,
            "Selection reconciled"
        );

        Ok(ReconcileOutcome::Reconciled(Reconciliation {
            ids: corrected.into_iter().collect(),
            sync_all: policy.is_sync_all(),
            removed,
            added,
            persisted,
        }))
    }
}
