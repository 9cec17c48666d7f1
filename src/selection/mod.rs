//! Media selection state and its reconciliation against the library.
//!
//! The persisted state is two values in the key-value store: the ids marked
//! for sync and the "sync all" flag. [`SelectionStore`] reads and writes them
//! with best-effort semantics, and [`Reconciler`] corrects the stored ids
//! whenever the library may have changed underneath them.

pub mod keys;
pub mod policy;
pub mod preview;
pub mod reconcile;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use preview::{preview, SelectionDraft, DEFAULT_PREVIEW_LIMIT};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use store::SelectionStore;
