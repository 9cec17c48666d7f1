//! Keys of the persisted selection state.

/// JSON array of the media ids selected for sync.
pub const SELECTED_MEDIA: &str = "selectedMedia";

/// `"true"` when every asset in the library should be synced.
pub const ALL_SYNC_STATUS: &str = "allSyncStatus";
