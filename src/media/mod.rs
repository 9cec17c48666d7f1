//! Device media library collaborator.
//!
//! The selector never owns media; it only needs a complete, current listing of
//! photo and video assets with stable ids, plus a way to ask for access.

pub mod error;
pub mod fs;

use async_trait::async_trait;

use crate::types::MediaKind;

pub use error::MediaError;
pub use fs::FsMediaLibrary;

/// A photo or video as reported by the media library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// Stable, unique identifier for the asset.
    pub id: String,
    /// Locator the platform can resolve to the underlying file.
    pub uri: String,
    pub kind: MediaKind,
}

/// Access state of the media library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Access has never been requested.
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::Undetermined => "undetermined",
        }
    }
}

#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Current access state, without prompting.
    async fn permission_status(&self) -> PermissionStatus;

    /// Ask for access and return the resulting state.
    async fn request_permission(&self) -> Result<PermissionStatus, MediaError>;

    /// List every asset of the given kinds, sorted by id.
    ///
    /// The listing is never paginated: callers that diff against it rely on it
    /// being the whole library at call time.
    async fn enumerate(&self, kinds: &[MediaKind]) -> Result<Vec<MediaAsset>, MediaError>;
}
