//! Directory-backed media library.
//!
//! A directory tree stands in for the device photo library: every photo or
//! video file below the root is an asset, identified by its path relative to
//! the root.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use walkdir::{DirEntry, WalkDir};

use super::{MediaAsset, MediaError, MediaLibrary, PermissionStatus};
use crate::types::MediaKind;

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "heic", "heif", "gif", "webp", "tif", "tiff", "bmp", "dng", "cr2",
    "nef", "arw",
];

const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "m4v", "avi", "mkv", "3gp", "webm"];

#[derive(Debug, Clone)]
pub struct FsMediaLibrary {
    root: PathBuf,
}

impl FsMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Media kind for a file, by case-insensitive extension.
pub(crate) fn classify(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Photo)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Build the asset id from a root-relative path, always `/`-separated.
///
/// Returns `None` when any component is not valid UTF-8, since a lossy
/// conversion could give two files the same id.
fn asset_id(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn scan(root: &Path, kinds: &[MediaKind]) -> Result<Vec<MediaAsset>, MediaError> {
    if !root.is_dir() {
        return Err(MediaError::MissingRoot(root.to_path_buf()));
    }
    let root = root.canonicalize()?;

    let mut assets = Vec::new();
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        // A partial listing would read as deletions, so any unreadable entry
        // fails the whole scan.
        let entry = entry.map_err(|source| {
            let path = source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.clone());
            MediaError::Walk { path, source }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = classify(entry.path()) else {
            continue;
        };
        if !kinds.contains(&kind) {
            continue;
        }

        let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
        let Some(id) = asset_id(relative) else {
            tracing::warn!(
                path = %entry.path().display(),
                "Skipping media file with a non-UTF-8 name"
            );
            continue;
        };
        assets.push(MediaAsset {
            id,
            uri: format!("file://{}", entry.path().display()),
            kind,
        });
    }

    assets.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(assets)
}

#[async_trait]
impl MediaLibrary for FsMediaLibrary {
    async fn permission_status(&self) -> PermissionStatus {
        match tokio::fs::read_dir(&self.root).await {
            Ok(_) => PermissionStatus::Granted,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PermissionStatus::Undetermined,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => PermissionStatus::Denied,
            Err(e) => {
                tracing::warn!(
                    root = %self.root.display(),
                    error = %e,
                    "Cannot read media library root, treating as denied"
                );
                PermissionStatus::Denied
            }
        }
    }

    async fn request_permission(&self) -> Result<PermissionStatus, MediaError> {
        if self.permission_status().await == PermissionStatus::Undetermined {
            tracing::info!(root = %self.root.display(), "Creating media library root");
            tokio::fs::create_dir_all(&self.root).await?;
        }
        Ok(self.permission_status().await)
    }

    async fn enumerate(&self, kinds: &[MediaKind]) -> Result<Vec<MediaAsset>, MediaError> {
        let root = self.root.clone();
        let kinds = kinds.to_vec();
        let assets = tokio::task::spawn_blocking(move || scan(&root, &kinds)).await??;
        tracing::debug!(
            root = %self.root.display(),
            count = assets.len(),
            "Enumerated media library"
        );
        Ok(assets)
    }
}
