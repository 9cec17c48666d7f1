use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading the media library.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media library root {} does not exist", .0.display())]
    MissingRoot(PathBuf),

    #[error("Failed to list media under {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Disk error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to spawn blocking task: {0}")]
    Spawn(#[from] tokio::task::JoinError),
}
