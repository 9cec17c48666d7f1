use clap::{Args, Parser, Subcommand};

use crate::selection::DEFAULT_PREVIEW_LIMIT;
use crate::types::{LogLevel, Toggle};

#[derive(Parser, Debug)]
#[command(
    name = "photon-sync",
    version,
    about = "Choose which local photos and videos to sync"
)]
pub struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the media library and the selection database live.
#[derive(Args, Debug, Clone)]
pub struct LibraryArgs {
    /// Media library directory
    #[arg(short = 'l', long, env = "PHOTON_LIBRARY")]
    pub library: String,

    /// Directory for the selection database
    #[arg(long, env = "PHOTON_STATE_DIR", default_value = "~/.photon-sync")]
    pub state_dir: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Request access to the media library
    Init(LibraryOnlyArgs),

    /// Show selection and library status
    Status(LibraryOnlyArgs),

    /// List library media with their selection state
    Preview(PreviewArgs),

    /// Mark media for sync
    Select(EditArgs),

    /// Unmark media for sync
    Deselect(EditArgs),

    /// Flip the selection state of media
    Toggle(EditArgs),

    /// Replace the selection with exactly the given media
    Save(SaveArgs),

    /// Turn "sync all media" on or off
    SyncAll(SyncAllArgs),

    /// Correct the stored selection against the current library
    Reconcile(LibraryOnlyArgs),

    /// Reconcile now, then again whenever the app is resumed
    Watch(WatchArgs),
}

impl Command {
    pub fn library_args(&self) -> &LibraryArgs {
        match self {
            Command::Init(args) | Command::Status(args) | Command::Reconcile(args) => {
                &args.library
            }
            Command::Preview(args) => &args.library,
            Command::Select(args) | Command::Deselect(args) | Command::Toggle(args) => {
                &args.library
            }
            Command::Save(args) => &args.library,
            Command::SyncAll(args) => &args.library,
            Command::Watch(args) => &args.library,
        }
    }
}

#[derive(Args, Debug)]
pub struct LibraryOnlyArgs {
    #[command(flatten)]
    pub library: LibraryArgs,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub library: LibraryArgs,

    /// Number of media to show
    #[arg(long, default_value_t = DEFAULT_PREVIEW_LIMIT)]
    pub limit: usize,

    /// Print the preview as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    #[command(flatten)]
    pub library: LibraryArgs,

    /// Media ids (paths relative to the library)
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    #[command(flatten)]
    pub library: LibraryArgs,

    /// Media ids to keep selected; none clears the selection
    pub ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SyncAllArgs {
    #[command(flatten)]
    pub library: LibraryArgs,

    #[arg(value_enum)]
    pub value: Toggle,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub library: LibraryArgs,

    /// Seconds between automatic resumes
    #[arg(long, default_value_t = 300)]
    pub interval: u64,
}
