//! Survey of DLIS well-log files.
//!
//! Walks a root holding one folder per well, opens every matching file and
//! condenses each into a [`SummaryRecord`]: size, well, whether it could be
//! opened and how many logical files it holds.

pub mod dlis;
pub mod error;
pub mod frames;
pub mod loader;
pub mod presenter;
pub mod progress;
pub mod report;
pub mod size;
pub mod walker;

pub use error::{Error, Result};
pub use loader::{load_file, DlisLoader, LoadResult, Loader};
pub use report::{build_report, SummaryRecord};
pub use walker::{file_tags, find_duplicate_tags, Extensions, FileTag};

use tracing_subscriber::EnvFilter;

/// Logs to stderr around any progress bar, filtered by `RUST_LOG` (default
/// `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(progress::log_writer)
        .init();
}
