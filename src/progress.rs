// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;

/// Events emitted while saving an episode's audio to disk
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A download is starting
    DownloadStarting {
        title: String,
        /// Expected content length in bytes, if known
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        title: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// Download is being finalized (renamed from .partial)
    Finalizing { title: String },

    /// A download completed successfully
    DownloadCompleted {
        title: String,
        path: PathBuf,
        bytes_downloaded: u64,
    },

    /// A download failed
    DownloadFailed { title: String, error: String },
}

/// Trait for reporting download progress.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
