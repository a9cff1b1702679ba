// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod config;
pub mod directory;
pub mod download;
pub mod error;
pub mod format;
pub mod http;
pub mod player;
pub mod progress;
pub mod store;
pub mod sync;

// Re-export main types for convenience
pub use config::DirectoryConfig;
pub use directory::{DirectoryClient, Episode, Podcast};
pub use download::{download_filename, download_track};
pub use error::{
    ConfigError, DirectoryError, DownloadError, MediaError, PlayerError, StoreError, SurfaceError,
};
pub use format::{format_remaining, format_time};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use player::{PlaybackController, PlaybackRate, PlayerHandle, PlayerState, Source, Track};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use store::{Identity, JsonFileStore, MemoryStore, ProgressStore, StaticAuth, SubscriptionStore};
pub use sync::{SYNC_INTERVAL, run_progress_sync};
