// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to the podcast directory API
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Directory request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Directory returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to decode directory response from {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Directory returned error status for {endpoint}: {description}")]
    ApiStatus {
        endpoint: String,
        description: String,
    },

    #[error("Invalid directory URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Batch lookups take between 1 and {max} ids, got {count}")]
    BatchSize { count: usize, max: usize },
}

/// Errors that can occur during episode downloads
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to create file {path}: {source}")]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream error while downloading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to move finished download to {path}: {source}")]
    FinalizeFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by a media primitive
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    #[error("Playback request was rejected: {0}")]
    PlayRejected(String),

    #[error("Failed to decode media: {0}")]
    Decode(String),

    #[error("Media source is not supported: {0}")]
    UnsupportedSource(String),
}

/// Errors that can occur when reading or writing the progress and
/// subscription stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Failed to read store file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write store file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse store JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize store: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),

    #[error("Store is unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the playback controller's public surface
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    #[error("No player is active in this scope; wrap the caller in player::scope")]
    OutsideScope,

    #[error("Unsupported playback rate {0}; expected one of 0.5, 1, 1.5, 2, 3")]
    InvalidPlaybackRate(f64),
}

/// Errors in application configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Podcast Index API credentials are required; set PODCAST_INDEX_API_KEY and PODCAST_INDEX_API_SECRET"
    )]
    MissingCredentials,

    #[error("Invalid directory base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

/// Errors reported by a system media-session surface
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Media session surface is unavailable")]
    Unavailable,

    #[error("Media session update failed: {0}")]
    Failed(String),
}
