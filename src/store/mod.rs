// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-user listening progress and subscriptions.
//!
//! Every operation takes the caller's identity. Writes without one fail with
//! [`StoreError::NotAuthenticated`]; reads without one come back empty.

mod auth;
mod data;
mod file;
mod memory;

pub use auth::{AuthProvider, Identity, SharedAuth, StaticAuth};
pub use file::{JsonFileStore, STORE_FILENAME};
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Page size used when the caller does not pick one
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One progress write for the signed-in user
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub episode_id: u64,
    pub podcast_id: u64,
    /// Seconds
    pub current_time: f64,
    /// Seconds
    pub duration: f64,
}

/// Saved progress of one user on one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: String,
    pub episode_id: u64,
    pub podcast_id: u64,
    pub current_time: f64,
    pub duration: f64,
    /// Milliseconds since the Unix epoch
    pub last_listened_at: i64,
}

impl ProgressRecord {
    /// Fraction listened, in `[0, 1]`; 0 when the duration is unknown
    pub fn fraction(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub user_id: String,
    pub podcast_id: u64,
    /// Milliseconds since the Unix epoch
    pub subscribed_at: i64,
}

/// One page of listening history, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryPage {
    pub items: Vec<ProgressRecord>,
    /// Pass back as `cursor` to fetch the next page; `None` on the last page
    pub next_cursor: Option<i64>,
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Insert or update the caller's progress on an episode
    async fn update_progress(
        &self,
        identity: Option<&Identity>,
        update: &ProgressUpdate,
    ) -> Result<(), StoreError>;

    async fn episode_progress(
        &self,
        identity: Option<&Identity>,
        episode_id: u64,
    ) -> Result<Option<ProgressRecord>, StoreError>;

    /// Records listened to strictly before `cursor` (milliseconds), newest
    /// first, at most `limit` (default [`DEFAULT_HISTORY_LIMIT`]) of them
    async fn history(
        &self,
        identity: Option<&Identity>,
        limit: Option<usize>,
        cursor: Option<i64>,
    ) -> Result<HistoryPage, StoreError>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Subscribing twice keeps the original subscription
    async fn subscribe(
        &self,
        identity: Option<&Identity>,
        podcast_id: u64,
    ) -> Result<(), StoreError>;

    async fn unsubscribe(
        &self,
        identity: Option<&Identity>,
        podcast_id: u64,
    ) -> Result<(), StoreError>;

    async fn is_subscribed(
        &self,
        identity: Option<&Identity>,
        podcast_id: u64,
    ) -> Result<bool, StoreError>;

    async fn subscriptions(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<SubscriptionRecord>, StoreError>;
}

pub type SharedProgressStore = Arc<dyn ProgressStore>;
pub type SharedSubscriptionStore = Arc<dyn SubscriptionStore>;

fn require(identity: Option<&Identity>) -> Result<&Identity, StoreError> {
    identity.ok_or(StoreError::NotAuthenticated)
}
