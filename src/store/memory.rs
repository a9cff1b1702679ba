// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use super::data::StoreData;
use super::{
    HistoryPage, Identity, ProgressRecord, ProgressStore, ProgressUpdate, SubscriptionRecord,
    SubscriptionStore, require,
};
use crate::error::StoreError;
use crate::player::SharedClock;

/// A store that lives only as long as the process
pub struct MemoryStore {
    data: Mutex<StoreData>,
    clock: SharedClock,
}

impl MemoryStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            data: Mutex::new(StoreData::default()),
            clock,
        }
    }

    fn data(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn update_progress(
        &self,
        identity: Option<&Identity>,
        update: &ProgressUpdate,
    ) -> Result<(), StoreError> {
        let identity = require(identity)?;
        let now = self.now_ms();
        self.data().upsert_progress(&identity.user_id, update, now);
        debug!(episode_id = update.episode_id, "progress stored in memory");
        Ok(())
    }

    async fn episode_progress(
        &self,
        identity: Option<&Identity>,
        episode_id: u64,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        Ok(identity.and_then(|id| self.data().episode_progress(&id.user_id, episode_id)))
    }

    async fn history(
        &self,
        identity: Option<&Identity>,
        limit: Option<usize>,
        cursor: Option<i64>,
    ) -> Result<HistoryPage, StoreError> {
        Ok(identity
            .map(|id| self.data().history(&id.user_id, limit, cursor))
            .unwrap_or_default())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn subscribe(
        &self,
        identity: Option<&Identity>,
        podcast_id: u64,
    ) -> Result<(), StoreError> {
        let identity = require(identity)?;
        let now = self.now_ms();
        self.data().subscribe(&identity.user_id, podcast_id, now);
        Ok(())
    }

    async fn unsubscribe(
        &self,
        identity: Option<&Identity>,
        podcast_id: u64,
    ) -> Result<(), StoreError> {
        let identity = require(identity)?;
        self.data().unsubscribe(&identity.user_id, podcast_id);
        Ok(())
    }

    async fn is_subscribed(
        &self,
        identity: Option<&Identity>,
        podcast_id: u64,
    ) -> Result<bool, StoreError> {
        Ok(identity.is_some_and(|id| self.data().is_subscribed(&id.user_id, podcast_id)))
    }

    async fn subscriptions(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<SubscriptionRecord>, StoreError> {
        Ok(identity
            .map(|id| self.data().subscriptions(&id.user_id))
            .unwrap_or_default())
    }
}
