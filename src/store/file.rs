// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::data::StoreData;
use super::{
    HistoryPage, Identity, ProgressRecord, ProgressStore, ProgressUpdate, SubscriptionRecord,
    SubscriptionStore, require,
};
use crate::error::StoreError;
use crate::player::SharedClock;

/// Name of the store file inside the data directory
pub const STORE_FILENAME: &str = "library.json";

/// A store persisted as one pretty-printed JSON file
///
/// Every write rewrites the whole file through a `.partial` sibling, so a
/// crash mid-write leaves the previous version in place.
pub struct JsonFileStore {
    path: PathBuf,
    clock: SharedClock,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: &Path, clock: SharedClock) -> Self {
        Self {
            path: data_dir.join(STORE_FILENAME),
            clock,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoreData, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreData::default()),
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        serde_json::from_str(&content).map_err(|e| StoreError::JsonParseFailed {
            path: self.path.clone(),
            source: e,
        })
    }

    async fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(data)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::WriteFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let mut partial = self.path.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        tokio::fs::write(&partial, json)
            .await
            .map_err(|e| StoreError::WriteFailed {
                path: partial.clone(),
                source: e,
            })?;

        tokio::fs::rename(&partial, &self.path)
            .await
            .map_err(|e| StoreError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })
    }

    async fn read<R>(&self, f: impl FnOnce(&StoreData) -> R + Send) -> Result<R, StoreError> {
        let _guard = self.lock.lock().await;
        let data = self.load().await?;
        Ok(f(&data))
    }

    async fn modify<R: Send>(
        &self,
        f: impl FnOnce(&mut StoreData) -> R + Send,
    ) -> Result<R, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;
        let result = f(&mut data);
        self.save(&data).await?;
        Ok(result)
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

#[async_trait]
impl ProgressStore for JsonFileStore {
    async fn update_progress(
        &self,
        identity: Option<&Identity>,
        update: &ProgressUpdate,
    ) -> Result<(), StoreError> {
        let user_id = require(identity)?.user_id.clone();
        let now = self.now_ms();
        self.modify(|data| data.upsert_progress(&user_id, update, now))
            .await?;
        debug!(
            episode_id = update.episode_id,
            path = %self.path.display(),
            "progress written"
        );
        Ok(())
    }

    async fn episode_progress(
        &self,
        identity: Option<&Identity>,
        episode_id: u64,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        let Some(identity) = identity else {
            return Ok(None);
        };
        self.read(|data| data.episode_progress(&identity.user_id, episode_id))
            .await
    }

    async fn history(
        &self,
        identity: Option<&Identity>,
        limit: Option<usize>,
        cursor: Option<i64>,
    ) -> Result<HistoryPage, StoreError> {
        let Some(identity) = identity else {
            return Ok(HistoryPage::default());
        };
        self.read(|data| data.history(&identity.user_id, limit, cursor))
            .await
    }
}

#[async_trait]
impl SubscriptionStore for JsonFileStore {
    async fn subscribe(
        &self,
        identity: Option<&Identity>,
        podcast_id: u64,
    ) -> Result<(), StoreError> {
        let user_id = require(identity)?.user_id.clone();
        let now = self.now_ms();
        let added = self
            .modify(|data| data.subscribe(&user_id, podcast_id, now))
            .await?;
        debug!(podcast_id, added, "subscription stored");
        Ok(())
    }

    async fn unsubscribe(
        &self,
        identity: Option<&Identity>,
        podcast_id: u64,
    ) -> Result<(), StoreError> {
        let user_id = require(identity)?.user_id.clone();
        let removed = self
            .modify(|data| data.unsubscribe(&user_id, podcast_id))
            .await?;
        debug!(podcast_id, removed, "subscription removed");
        Ok(())
    }

    async fn is_subscribed(
        &self,
        identity: Option<&Identity>,
        podcast_id: u64,
    ) -> Result<bool, StoreError> {
        let Some(identity) = identity else {
            return Ok(false);
        };
        self.read(|data| data.is_subscribed(&identity.user_id, podcast_id))
            .await
    }

    async fn subscriptions(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<SubscriptionRecord>, StoreError> {
        let Some(identity) = identity else {
            return Ok(Vec::new());
        };
        self.read(|data| data.subscriptions(&identity.user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use chrono::DateTime;
    use tempfile::tempdir;

    use crate::player::ManualClock;

    fn clock() -> SharedClock {
        Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ))
    }

    fn update(episode_id: u64, current_time: f64) -> ProgressUpdate {
        ProgressUpdate {
            episode_id,
            podcast_id: 3,
            current_time,
            duration: 3600.0,
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), clock());
        let alice = Identity::new("alice");

        let page = store.history(Some(&alice), None, None).await.unwrap();

        assert!(page.items.is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn progress_survives_reopen() {
        let dir = tempdir().unwrap();
        let alice = Identity::new("alice");

        {
            let store = JsonFileStore::new(dir.path(), clock());
            store
                .update_progress(Some(&alice), &update(1, 600.0))
                .await
                .unwrap();
        }

        let reopened = JsonFileStore::new(dir.path(), clock());
        let record = reopened
            .episode_progress(Some(&alice), 1)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.current_time, 600.0);
        assert_eq!(record.duration, 3600.0);
        assert_eq!(record.podcast_id, 3);
    }

    #[tokio::test]
    async fn creates_missing_data_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = JsonFileStore::new(&nested, clock());

        store
            .subscribe(Some(&Identity::new("alice")), 5)
            .await
            .unwrap();

        assert!(nested.join(STORE_FILENAME).exists());
        assert!(!nested.join("library.json.partial").exists());
    }

    #[tokio::test]
    async fn file_uses_camel_case_fields() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), clock());
        store
            .update_progress(Some(&Identity::new("alice")), &update(1, 5.0))
            .await
            .unwrap();

        let json = std::fs::read_to_string(store.path()).unwrap();
        assert!(json.contains("\"listeningHistory\""));
        assert!(json.contains("\"lastListenedAt\""));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILENAME), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.path(), clock());

        let result = store.subscriptions(Some(&Identity::new("alice"))).await;

        assert!(matches!(result, Err(StoreError::JsonParseFailed { .. })));
    }

    #[tokio::test]
    async fn unauthenticated_writes_leave_no_file() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), clock());

        let result = store.subscribe(None, 5).await;

        assert!(matches!(result, Err(StoreError::NotAuthenticated)));
        assert!(!store.path().exists());
    }
}
