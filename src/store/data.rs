// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_HISTORY_LIMIT, HistoryPage, ProgressRecord, ProgressUpdate, SubscriptionRecord,
};

/// Everything a store persists, shared by the in-memory and file backends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoreData {
    #[serde(default)]
    pub listening_history: Vec<ProgressRecord>,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionRecord>,
}

impl StoreData {
    /// One record per user and episode; the podcast id is fixed at insert
    pub fn upsert_progress(&mut self, user_id: &str, update: &ProgressUpdate, now_ms: i64) {
        if let Some(existing) = self
            .listening_history
            .iter_mut()
            .find(|r| r.user_id == user_id && r.episode_id == update.episode_id)
        {
            existing.current_time = update.current_time;
            existing.duration = update.duration;
            existing.last_listened_at = now_ms;
            return;
        }

        self.listening_history.push(ProgressRecord {
            user_id: user_id.to_string(),
            episode_id: update.episode_id,
            podcast_id: update.podcast_id,
            current_time: update.current_time,
            duration: update.duration,
            last_listened_at: now_ms,
        });
    }

    pub fn episode_progress(&self, user_id: &str, episode_id: u64) -> Option<ProgressRecord> {
        self.listening_history
            .iter()
            .find(|r| r.user_id == user_id && r.episode_id == episode_id)
            .cloned()
    }

    pub fn history(&self, user_id: &str, limit: Option<usize>, cursor: Option<i64>) -> HistoryPage {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        let cursor = cursor.unwrap_or(i64::MAX);

        let mut items: Vec<ProgressRecord> = self
            .listening_history
            .iter()
            .filter(|r| r.user_id == user_id && r.last_listened_at < cursor)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.last_listened_at.cmp(&a.last_listened_at));

        let has_more = items.len() > limit;
        items.truncate(limit);
        let next_cursor = if has_more {
            items.last().map(|r| r.last_listened_at)
        } else {
            None
        };

        HistoryPage { items, next_cursor }
    }

    /// Returns false when the subscription already existed
    pub fn subscribe(&mut self, user_id: &str, podcast_id: u64, now_ms: i64) -> bool {
        if self.is_subscribed(user_id, podcast_id) {
            return false;
        }
        self.subscriptions.push(SubscriptionRecord {
            user_id: user_id.to_string(),
            podcast_id,
            subscribed_at: now_ms,
        });
        true
    }

    /// Returns false when there was nothing to remove
    pub fn unsubscribe(&mut self, user_id: &str, podcast_id: u64) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions
            .retain(|s| !(s.user_id == user_id && s.podcast_id == podcast_id));
        self.subscriptions.len() != before
    }

    pub fn is_subscribed(&self, user_id: &str, podcast_id: u64) -> bool {
        self.subscriptions
            .iter()
            .any(|s| s.user_id == user_id && s.podcast_id == podcast_id)
    }

    pub fn subscriptions(&self, user_id: &str) -> Vec<SubscriptionRecord> {
        self.subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(episode_id: u64, current_time: f64) -> ProgressUpdate {
        ProgressUpdate {
            episode_id,
            podcast_id: 100,
            current_time,
            duration: 3600.0,
        }
    }

    #[test]
    fn upsert_keeps_one_record_per_episode() {
        let mut data = StoreData::default();
        data.upsert_progress("alice", &update(1, 10.0), 1_000);
        data.upsert_progress("alice", &update(1, 70.0), 2_000);

        assert_eq!(data.listening_history.len(), 1);
        let record = data.episode_progress("alice", 1).unwrap();
        assert_eq!(record.current_time, 70.0);
        assert_eq!(record.last_listened_at, 2_000);
    }

    #[test]
    fn progress_is_per_user() {
        let mut data = StoreData::default();
        data.upsert_progress("alice", &update(1, 10.0), 1_000);

        assert!(data.episode_progress("bob", 1).is_none());
        assert!(data.history("bob", None, None).items.is_empty());
    }

    #[test]
    fn history_pages_newest_first() {
        let mut data = StoreData::default();
        for episode in 1..=5 {
            data.upsert_progress("alice", &update(episode, 1.0), episode as i64 * 1_000);
        }

        let first = data.history("alice", Some(2), None);
        let ids: Vec<u64> = first.items.iter().map(|r| r.episode_id).collect();
        assert_eq!(ids, vec![5, 4]);
        assert_eq!(first.next_cursor, Some(4_000));

        let second = data.history("alice", Some(2), first.next_cursor);
        let ids: Vec<u64> = second.items.iter().map(|r| r.episode_id).collect();
        assert_eq!(ids, vec![3, 2]);

        let last = data.history("alice", Some(2), second.next_cursor);
        let ids: Vec<u64> = last.items.iter().map(|r| r.episode_id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(last.next_cursor, None);
    }

    #[test]
    fn history_defaults_to_fifty() {
        let mut data = StoreData::default();
        for episode in 0..60 {
            data.upsert_progress("alice", &update(episode, 1.0), episode as i64);
        }

        let page = data.history("alice", None, None);
        assert_eq!(page.items.len(), DEFAULT_HISTORY_LIMIT);
        assert!(page.next_cursor.is_some());
    }

    #[test]
    fn relistening_moves_episode_to_front() {
        let mut data = StoreData::default();
        data.upsert_progress("alice", &update(1, 1.0), 1_000);
        data.upsert_progress("alice", &update(2, 1.0), 2_000);
        data.upsert_progress("alice", &update(1, 5.0), 3_000);

        let page = data.history("alice", None, None);
        assert_eq!(page.items[0].episode_id, 1);
    }

    #[test]
    fn subscribe_is_idempotent() {
        let mut data = StoreData::default();

        assert!(data.subscribe("alice", 7, 1_000));
        assert!(!data.subscribe("alice", 7, 2_000));

        let subs = data.subscriptions("alice");
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].subscribed_at, 1_000);
    }

    #[test]
    fn unsubscribe_removes_only_that_podcast() {
        let mut data = StoreData::default();
        data.subscribe("alice", 7, 1);
        data.subscribe("alice", 8, 2);
        data.subscribe("bob", 7, 3);

        assert!(data.unsubscribe("alice", 7));
        assert!(!data.unsubscribe("alice", 7));

        assert!(!data.is_subscribed("alice", 7));
        assert!(data.is_subscribed("alice", 8));
        assert!(data.is_subscribed("bob", 7));
    }
}
