// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::{BTreeSet, HashMap};

use futures::future::join_all;
use tracing::warn;

use crate::error::DirectoryError;
use crate::http::HttpClient;

use super::client::DirectoryClient;
use super::types::{Episode, Podcast};

/// Largest number of ids accepted by a batch lookup
pub const MAX_BATCH_SIZE: usize = 50;

/// Outcome of looking up one episode in a batch
#[derive(Debug, Clone, PartialEq)]
pub enum EpisodeLookup {
    Found {
        episode_id: u64,
        episode: Episode,
        /// `None` when the episode's feed could not be fetched
        podcast: Option<Podcast>,
    },
    Failed {
        episode_id: u64,
        error: String,
    },
}

/// Outcome of looking up one podcast in a batch
#[derive(Debug, Clone, PartialEq)]
pub enum PodcastLookup {
    Found { podcast_id: u64, podcast: Podcast },
    Failed { podcast_id: u64, error: String },
}

fn check_batch_size(count: usize) -> Result<(), DirectoryError> {
    if count == 0 || count > MAX_BATCH_SIZE {
        return Err(DirectoryError::BatchSize {
            count,
            max: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}

impl<C: HttpClient> DirectoryClient<C> {
    /// Look up several podcasts concurrently
    ///
    /// Results keep the order of `podcast_ids`; individual failures are
    /// reported inline rather than failing the batch.
    pub async fn podcasts_batch(&self, podcast_ids: &[u64]) -> Result<Vec<PodcastLookup>, DirectoryError> {
        check_batch_size(podcast_ids.len())?;

        let results = join_all(podcast_ids.iter().map(|&id| self.podcast_by_id(id))).await;

        Ok(podcast_ids
            .iter()
            .zip(results)
            .map(|(&podcast_id, result)| match result {
                Ok(podcast) => PodcastLookup::Found { podcast_id, podcast },
                Err(e) => {
                    warn!(podcast_id, error = %e, "podcast lookup failed");
                    PodcastLookup::Failed {
                        podcast_id,
                        error: e.to_string(),
                    }
                }
            })
            .collect())
    }

    /// Look up several episodes concurrently, each paired with its podcast
    ///
    /// Every distinct feed is fetched once.
    pub async fn episodes_batch(&self, episode_ids: &[u64]) -> Result<Vec<EpisodeLookup>, DirectoryError> {
        check_batch_size(episode_ids.len())?;

        let episode_results = join_all(episode_ids.iter().map(|&id| self.episode_by_id(id))).await;

        let feed_ids: BTreeSet<u64> = episode_results
            .iter()
            .filter_map(|result| result.as_ref().ok().map(|episode| episode.feed_id))
            .collect();

        let podcast_results = join_all(feed_ids.iter().map(|&id| self.podcast_by_id(id))).await;

        let podcasts: HashMap<u64, Podcast> = feed_ids
            .into_iter()
            .zip(podcast_results)
            .filter_map(|(feed_id, result)| match result {
                Ok(podcast) => Some((feed_id, podcast)),
                Err(e) => {
                    warn!(feed_id, error = %e, "podcast lookup for episode batch failed");
                    None
                }
            })
            .collect();

        Ok(episode_ids
            .iter()
            .zip(episode_results)
            .map(|(&episode_id, result)| match result {
                Ok(episode) => EpisodeLookup::Found {
                    episode_id,
                    podcast: podcasts.get(&episode.feed_id).cloned(),
                    episode,
                },
                Err(e) => {
                    warn!(episode_id, error = %e, "episode lookup failed");
                    EpisodeLookup::Failed {
                        episode_id,
                        error: e.to_string(),
                    }
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::client::tests::{MockDirectory, client};

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let result = client(MockDirectory::default()).episodes_batch(&[]).await;
        assert!(matches!(
            result,
            Err(DirectoryError::BatchSize { count: 0, max: 50 })
        ));
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected() {
        let ids: Vec<u64> = (1..=51).collect();
        let result = client(MockDirectory::default()).podcasts_batch(&ids).await;
        assert!(matches!(
            result,
            Err(DirectoryError::BatchSize { count: 51, .. })
        ));
    }

    #[tokio::test]
    async fn episodes_are_paired_with_their_podcast() {
        let mock = MockDirectory::default()
            .with(
                "/episodes/byid?id=1",
                200,
                r#"{"status":"true","episode":{"id":1,"title":"One","feedId":10}}"#,
            )
            .with(
                "/episodes/byid?id=2",
                200,
                r#"{"status":"true","episode":{"id":2,"title":"Two","feedId":10}}"#,
            )
            .with(
                "/podcasts/byfeedid?id=10",
                200,
                r#"{"status":"true","feed":{"id":10,"title":"Show"}}"#,
            );

        let results = client(mock.clone()).episodes_batch(&[1, 2, 3]).await.unwrap();

        assert_eq!(results.len(), 3);
        match &results[0] {
            EpisodeLookup::Found { episode, podcast, .. } => {
                assert_eq!(episode.title, "One");
                assert_eq!(podcast.as_ref().map(|p| p.title.as_str()), Some("Show"));
            }
            other => panic!("Expected Found, got {other:?}"),
        }
        assert!(matches!(results[2], EpisodeLookup::Failed { episode_id: 3, .. }));

        // One feed lookup shared by both episodes
        let feed_requests = mock
            .requested_urls()
            .iter()
            .filter(|url| url.path().ends_with("/podcasts/byfeedid"))
            .count();
        assert_eq!(feed_requests, 1);
    }

    #[tokio::test]
    async fn missing_podcast_leaves_episode_found() {
        let mock = MockDirectory::default().with(
            "/episodes/byid?id=1",
            200,
            r#"{"status":"true","episode":{"id":1,"title":"Orphan","feedId":99}}"#,
        );

        let results = client(mock).episodes_batch(&[1]).await.unwrap();

        match &results[0] {
            EpisodeLookup::Found { podcast, .. } => assert!(podcast.is_none()),
            other => panic!("Expected Found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn podcasts_batch_keeps_order() {
        let mock = MockDirectory::default()
            .with(
                "/podcasts/byfeedid?id=5",
                200,
                r#"{"status":"true","feed":{"id":5,"title":"Five"}}"#,
            )
            .with(
                "/podcasts/byfeedid?id=6",
                200,
                r#"{"status":"true","feed":{"id":6,"title":"Six"}}"#,
            );

        let results = client(mock).podcasts_batch(&[6, 5]).await.unwrap();

        assert!(matches!(&results[0], PodcastLookup::Found { podcast_id: 6, .. }));
        assert!(matches!(&results[1], PodcastLookup::Found { podcast_id: 5, .. }));
    }
}
