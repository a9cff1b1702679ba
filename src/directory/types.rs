// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Treat JSON `null` as the type's default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A directory category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
}

/// A podcast (feed) as returned by the directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Podcast {
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub original_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub artwork: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_update_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub language: String,
    pub itunes_id: Option<u64>,
    pub episode_count: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: BTreeMap<String, String>,
}

impl Podcast {
    /// Artwork to display, preferring the dedicated artwork over the feed image
    pub fn artwork_url(&self) -> Option<&str> {
        [self.artwork.as_str(), self.image.as_str()]
            .into_iter()
            .find(|url| !url.is_empty())
    }

    /// Author to display, falling back to the feed owner
    pub fn display_author(&self) -> &str {
        if self.author.is_empty() {
            &self.owner_name
        } else {
            &self.author
        }
    }
}

/// A single episode as returned by the directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Episode {
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub guid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date_published: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub date_published_pretty: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enclosure_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enclosure_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enclosure_length: u64,
    /// Duration in seconds as declared by the feed
    pub duration: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub explicit: u8,
    pub episode: Option<u32>,
    pub episode_type: Option<String>,
    pub season: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub feed_image: String,
    pub feed_id: u64,
    pub feed_title: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub feed_language: String,
    pub chapters_url: Option<String>,
    pub transcript_url: Option<String>,
}

impl Episode {
    /// Artwork to display, falling back to the feed's image
    pub fn artwork_url(&self) -> Option<&str> {
        [self.image.as_str(), self.feed_image.as_str()]
            .into_iter()
            .find(|url| !url.is_empty())
    }
}

/// Options for the trending endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendingQuery {
    /// Maximum number of podcasts to return
    pub max: Option<u32>,
    /// Only podcasts trending since this unix timestamp
    pub since: Option<i64>,
    /// Language code filter, e.g. "en"
    pub lang: Option<String>,
    /// Category id or name filter
    pub cat: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CategoriesResponse {
    #[serde(default)]
    pub feeds: Vec<Category>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FeedsResponse {
    #[serde(default)]
    pub feeds: Vec<Podcast>,
}

/// Result of a search-by-term request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub feeds: Vec<Podcast>,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PodcastResponse {
    pub feed: Podcast,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EpisodeResponse {
    pub episode: Episode,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EpisodesResponse {
    #[serde(default)]
    pub items: Vec<Episode>,
}

/// The `status` field is sent as either `"true"` or `true`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Flag(bool),
    Text(String),
}

/// Status fields common to every directory response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope {
    status: Option<RawStatus>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        match &self.status {
            Some(RawStatus::Flag(flag)) => *flag,
            Some(RawStatus::Text(text)) => text == "true",
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn podcast_tolerates_nulls_and_missing_fields() {
        let json = r#"{
            "id": 920666,
            "title": "Podcasting 2.0",
            "author": null,
            "ownerName": "Podcast Index LLC",
            "image": "https://example.com/image.jpg",
            "artwork": "",
            "itunesId": null,
            "categories": null
        }"#;

        let podcast: Podcast = serde_json::from_str(json).unwrap();

        assert_eq!(podcast.id, 920666);
        assert_eq!(podcast.title, "Podcasting 2.0");
        assert_eq!(podcast.display_author(), "Podcast Index LLC");
        assert_eq!(podcast.artwork_url(), Some("https://example.com/image.jpg"));
        assert!(podcast.itunes_id.is_none());
        assert!(podcast.categories.is_empty());
    }

    #[test]
    fn podcast_reads_category_map() {
        let json = r#"{"id": 1, "title": "T", "categories": {"9": "Business", "13": "Education"}}"#;
        let podcast: Podcast = serde_json::from_str(json).unwrap();
        assert_eq!(podcast.categories.get("9").map(String::as_str), Some("Business"));
    }

    #[test]
    fn episode_reads_enclosure_fields() {
        let json = r#"{
            "id": 16795090,
            "title": "Episode 1",
            "enclosureUrl": "https://example.com/ep1.mp3",
            "enclosureType": "audio/mpeg",
            "enclosureLength": 1234567,
            "duration": 1800,
            "feedId": 920666,
            "feedImage": "https://example.com/feed.jpg",
            "image": ""
        }"#;

        let episode: Episode = serde_json::from_str(json).unwrap();

        assert_eq!(episode.enclosure_url, "https://example.com/ep1.mp3");
        assert_eq!(episode.enclosure_type, "audio/mpeg");
        assert_eq!(episode.duration, Some(1800));
        assert_eq!(episode.feed_id, 920666);
        assert_eq!(episode.artwork_url(), Some("https://example.com/feed.jpg"));
    }

    #[test]
    fn episode_duration_may_be_null() {
        let json = r#"{"id": 1, "title": "E", "duration": null, "feedId": 2}"#;
        let episode: Episode = serde_json::from_str(json).unwrap();
        assert!(episode.duration.is_none());
    }

    #[test]
    fn envelope_accepts_string_and_bool_status() {
        let text: Envelope = serde_json::from_str(r#"{"status": "true"}"#).unwrap();
        let flag: Envelope = serde_json::from_str(r#"{"status": true}"#).unwrap();
        let failed: Envelope =
            serde_json::from_str(r#"{"status": "false", "description": "No feeds match"}"#)
                .unwrap();

        assert!(text.is_ok());
        assert!(flag.is_ok());
        assert!(!failed.is_ok());
        assert_eq!(failed.description, "No feeds match");
    }
}
