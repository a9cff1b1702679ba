// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use crate::directory::{Episode, Podcast};

/// A playable episode, reduced to what the player needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    /// Audio enclosure URL
    pub source_url: String,
    pub title: String,
    pub artwork_url: Option<String>,
    /// Duration in seconds as declared by the feed; the primitive's own
    /// report takes precedence once available
    pub duration_hint: Option<f64>,
    pub mime_type: Option<String>,
}

/// The podcast a track belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub artwork_url: Option<String>,
}

impl From<&Episode> for Track {
    fn from(episode: &Episode) -> Self {
        Self {
            id: episode.id,
            source_url: episode.enclosure_url.clone(),
            title: episode.title.clone(),
            artwork_url: episode.artwork_url().map(String::from),
            duration_hint: episode.duration.map(|seconds| seconds as f64),
            mime_type: Some(episode.enclosure_type.clone()).filter(|s| !s.is_empty()),
        }
    }
}

impl From<&Podcast> for Source {
    fn from(podcast: &Podcast) -> Self {
        Self {
            id: podcast.id,
            title: podcast.title.clone(),
            author: podcast.display_author().to_string(),
            artwork_url: podcast.artwork_url().map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_from_episode() {
        let episode = Episode {
            id: 1,
            title: "Pilot".to_string(),
            enclosure_url: "https://example.com/a.mp3".to_string(),
            enclosure_type: "audio/mpeg".to_string(),
            duration: Some(1800),
            feed_image: "https://example.com/feed.jpg".to_string(),
            feed_id: 10,
            ..Default::default()
        };

        let track = Track::from(&episode);

        assert_eq!(track.id, 1);
        assert_eq!(track.source_url, "https://example.com/a.mp3");
        assert_eq!(track.duration_hint, Some(1800.0));
        assert_eq!(track.mime_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(
            track.artwork_url.as_deref(),
            Some("https://example.com/feed.jpg")
        );
    }

    #[test]
    fn track_without_enclosure_type_has_no_mime() {
        let episode = Episode {
            id: 2,
            enclosure_url: "https://example.com/b".to_string(),
            ..Default::default()
        };
        assert!(Track::from(&episode).mime_type.is_none());
    }

    #[test]
    fn source_from_podcast_prefers_author() {
        let podcast = Podcast {
            id: 10,
            title: "Show".to_string(),
            author: "Host".to_string(),
            owner_name: "Network".to_string(),
            artwork: "https://example.com/art.jpg".to_string(),
            ..Default::default()
        };

        let source = Source::from(&podcast);

        assert_eq!(source.author, "Host");
        assert_eq!(source.artwork_url.as_deref(), Some("https://example.com/art.jpg"));
    }
}
