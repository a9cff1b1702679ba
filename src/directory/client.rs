// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::DirectoryConfig;
use crate::error::DirectoryError;
use crate::http::HttpClient;

use super::auth::auth_headers;
use super::types::{
    CategoriesResponse, Category, Envelope, Episode, EpisodeResponse, EpisodesResponse,
    FeedsResponse, Podcast, PodcastResponse, SearchResponse, TrendingQuery,
};

/// Client for the Podcast Index directory API
#[derive(Clone)]
pub struct DirectoryClient<C: HttpClient> {
    http: C,
    config: DirectoryConfig,
}

impl<C: HttpClient> DirectoryClient<C> {
    pub fn new(http: C, config: DirectoryConfig) -> Self {
        Self { http, config }
    }

    /// The underlying HTTP client, shared with downloads
    pub fn http(&self) -> &C {
        &self.http
    }

    /// List all directory categories
    pub async fn categories(&self) -> Result<Vec<Category>, DirectoryError> {
        let response: CategoriesResponse = self.request("/categories/list", &[]).await?;
        Ok(response.feeds)
    }

    /// Podcasts currently trending, optionally filtered by language and category
    pub async fn trending(&self, query: &TrendingQuery) -> Result<Vec<Podcast>, DirectoryError> {
        let mut params = Vec::new();
        if let Some(max) = query.max {
            params.push(("max", max.to_string()));
        }
        if let Some(since) = query.since {
            params.push(("since", since.to_string()));
        }
        if let Some(ref lang) = query.lang {
            params.push(("lang", lang.clone()));
        }
        if let Some(ref cat) = query.cat {
            params.push(("cat", cat.clone()));
        }

        let response: FeedsResponse = self.request("/podcasts/trending", &params).await?;
        Ok(response.feeds)
    }

    /// Search podcasts by free-text term
    pub async fn search(&self, term: &str, max: Option<u32>) -> Result<SearchResponse, DirectoryError> {
        let mut params = vec![("q", term.to_string())];
        if let Some(max) = max {
            params.push(("max", max.to_string()));
        }

        self.request("/search/byterm", &params).await
    }

    pub async fn podcast_by_id(&self, feed_id: u64) -> Result<Podcast, DirectoryError> {
        let response: PodcastResponse = self
            .request("/podcasts/byfeedid", &[("id", feed_id.to_string())])
            .await?;
        Ok(response.feed)
    }

    pub async fn episode_by_id(&self, episode_id: u64) -> Result<Episode, DirectoryError> {
        let response: EpisodeResponse = self
            .request("/episodes/byid", &[("id", episode_id.to_string())])
            .await?;
        Ok(response.episode)
    }

    /// Episodes of a feed, newest first
    pub async fn episodes_by_feed_id(
        &self,
        feed_id: u64,
        max: Option<u32>,
    ) -> Result<Vec<Episode>, DirectoryError> {
        let mut params = vec![("id", feed_id.to_string())];
        if let Some(max) = max {
            params.push(("max", max.to_string()));
        }

        let response: EpisodesResponse = self.request("/episodes/byfeedid", &params).await?;
        Ok(response.items)
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, DirectoryError> {
        let mut url = Url::parse(&format!("{}{}", self.config.base_url, endpoint))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, DirectoryError> {
        let url = self.endpoint_url(endpoint, params)?;
        let headers = auth_headers(&self.config, Utc::now().timestamp());

        debug!(%url, "directory request");

        let response = self
            .http
            .get_bytes(url.as_str(), &headers)
            .await
            .map_err(|e| DirectoryError::RequestFailed {
                url: url.to_string(),
                source: e,
            })?;

        if !(200..300).contains(&response.status) {
            return Err(DirectoryError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let envelope: Envelope =
            serde_json::from_slice(&response.body).map_err(|e| DirectoryError::InvalidJson {
                url: url.to_string(),
                source: e,
            })?;

        if !envelope.is_ok() {
            return Err(DirectoryError::ApiStatus {
                endpoint: endpoint.to_string(),
                description: if envelope.description.is_empty() {
                    "Unknown error".to_string()
                } else {
                    envelope.description
                },
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| DirectoryError::InvalidJson {
            url: url.to_string(),
            source: e,
        })
    }
}
