// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use url::Url;

use crate::error::ConfigError;

/// Base URL of the Podcast Index v1 API
pub const DEFAULT_BASE_URL: &str = "https://api.podcastindex.org/api/1.0";

/// User agent sent with every directory request
pub const DEFAULT_USER_AGENT: &str = concat!("podplay/", env!("CARGO_PKG_VERSION"));

pub const API_KEY_ENV: &str = "PODCAST_INDEX_API_KEY";
pub const API_SECRET_ENV: &str = "PODCAST_INDEX_API_SECRET";

/// Credentials and endpoint for the podcast directory
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: Url,
    pub user_agent: String,
}

impl DirectoryConfig {
    /// Create a config for the public Podcast Index endpoint
    ///
    /// Both credentials must be non-empty.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.trim().is_empty() || api_secret.trim().is_empty() {
            return Err(ConfigError::MissingCredentials);
        }

        Ok(Self {
            api_key,
            api_secret,
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Read credentials from `PODCAST_INDEX_API_KEY` / `PODCAST_INDEX_API_SECRET`
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let api_secret = std::env::var(API_SECRET_ENV).unwrap_or_default();
        Self::new(api_key, api_secret)
    }

    /// Point the client at a different API root (mirrors, test servers)
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = Url::parse(base_url.trim_end_matches('/'))?;
        Ok(self)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
