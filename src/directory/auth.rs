// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use sha1::{Digest, Sha1};

use crate::config::DirectoryConfig;

/// Build the Podcast Index authentication headers for a request made at
/// `auth_date` (unix seconds)
///
/// `Authorization` is the lowercase hex SHA-1 of `key + secret + date`.
pub fn auth_headers(config: &DirectoryConfig, auth_date: i64) -> Vec<(String, String)> {
    let auth_date = auth_date.to_string();

    let mut hasher = Sha1::new();
    hasher.update(config.api_key.as_bytes());
    hasher.update(config.api_secret.as_bytes());
    hasher.update(auth_date.as_bytes());
    let signature = hex::encode(hasher.finalize());

    vec![
        ("User-Agent".to_string(), config.user_agent.clone()),
        ("X-Auth-Key".to_string(), config.api_key.clone()),
        ("X-Auth-Date".to_string(), auth_date),
        ("Authorization".to_string(), signature),
    ]
}
