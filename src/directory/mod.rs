// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod auth;
mod batch;
mod client;
mod types;

pub use auth::auth_headers;
pub use batch::{EpisodeLookup, MAX_BATCH_SIZE, PodcastLookup};
pub use client::DirectoryClient;
pub use types::{Category, Episode, Podcast, SearchResponse, TrendingQuery};
