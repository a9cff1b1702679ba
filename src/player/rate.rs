// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// Supported playback speeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackRate {
    Half,
    #[default]
    Normal,
    OneAndHalf,
    Double,
    Triple,
}

impl PlaybackRate {
    pub const ALL: [PlaybackRate; 5] = [
        PlaybackRate::Half,
        PlaybackRate::Normal,
        PlaybackRate::OneAndHalf,
        PlaybackRate::Double,
        PlaybackRate::Triple,
    ];

    pub fn as_f64(self) -> f64 {
        match self {
            PlaybackRate::Half => 0.5,
            PlaybackRate::Normal => 1.0,
            PlaybackRate::OneAndHalf => 1.5,
            PlaybackRate::Double => 2.0,
            PlaybackRate::Triple => 3.0,
        }
    }
}

impl TryFrom<f64> for PlaybackRate {
    type Error = PlayerError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        PlaybackRate::ALL
            .into_iter()
            .find(|rate| rate.as_f64() == value)
            .ok_or(PlayerError::InvalidPlaybackRate(value))
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.as_f64())
    }
}
