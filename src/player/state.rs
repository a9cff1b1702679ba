// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};

use super::rate::PlaybackRate;
use super::track::{Source, Track};

/// Coarse playback phase derived from the state flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
}

/// Observable snapshot of the player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub is_playing: bool,
    pub is_paused: bool,
    pub is_loading: bool,
    pub has_ended: bool,
    /// Playback position in seconds
    pub current_time: f64,
    /// Duration in seconds, 0 until the primitive reports it
    pub duration: f64,
    /// End of the buffered range in seconds
    pub buffered: f64,
    pub playback_rate: PlaybackRate,
    pub current_track: Option<Track>,
    pub current_source: Option<Source>,
    pub sleep_timer_end_time: Option<DateTime<Utc>>,
    pub sleep_timer_remaining: Option<u64>,
    /// Transitions into the paused state so far
    ///
    /// Observers of a `watch` channel can miss a short pause that is
    /// immediately followed by play; the counter still moves.
    pub pause_count: u64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            is_playing: false,
            is_paused: false,
            is_loading: false,
            has_ended: false,
            current_time: 0.0,
            duration: 0.0,
            buffered: 0.0,
            playback_rate: PlaybackRate::Normal,
            current_track: None,
            current_source: None,
            sleep_timer_end_time: None,
            sleep_timer_remaining: None,
            pause_count: 0,
        }
    }
}

impl PlayerState {
    pub fn transport_state(&self) -> TransportState {
        if self.current_track.is_none() {
            TransportState::Idle
        } else if self.is_loading {
            TransportState::Loading
        } else if self.is_playing {
            TransportState::Playing
        } else if self.is_paused {
            TransportState::Paused
        } else if self.has_ended {
            TransportState::Ended
        } else {
            TransportState::Idle
        }
    }

    /// Duration to report elsewhere: the primitive's value, else the feed's hint
    pub fn effective_duration(&self) -> f64 {
        if self.duration > 0.0 {
            self.duration
        } else {
            self.current_track
                .as_ref()
                .and_then(|track| track.duration_hint)
                .unwrap_or(0.0)
        }
    }

    /// Apply one change. Every mutation of the snapshot goes through here.
    pub(crate) fn apply(&mut self, patch: StatePatch) {
        match patch {
            StatePatch::TrackChanged {
                track,
                source,
                start_position,
            } => {
                self.current_track = Some(track);
                self.current_source = Some(source);
                self.current_time = start_position;
                self.duration = 0.0;
                self.buffered = 0.0;
                self.has_ended = false;
            }
            StatePatch::Position(seconds) => {
                self.current_time = sanitize(seconds);
            }
            StatePatch::Duration(seconds) => {
                self.duration = sanitize(seconds);
                self.buffered = self.clamp_buffered(self.buffered);
            }
            StatePatch::Buffered(seconds) => {
                self.buffered = self.clamp_buffered(sanitize(seconds));
            }
            StatePatch::Loading(is_loading) => {
                self.is_loading = is_loading;
            }
            StatePatch::Playing => {
                self.is_playing = true;
                self.is_paused = false;
                self.has_ended = false;
            }
            StatePatch::Paused => {
                if !self.is_paused {
                    self.pause_count = self.pause_count.wrapping_add(1);
                }
                self.is_playing = false;
                self.is_paused = true;
            }
            StatePatch::Ended => {
                self.is_playing = false;
                self.is_paused = false;
                self.has_ended = true;
                self.current_time = 0.0;
            }
            StatePatch::Rate(rate) => {
                self.playback_rate = rate;
            }
            StatePatch::SleepTimer { end_time, remaining } => {
                self.sleep_timer_end_time = end_time;
                self.sleep_timer_remaining = remaining;
            }
        }
    }

    fn clamp_buffered(&self, buffered: f64) -> f64 {
        if self.duration > 0.0 {
            buffered.min(self.duration)
        } else {
            buffered
        }
    }
}

/// Non-finite or negative readings collapse to 0
fn sanitize(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// A single, explicit change to [`PlayerState`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StatePatch {
    TrackChanged {
        track: Track,
        source: Source,
        start_position: f64,
    },
    Position(f64),
    Duration(f64),
    Buffered(f64),
    Loading(bool),
    Playing,
    Paused,
    Ended,
    Rate(PlaybackRate),
    SleepTimer {
        end_time: Option<DateTime<Utc>>,
        remaining: Option<u64>,
    },
}
