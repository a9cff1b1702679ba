// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use super::clock::SharedClock;
use super::media::{LoadGeneration, MediaElement, MediaEvent, TaggedEvent};
use super::rate::PlaybackRate;
use super::sleep_timer::{SleepTick, SleepTimer};
use super::state::{PlayerState, StatePatch};
use super::track::{Source, Track};

/// Seconds moved by a skip when the caller does not say otherwise
pub const DEFAULT_SKIP_SECONDS: f64 = 30.0;

/// Owns one media primitive and turns transport commands and primitive
/// events into a single observable [`PlayerState`]
///
/// Transport operations never fail: rejected play requests and primitive
/// errors are logged and leave the state consistent.
pub struct PlaybackController {
    media: Box<dyn MediaElement>,
    clock: SharedClock,
    state: PlayerState,
    /// URL handed to the primitive by the last `load`
    loaded_source: Option<String>,
    generation: LoadGeneration,
    /// The current load can be seeked
    ready: bool,
    /// Seek target held back until the current load is ready
    pending_seek: Option<f64>,
    sleep_timer: SleepTimer,
    state_tx: watch::Sender<PlayerState>,
}

impl PlaybackController {
    pub fn new(media: Box<dyn MediaElement>, clock: SharedClock) -> Self {
        let state = PlayerState::default();
        let (state_tx, _) = watch::channel(state.clone());

        Self {
            media,
            clock,
            state,
            loaded_source: None,
            generation: LoadGeneration::default(),
            ready: false,
            pending_seek: None,
            sleep_timer: SleepTimer::default(),
            state_tx,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Receive a fresh snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state_tx.subscribe()
    }

    /// Generation of the current load; events from older loads are dropped
    pub fn generation(&self) -> LoadGeneration {
        self.generation
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current_track.as_ref()
    }

    fn commit(&mut self, patch: StatePatch) {
        self.state.apply(patch);
        self.state_tx.send_replace(self.state.clone());
    }

    fn has_source(&self) -> bool {
        self.loaded_source.is_some()
    }

    /// Play `track`, or resume it if it is already loaded
    ///
    /// A different track replaces the current one immediately in the
    /// snapshot; `start_offset` is applied once the primitive can seek.
    pub fn play(&mut self, track: Track, source: Source, start_offset: Option<f64>) {
        if self.loaded_source.as_deref() == Some(track.source_url.as_str()) {
            debug!(track_id = track.id, "resuming already loaded track");
            if let Some(offset) = start_offset {
                self.seek_to(offset);
            }
            self.request_play();
            return;
        }

        self.generation = self.generation.next();
        self.ready = false;
        self.pending_seek = start_offset;
        self.loaded_source = Some(track.source_url.clone());

        info!(
            track_id = track.id,
            source_id = source.id,
            generation = self.generation.value(),
            "loading track"
        );

        self.media.load(&track.source_url, self.generation);
        // Loading a source resets the primitive's rate; the chosen rate carries over
        self.media.set_playback_rate(self.state.playback_rate.as_f64());

        self.commit(StatePatch::TrackChanged {
            track,
            source,
            start_position: start_offset.unwrap_or(0.0),
        });
        self.request_play();
    }

    pub fn pause(&mut self) {
        if !self.has_source() {
            return;
        }
        self.media.pause();
    }

    pub fn resume(&mut self) {
        if !self.has_source() {
            return;
        }
        self.request_play();
    }

    /// Move the playhead without clamping; the primitive enforces its own limits
    pub fn seek(&mut self, seconds: f64) {
        if !self.has_source() {
            return;
        }
        self.seek_to(seconds);
    }

    /// Jump ahead, stopping at the end of the track
    pub fn skip_forward(&mut self, seconds: f64) {
        if !self.has_source() {
            return;
        }
        let mut target = self.playhead() + seconds;
        if let Some(duration) = self.known_duration() {
            target = target.min(duration);
        }
        self.seek_to(target.max(0.0));
    }

    /// Jump back, stopping at the start of the track
    pub fn skip_backward(&mut self, seconds: f64) {
        if !self.has_source() {
            return;
        }
        let target = (self.playhead() - seconds).max(0.0);
        self.seek_to(target);
    }

    /// Applies immediately and carries over to later tracks
    pub fn set_playback_rate(&mut self, rate: PlaybackRate) {
        self.media.set_playback_rate(rate.as_f64());
        self.commit(StatePatch::Rate(rate));
    }

    /// Start a sleep timer of `minutes`, replacing any running one, or clear
    /// it with `None` without touching playback
    pub fn set_sleep_timer(&mut self, minutes: Option<u32>) {
        match minutes {
            Some(minutes) => {
                self.sleep_timer.set(minutes, self.clock.now());
                debug!(minutes, "sleep timer set");
            }
            None => {
                self.sleep_timer.clear();
                debug!("sleep timer cleared");
            }
        }
        self.commit(StatePatch::SleepTimer {
            end_time: self.sleep_timer.end_time(),
            remaining: self.sleep_timer.remaining(),
        });
    }

    pub fn sleep_timer_active(&self) -> bool {
        self.sleep_timer.is_active()
    }

    /// Advance the sleep timer; called once per second by the driver
    pub fn tick_sleep_timer(&mut self) {
        match self.sleep_timer.tick(self.clock.now()) {
            SleepTick::Inactive => {}
            SleepTick::Remaining(remaining) => {
                if self.state.sleep_timer_remaining != Some(remaining) {
                    self.commit(StatePatch::SleepTimer {
                        end_time: self.sleep_timer.end_time(),
                        remaining: Some(remaining),
                    });
                }
            }
            SleepTick::Expired => {
                info!("sleep timer expired, pausing playback");
                self.media.pause();
                self.commit(StatePatch::SleepTimer {
                    end_time: None,
                    remaining: None,
                });
            }
        }
    }

    /// Fold one primitive event into the state
    pub fn handle_event(&mut self, tagged: TaggedEvent) {
        if tagged.generation != self.generation {
            trace!(
                event_generation = tagged.generation.value(),
                current_generation = self.generation.value(),
                "dropping event from superseded load"
            );
            return;
        }

        match tagged.event {
            MediaEvent::LoadStart => self.commit(StatePatch::Loading(true)),
            MediaEvent::LoadedMetadata => self.mark_ready(),
            MediaEvent::DurationChange(duration) => self.commit(StatePatch::Duration(duration)),
            MediaEvent::TimeUpdate(position) => {
                // The primitive still reports 0 until the start offset is applied
                if self.pending_seek.is_none() {
                    self.commit(StatePatch::Position(position));
                }
            }
            MediaEvent::Progress(buffered_end) => self.commit(StatePatch::Buffered(buffered_end)),
            MediaEvent::CanPlay => {
                self.mark_ready();
                self.commit(StatePatch::Loading(false));
            }
            MediaEvent::Play => self.commit(StatePatch::Playing),
            MediaEvent::Pause => self.commit(StatePatch::Paused),
            MediaEvent::Ended => self.commit(StatePatch::Ended),
            MediaEvent::Error(error) => {
                warn!(error = %error, "media error");
                self.commit(StatePatch::Loading(false));
            }
        }
    }

    fn request_play(&mut self) {
        if let Err(error) = self.media.play() {
            warn!(error = %error, "playback request rejected");
        }
    }

    fn mark_ready(&mut self) {
        self.ready = true;
        if let Some(offset) = self.pending_seek.take() {
            debug!(offset, "applying deferred start offset");
            self.media.set_current_time(offset);
            let position = self.media.current_time();
            self.commit(StatePatch::Position(position));
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        if self.ready {
            self.media.set_current_time(seconds);
            let position = self.media.current_time();
            self.commit(StatePatch::Position(position));
        } else {
            self.pending_seek = Some(seconds);
            self.commit(StatePatch::Position(seconds));
        }
    }

    fn playhead(&self) -> f64 {
        self.pending_seek
            .unwrap_or_else(|| self.media.current_time())
    }

    fn known_duration(&self) -> Option<f64> {
        self.media
            .duration()
            .filter(|duration| duration.is_finite() && *duration > 0.0)
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.media.pause();
        self.media.unload();
    }
}
