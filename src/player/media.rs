// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tokio::sync::mpsc;

use crate::error::MediaError;

/// Identifies one `load` of a media source
///
/// Every load of a new source gets a fresh generation. Events carry the
/// generation they were produced under, so events from a superseded load can
/// be told apart from the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadGeneration(u64);

impl LoadGeneration {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Events emitted by a media primitive
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Loading of a new source started
    LoadStart,
    /// Duration and seekability are known
    LoadedMetadata,
    /// Duration in seconds; non-finite values mean unknown
    DurationChange(f64),
    /// Playback position in seconds
    TimeUpdate(f64),
    /// End of the contiguous buffered range, in seconds
    Progress(f64),
    /// Enough data is available to start playback
    CanPlay,
    Play,
    Pause,
    Ended,
    Error(MediaError),
}

/// An event tagged with the load it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    pub generation: LoadGeneration,
    pub event: MediaEvent,
}

/// Sender half used by media primitives to deliver events
pub type MediaEventSender = mpsc::UnboundedSender<TaggedEvent>;
/// Receiver half drained by the player driver
pub type MediaEventReceiver = mpsc::UnboundedReceiver<TaggedEvent>;

/// Create the channel a media primitive reports its events through
pub fn event_channel() -> (MediaEventSender, MediaEventReceiver) {
    mpsc::unbounded_channel()
}

/// A native audio playback object driven by the controller
///
/// Commands return immediately. Their effects are reported asynchronously as
/// [`MediaEvent`]s tagged with the generation passed to the last `load`.
pub trait MediaElement: Send {
    /// Replace the current source and start loading it
    fn load(&mut self, url: &str, generation: LoadGeneration);

    /// Request playback. An `Err` is an immediate rejection; later failures
    /// arrive as [`MediaEvent::Error`].
    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Move the playhead. The primitive may clamp the value.
    fn set_current_time(&mut self, seconds: f64);

    /// Duration in seconds, if known
    fn duration(&self) -> Option<f64>;

    fn set_playback_rate(&mut self, rate: f64);

    /// Stop playback and release the source
    fn unload(&mut self);
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    pub(crate) struct FakeMediaState {
        pub source: Option<String>,
        pub generation: LoadGeneration,
        pub current_time: f64,
        pub duration: Option<f64>,
        pub rate: f64,
        pub play_calls: usize,
        pub pause_calls: usize,
        pub loads: Vec<String>,
        pub seeks: Vec<f64>,
        pub reject_play: Option<MediaError>,
    }

    /// Records every command; tests deliver events by hand
    #[derive(Debug, Clone, Default)]
    pub(crate) struct FakeMedia {
        pub state: Arc<Mutex<FakeMediaState>>,
    }

    impl FakeMedia {
        pub fn new() -> Self {
            let media = Self::default();
            media.state.lock().unwrap().rate = 1.0;
            media
        }

        pub fn inspect<R>(&self, f: impl FnOnce(&FakeMediaState) -> R) -> R {
            f(&self.state.lock().unwrap())
        }

        pub fn set_duration(&self, duration: f64) {
            self.state.lock().unwrap().duration = Some(duration);
        }

        pub fn set_time(&self, seconds: f64) {
            self.state.lock().unwrap().current_time = seconds;
        }

        pub fn reject_next_play(&self, error: MediaError) {
            self.state.lock().unwrap().reject_play = Some(error);
        }
    }

    impl MediaElement for FakeMedia {
        fn load(&mut self, url: &str, generation: LoadGeneration) {
            let mut state = self.state.lock().unwrap();
            state.source = Some(url.to_string());
            state.generation = generation;
            state.current_time = 0.0;
            state.duration = None;
            state.loads.push(url.to_string());
        }

        fn play(&mut self) -> Result<(), MediaError> {
            let mut state = self.state.lock().unwrap();
            state.play_calls += 1;
            match state.reject_play.take() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }

        fn pause(&mut self) {
            self.state.lock().unwrap().pause_calls += 1;
        }

        fn current_time(&self) -> f64 {
            self.state.lock().unwrap().current_time
        }

        fn set_current_time(&mut self, seconds: f64) {
            let mut state = self.state.lock().unwrap();
            state.current_time = seconds;
            state.seeks.push(seconds);
        }

        fn duration(&self) -> Option<f64> {
            self.state.lock().unwrap().duration
        }

        fn set_playback_rate(&mut self, rate: f64) {
            self.state.lock().unwrap().rate = rate;
        }

        fn unload(&mut self) {
            let mut state = self.state.lock().unwrap();
            state.source = None;
        }
    }
}
