// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Playback controller, its driver and the ways to reach it.

mod clock;
mod controller;
mod handle;
mod media;
pub mod media_session;
mod rate;
pub mod scope;
mod sleep_timer;
mod state;
mod track;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use controller::{DEFAULT_SKIP_SECONDS, PlaybackController};
pub use handle::{PlayerHandle, SLEEP_TIMER_TICK, WeakPlayerHandle, run_player};
pub use media::{
    LoadGeneration, MediaElement, MediaEvent, MediaEventReceiver, MediaEventSender, TaggedEvent,
    event_channel,
};
pub use rate::PlaybackRate;
pub use sleep_timer::{SLEEP_TIMER_PRESETS, SleepTick, SleepTimer};
pub use state::{PlayerState, TransportState};
pub use track::{Source, Track};

#[cfg(test)]
pub(crate) use media::fake;
