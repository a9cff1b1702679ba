// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use super::controller::PlaybackController;
use super::media::{MediaEventReceiver, TaggedEvent};
use super::rate::PlaybackRate;
use super::state::PlayerState;
use super::track::{Source, Track};
use crate::download::download_track;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// How often the driver advances the sleep timer
pub const SLEEP_TIMER_TICK: Duration = Duration::from_secs(1);

/// Cloneable access to the one controller of a process
///
/// Every call takes the lock for the duration of a single synchronous
/// controller operation; it is never held across an `.await`.
#[derive(Clone)]
pub struct PlayerHandle {
    inner: Arc<Mutex<PlaybackController>>,
    state_rx: watch::Receiver<PlayerState>,
}

impl PlayerHandle {
    pub fn new(controller: PlaybackController) -> Self {
        let state_rx = controller.subscribe();
        Self {
            inner: Arc::new(Mutex::new(controller)),
            state_rx,
        }
    }

    /// A reference for background tasks that must not keep the player alive
    pub fn downgrade(&self) -> WeakPlayerHandle {
        WeakPlayerHandle {
            inner: Arc::downgrade(&self.inner),
            state_rx: self.state_rx.clone(),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut PlaybackController) -> R) -> R {
        let mut controller = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut controller)
    }

    /// Latest published snapshot
    pub fn state(&self) -> PlayerState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state_rx.clone()
    }

    pub fn play(&self, track: Track, source: Source, start_offset: Option<f64>) {
        self.with(|c| c.play(track, source, start_offset));
    }

    pub fn pause(&self) {
        self.with(PlaybackController::pause);
    }

    pub fn resume(&self) {
        self.with(PlaybackController::resume);
    }

    /// Pause when playing, resume otherwise
    pub fn toggle(&self) {
        self.with(|c| {
            if c.state().is_playing {
                c.pause();
            } else {
                c.resume();
            }
        });
    }

    pub fn seek(&self, seconds: f64) {
        self.with(|c| c.seek(seconds));
    }

    pub fn skip_forward(&self, seconds: f64) {
        self.with(|c| c.skip_forward(seconds));
    }

    pub fn skip_backward(&self, seconds: f64) {
        self.with(|c| c.skip_backward(seconds));
    }

    pub fn set_playback_rate(&self, rate: PlaybackRate) {
        self.with(|c| c.set_playback_rate(rate));
    }

    pub fn set_sleep_timer(&self, minutes: Option<u32>) {
        self.with(|c| c.set_sleep_timer(minutes));
    }

    pub fn handle_event(&self, event: TaggedEvent) {
        self.with(|c| c.handle_event(event));
    }

    pub fn tick_sleep_timer(&self) {
        self.with(PlaybackController::tick_sleep_timer);
    }

    /// Save the current track's audio into `output_dir`
    ///
    /// Without a current track nothing is fetched. Failures are logged and
    /// reported, never returned; `None` means nothing was saved.
    pub async fn download<C: HttpClient + ?Sized>(
        &self,
        client: &C,
        output_dir: &Path,
        reporter: &SharedProgressReporter,
    ) -> Option<PathBuf> {
        let track = self.with(|c| c.current_track().cloned())?;

        match download_track(client, &track, output_dir, reporter).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!(track_id = track.id, error = %e, "download failed");
                reporter.report(ProgressEvent::DownloadFailed {
                    title: track.title.clone(),
                    error: e.to_string(),
                });
                None
            }
        }
    }
}

/// Non-owning [`PlayerHandle`]
///
/// Once every `PlayerHandle` is gone the controller is dropped, which unloads
/// the primitive and closes the state channel.
#[derive(Clone)]
pub struct WeakPlayerHandle {
    inner: Weak<Mutex<PlaybackController>>,
    state_rx: watch::Receiver<PlayerState>,
}

impl WeakPlayerHandle {
    pub fn upgrade(&self) -> Option<PlayerHandle> {
        Some(PlayerHandle {
            inner: self.inner.upgrade()?,
            state_rx: self.state_rx.clone(),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state_rx.clone()
    }
}

/// Feed primitive events and sleep-timer ticks into the controller in
/// arrival order
///
/// Holds the player only weakly and stops once the event channel closes or
/// the last [`PlayerHandle`] is dropped.
pub async fn run_player(handle: PlayerHandle, mut events: MediaEventReceiver) {
    let player = handle.downgrade();
    drop(handle);

    let mut ticker = tokio::time::interval(SLEEP_TIMER_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let step = tokio::select! {
            event = events.recv() => match event {
                Some(event) => player.upgrade().map(|p| p.handle_event(event)),
                None => {
                    debug!("media event channel closed, stopping player driver");
                    break;
                }
            },
            _ = ticker.tick() => player.upgrade().map(|p| p.tick_sleep_timer()),
        };

        if step.is_none() {
            debug!("player dropped, stopping player driver");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::DateTime;
    use tempfile::tempdir;

    use crate::download::tests::{MockAudioServer, make_track};
    use crate::player::clock::ManualClock;
    use crate::player::media::fake::FakeMedia;
    use crate::player::media::{MediaEvent, event_channel};
    use crate::progress::NoopReporter;

    fn setup() -> (PlayerHandle, FakeMedia, ManualClock) {
        let media = FakeMedia::new();
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let controller = PlaybackController::new(Box::new(media.clone()), Arc::new(clock.clone()));
        (PlayerHandle::new(controller), media, clock)
    }

    fn source() -> Source {
        Source {
            id: 7,
            title: "Show".to_string(),
            author: "Host".to_string(),
            artwork_url: None,
        }
    }

    #[tokio::test]
    async fn download_without_track_fetches_nothing() {
        let (handle, _, _) = setup();
        let dir = tempdir().unwrap();
        let client = MockAudioServer::new(200, b"audio");

        let saved = handle
            .download(&client, dir.path(), &NoopReporter::shared())
            .await;

        assert!(saved.is_none());
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn download_saves_current_track() {
        let (handle, _, _) = setup();
        let dir = tempdir().unwrap();
        let client = MockAudioServer::new(200, b"audio");
        handle.play(make_track(), source(), None);

        let saved = handle
            .download(&client, dir.path(), &NoopReporter::shared())
            .await;

        assert_eq!(saved, Some(dir.path().join("Test Episode.mpeg")));
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn download_failure_is_swallowed() {
        let (handle, _, _) = setup();
        let dir = tempdir().unwrap();
        let client = MockAudioServer::new(500, b"oops");
        handle.play(make_track(), source(), None);

        let saved = handle
            .download(&client, dir.path(), &NoopReporter::shared())
            .await;

        assert!(saved.is_none());
        assert!(handle.state().current_track.is_some());
    }

    #[test]
    fn toggle_switches_between_pause_and_resume() {
        let (handle, media, _) = setup();
        handle.play(make_track(), source(), None);
        let generation = handle.with(|c| c.generation());
        handle.handle_event(TaggedEvent {
            generation,
            event: MediaEvent::Play,
        });

        handle.toggle();
        assert_eq!(media.inspect(|m| m.pause_calls), 1);

        handle.handle_event(TaggedEvent {
            generation,
            event: MediaEvent::Pause,
        });
        handle.toggle();
        assert_eq!(media.inspect(|m| m.play_calls), 2);
    }

    #[tokio::test]
    async fn driver_applies_events_in_order() {
        let (handle, _, _) = setup();
        let (tx, rx) = event_channel();
        handle.play(make_track(), source(), None);
        let generation = handle.with(|c| c.generation());

        for event in [
            MediaEvent::LoadStart,
            MediaEvent::DurationChange(1800.0),
            MediaEvent::CanPlay,
            MediaEvent::Play,
            MediaEvent::TimeUpdate(12.5),
        ] {
            tx.send(TaggedEvent { generation, event }).unwrap();
        }
        drop(tx);

        run_player(handle.clone(), rx).await;

        let state = handle.state();
        assert!(state.is_playing);
        assert!(!state.is_loading);
        assert_eq!(state.duration, 1800.0);
        assert_eq!(state.current_time, 12.5);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_expires_sleep_timer() {
        let (handle, media, clock) = setup();
        handle.play(make_track(), source(), None);
        handle.set_sleep_timer(Some(5));
        clock.advance(chrono::Duration::seconds(300));

        let (tx, rx) = event_channel();
        let driver = tokio::spawn(run_player(handle.clone(), rx));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(media.inspect(|m| m.pause_calls), 1);
        assert!(handle.state().sleep_timer_remaining.is_none());

        drop(tx);
        driver.await.unwrap();
    }

    #[tokio::test]
    async fn driver_stops_when_player_is_dropped() {
        let (handle, media, _) = setup();
        handle.play(make_track(), source(), None);
        let (_tx, rx) = event_channel();

        let driver = tokio::spawn(run_player(handle.clone(), rx));
        tokio::task::yield_now().await;
        drop(handle);

        tokio::time::timeout(Duration::from_secs(5), driver)
            .await
            .expect("driver should stop once the player is gone")
            .unwrap();
        assert_eq!(media.inspect(|m| m.source.clone()), None);
    }

    #[test]
    fn weak_handle_does_not_keep_player_alive() {
        let (handle, media, _) = setup();
        handle.play(make_track(), source(), None);
        let weak = handle.downgrade();
        let mut state_rx = weak.subscribe();

        assert!(weak.upgrade().is_some());
        drop(handle);

        assert!(weak.upgrade().is_none());
        assert!(state_rx.has_changed().is_err());
        assert_eq!(media.inspect(|m| m.source.clone()), None);
    }
}
