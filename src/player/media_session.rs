// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mirrors the player into the operating system's media controls and routes
//! hardware keys and lock-screen actions back into the player.

use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

use super::controller::DEFAULT_SKIP_SECONDS;
use super::handle::PlayerHandle;
use super::state::PlayerState;
use crate::error::SurfaceError;

/// Metadata shown by the system for the current track
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub title: String,
    /// Author of the podcast
    pub artist: String,
    /// Title of the podcast
    pub album: String,
    pub artwork_url: Option<String>,
    /// Seconds, when known
    pub duration: Option<f64>,
}

impl NowPlaying {
    pub fn from_state(state: &PlayerState) -> Option<Self> {
        let track = state.current_track.as_ref()?;
        let source = state.current_source.as_ref()?;
        let duration = state.effective_duration();

        Some(Self {
            title: track.title.clone(),
            artist: source.author.clone(),
            album: source.title.clone(),
            artwork_url: track
                .artwork_url
                .clone()
                .or_else(|| source.artwork_url.clone()),
            duration: (duration > 0.0).then_some(duration),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Stopped,
    Playing,
    Paused,
}

/// Playback position as reported to the system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionPlayback {
    pub status: SessionStatus,
    pub position: f64,
    pub rate: f64,
    pub duration: f64,
}

impl SessionPlayback {
    pub fn from_state(state: &PlayerState) -> Self {
        let status = if state.current_track.is_none() {
            SessionStatus::Stopped
        } else if state.is_playing {
            SessionStatus::Playing
        } else if state.is_paused {
            SessionStatus::Paused
        } else {
            SessionStatus::Stopped
        };

        Self {
            status,
            position: state.current_time,
            rate: state.playback_rate.as_f64(),
            duration: state.effective_duration(),
        }
    }
}

/// Requests coming from the system's media controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaAction {
    Play,
    Pause,
    Toggle,
    /// Absolute position in seconds
    SeekTo(f64),
    /// Relative jump; `None` uses the default skip
    SeekForward(Option<f64>),
    SeekBackward(Option<f64>),
}

/// A platform media-session API
pub trait MediaSessionSurface: Send {
    /// Whether the platform offers a media session at all
    fn is_available(&self) -> bool {
        true
    }

    /// Show `now_playing`, or clear the display with `None`
    fn set_metadata(&mut self, now_playing: Option<&NowPlaying>) -> Result<(), SurfaceError>;

    fn set_playback(&mut self, playback: &SessionPlayback) -> Result<(), SurfaceError>;
}

/// Keeps a media-session surface in step with the player
///
/// Without a surface every update is a no-op.
pub struct MediaSessionBridge {
    surface: Option<Box<dyn MediaSessionSurface>>,
    shown: Option<NowPlaying>,
}

impl MediaSessionBridge {
    pub fn new(surface: Option<Box<dyn MediaSessionSurface>>) -> Self {
        let surface = surface.filter(|s| s.is_available());
        if surface.is_none() {
            debug!("no media session surface available");
        }
        Self {
            surface,
            shown: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.surface.is_some()
    }

    /// Push a snapshot; metadata is only re-sent when it changes
    pub fn update(&mut self, state: &PlayerState) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        let now_playing = NowPlaying::from_state(state);
        if now_playing != self.shown {
            match surface.set_metadata(now_playing.as_ref()) {
                Ok(()) => self.shown = now_playing,
                Err(e) => warn!(error = %e, "failed to update media session metadata"),
            }
        }

        let playback = SessionPlayback::from_state(state);
        if let Err(e) = surface.set_playback(&playback) {
            warn!(error = %e, "failed to update media session playback");
        } else {
            trace!(position = playback.position, "media session playback updated");
        }
    }
}

/// Route one media-session action into the player
pub fn apply_action(player: &PlayerHandle, action: MediaAction) {
    debug!(?action, "media session action");
    match action {
        MediaAction::Play => player.resume(),
        MediaAction::Pause => player.pause(),
        MediaAction::Toggle => player.toggle(),
        MediaAction::SeekTo(seconds) => player.seek(seconds),
        MediaAction::SeekForward(offset) => {
            player.skip_forward(offset.unwrap_or(DEFAULT_SKIP_SECONDS))
        }
        MediaAction::SeekBackward(offset) => {
            player.skip_backward(offset.unwrap_or(DEFAULT_SKIP_SECONDS))
        }
    }
}

/// Mirror snapshots into `bridge` and feed `actions` into the player
///
/// The task holds the player only weakly. It ends once the last
/// [`PlayerHandle`] is dropped, which closes the state channel.
pub async fn run_media_session(
    mut bridge: MediaSessionBridge,
    player: PlayerHandle,
    mut actions: mpsc::UnboundedReceiver<MediaAction>,
) {
    let player = player.downgrade();
    let mut state_rx: watch::Receiver<PlayerState> = player.subscribe();
    let initial = state_rx.borrow_and_update().clone();
    bridge.update(&initial);

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                bridge.update(&state);
            }
            Some(action) = actions.recv() => match player.upgrade() {
                Some(player) => apply_action(&player, action),
                None => break,
            },
        }
    }

    debug!("player dropped, stopping media session");
}

#[cfg(feature = "media-controls")]
pub use system::SystemMediaControls;

#[cfg(feature = "media-controls")]
mod system {
    use std::time::Duration;

    use souvlaki::{
        MediaControlEvent, MediaControls, MediaMetadata, MediaPlayback, MediaPosition,
        PlatformConfig, SeekDirection,
    };
    use tokio::sync::mpsc;
    use tracing::info;

    use super::{MediaAction, MediaSessionSurface, NowPlaying, SessionPlayback, SessionStatus};
    use crate::error::SurfaceError;

    /// Media session backed by the platform's native controls
    pub struct SystemMediaControls {
        controls: MediaControls,
    }

    impl SystemMediaControls {
        /// Register with the platform; actions are delivered through `actions`
        pub fn new(actions: mpsc::UnboundedSender<MediaAction>) -> Result<Self, SurfaceError> {
            let config = PlatformConfig {
                dbus_name: "podplay",
                display_name: "podplay",
                hwnd: None,
            };

            let mut controls = MediaControls::new(config).map_err(surface_error)?;
            controls
                .attach(move |event: MediaControlEvent| {
                    if let Some(action) = to_action(event) {
                        // The receiver is gone only during shutdown
                        let _ = actions.send(action);
                    }
                })
                .map_err(surface_error)?;

            info!("system media controls initialized");
            Ok(Self { controls })
        }
    }

    fn surface_error(e: souvlaki::Error) -> SurfaceError {
        SurfaceError::Failed(format!("{e:?}"))
    }

    fn to_action(event: MediaControlEvent) -> Option<MediaAction> {
        match event {
            MediaControlEvent::Play => Some(MediaAction::Play),
            MediaControlEvent::Pause => Some(MediaAction::Pause),
            MediaControlEvent::Toggle => Some(MediaAction::Toggle),
            MediaControlEvent::SetPosition(MediaPosition(position)) => {
                Some(MediaAction::SeekTo(position.as_secs_f64()))
            }
            MediaControlEvent::Seek(SeekDirection::Forward) => Some(MediaAction::SeekForward(None)),
            MediaControlEvent::Seek(SeekDirection::Backward) => {
                Some(MediaAction::SeekBackward(None))
            }
            MediaControlEvent::SeekBy(SeekDirection::Forward, by) => {
                Some(MediaAction::SeekForward(Some(by.as_secs_f64())))
            }
            MediaControlEvent::SeekBy(SeekDirection::Backward, by) => {
                Some(MediaAction::SeekBackward(Some(by.as_secs_f64())))
            }
            _ => None,
        }
    }

    fn position(seconds: f64) -> Option<MediaPosition> {
        Duration::try_from_secs_f64(seconds).ok().map(MediaPosition)
    }

    impl MediaSessionSurface for SystemMediaControls {
        fn set_metadata(&mut self, now_playing: Option<&NowPlaying>) -> Result<(), SurfaceError> {
            let metadata = match now_playing {
                Some(np) => MediaMetadata {
                    title: Some(np.title.as_str()),
                    artist: Some(np.artist.as_str()),
                    album: Some(np.album.as_str()),
                    cover_url: np.artwork_url.as_deref(),
                    duration: np.duration.and_then(|d| Duration::try_from_secs_f64(d).ok()),
                },
                None => MediaMetadata::default(),
            };
            self.controls.set_metadata(metadata).map_err(surface_error)
        }

        fn set_playback(&mut self, playback: &SessionPlayback) -> Result<(), SurfaceError> {
            let progress = position(playback.position);
            let playback = match playback.status {
                SessionStatus::Playing => MediaPlayback::Playing { progress },
                SessionStatus::Paused => MediaPlayback::Paused { progress },
                SessionStatus::Stopped => MediaPlayback::Stopped,
            };
            self.controls.set_playback(playback).map_err(surface_error)
        }
    }
}
