// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Writes the listening position to the progress store while playing.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, trace};

use crate::player::{PlayerState, SharedClock};
use crate::store::{ProgressUpdate, SharedAuth, SharedProgressStore};

/// Minimum time between two writes while playing
pub const SYNC_INTERVAL: Duration = Duration::from_secs(10);

/// The update a snapshot would be saved as, if there is anything to save
pub fn progress_update(state: &PlayerState) -> Option<ProgressUpdate> {
    let track = state.current_track.as_ref()?;
    let source = state.current_source.as_ref()?;
    if state.current_time <= 0.0 {
        return None;
    }

    Some(ProgressUpdate {
        episode_id: track.id,
        podcast_id: source.id,
        current_time: state.current_time,
        duration: state.effective_duration(),
    })
}

/// Decides which snapshots are worth a write
///
/// While playing, a write is due once [`SYNC_INTERVAL`] has passed since the
/// last successful one. Every new pause forces one write, including a pause
/// whose snapshot was coalesced away by a following play.
#[derive(Debug, Default)]
pub struct SyncCadence {
    last_sync: Option<DateTime<Utc>>,
    seen_pauses: u64,
}

impl SyncCadence {
    pub fn evaluate(&mut self, state: &PlayerState, now: DateTime<Utc>) -> Option<ProgressUpdate> {
        let pause_edge = state.pause_count != self.seen_pauses;
        self.seen_pauses = state.pause_count;

        let update = progress_update(state)?;
        if pause_edge || (state.is_playing && self.is_due(now)) {
            Some(update)
        } else {
            None
        }
    }

    /// Only successful writes push the next one back
    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_sync = Some(now);
    }

    fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_sync {
            None => true,
            Some(last) => (now - last)
                .to_std()
                .is_ok_and(|elapsed| elapsed >= SYNC_INTERVAL),
        }
    }
}

/// Follow the player's snapshots and save progress for the signed-in user
///
/// Snapshots are checked as they arrive and again every [`SYNC_INTERVAL`].
/// Runs until the player's state channel closes.
pub async fn run_progress_sync(
    mut state_rx: watch::Receiver<PlayerState>,
    store: SharedProgressStore,
    auth: SharedAuth,
    clock: SharedClock,
) {
    let mut cadence = SyncCadence::default();
    let mut ticker = tokio::time::interval(SYNC_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    debug!("player state channel closed, stopping progress sync");
                    break;
                }
            }
            _ = ticker.tick() => {}
        }

        let state = state_rx.borrow_and_update().clone();
        let now = clock.now();
        let Some(update) = cadence.evaluate(&state, now) else {
            continue;
        };

        let Some(identity) = auth.identity() else {
            trace!("not signed in, skipping progress sync");
            continue;
        };

        match store.update_progress(Some(&identity), &update).await {
            Ok(()) => {
                cadence.record_success(now);
                debug!(
                    episode_id = update.episode_id,
                    current_time = update.current_time,
                    "progress synced"
                );
            }
            Err(e) => error!(episode_id = update.episode_id, error = %e, "failed to sync progress"),
        }
    }
}
