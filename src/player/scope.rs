// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::future::Future;

use super::handle::PlayerHandle;
use crate::error::PlayerError;

tokio::task_local! {
    static CURRENT_PLAYER: PlayerHandle;
}

/// Run `future` with `handle` as the current player
pub async fn scope<F: Future>(handle: PlayerHandle, future: F) -> F::Output {
    CURRENT_PLAYER.scope(handle, future).await
}

/// Run `f` with `handle` as the current player
pub fn sync_scope<R>(handle: PlayerHandle, f: impl FnOnce() -> R) -> R {
    CURRENT_PLAYER.sync_scope(handle, f)
}

/// The player of the enclosing scope
pub fn try_current() -> Result<PlayerHandle, PlayerError> {
    CURRENT_PLAYER
        .try_with(PlayerHandle::clone)
        .map_err(|_| PlayerError::OutsideScope)
}

/// The player of the enclosing scope
///
/// # Panics
///
/// Panics when called outside [`scope`] or [`sync_scope`].
pub fn current() -> PlayerHandle {
    match try_current() {
        Ok(handle) => handle,
        Err(e) => panic!("{e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::player::clock::SystemClock;
    use crate::player::controller::PlaybackController;
    use crate::player::media::fake::FakeMedia;
    use crate::player::rate::PlaybackRate;

    fn handle() -> PlayerHandle {
        PlayerHandle::new(PlaybackController::new(
            Box::new(FakeMedia::new()),
            SystemClock::shared(),
        ))
    }

    #[test]
    fn outside_scope_is_an_error() {
        assert_eq!(try_current().err(), Some(PlayerError::OutsideScope));
    }

    #[test]
    #[should_panic(expected = "No player is active")]
    fn infallible_accessor_panics_outside_scope() {
        let _ = current();
    }

    #[test]
    fn sync_scope_exposes_handle() {
        let player = handle();
        sync_scope(player.clone(), || {
            current().set_playback_rate(PlaybackRate::Double);
        });

        assert_eq!(player.state().playback_rate, PlaybackRate::Double);
    }

    #[tokio::test]
    async fn async_scope_survives_await_points() {
        let player = handle();

        scope(player.clone(), async {
            tokio::task::yield_now().await;
            try_current().unwrap().set_sleep_timer(Some(15));
        })
        .await;

        assert_eq!(player.state().sleep_timer_remaining, Some(900));
        assert!(try_current().is_err());
    }
}
