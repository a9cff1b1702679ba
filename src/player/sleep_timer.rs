// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Duration, Utc};

/// Durations offered by sleep timer pickers, in minutes
pub const SLEEP_TIMER_PRESETS: [u32; 5] = [5, 10, 15, 30, 60];

/// Result of checking the timer against the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepTick {
    /// No timer is set
    Inactive,
    /// Whole seconds left, rounded up
    Remaining(u64),
    /// The end time has passed; the timer has cleared itself
    Expired,
}

/// A single countdown that pauses playback when it runs out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SleepTimer {
    end_time: Option<DateTime<Utc>>,
    remaining: Option<u64>,
}

impl SleepTimer {
    /// Start (or restart) the countdown; a running timer is replaced
    pub fn set(&mut self, minutes: u32, now: DateTime<Utc>) {
        self.end_time = Some(now + Duration::minutes(i64::from(minutes)));
        self.remaining = Some(u64::from(minutes) * 60);
    }

    pub fn clear(&mut self) {
        self.end_time = None;
        self.remaining = None;
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_some()
    }

    /// Recompute the remaining seconds, clearing the timer once it expires
    pub fn tick(&mut self, now: DateTime<Utc>) -> SleepTick {
        let Some(end_time) = self.end_time else {
            return SleepTick::Inactive;
        };

        let remaining_ms = (end_time - now).num_milliseconds();
        if remaining_ms <= 0 {
            self.clear();
            return SleepTick::Expired;
        }

        // ceil(ms / 1000) for positive ms
        let remaining = (remaining_ms as u64).div_ceil(1000);
        self.remaining = Some(remaining);
        SleepTick::Remaining(remaining)
    }
}
