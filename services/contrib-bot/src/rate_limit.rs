//! Daily Rate Limiter
//!
//! Process-local counter of commit attempts per UTC day. It resets when the
//! UTC date changes or the process restarts, so with several instances
//! running the bound is per instance, not global.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::BotError;

/// Commits allowed per UTC day
pub const DAILY_COMMIT_LIMIT: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RateLimitState {
    day: Option<NaiveDate>,
    count: u32,
}

/// A granted slot, counted against the UTC day it was taken on.
///
/// Not `Clone`: [`DailyRateLimiter::release`] consumes it, so one grant can be
/// handed back at most once.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct RatePermit {
    #[serde(skip)]
    day: NaiveDate,
    pub remaining: u32,
    pub max: u32,
}

/// Per-process daily quota
#[derive(Debug)]
pub struct DailyRateLimiter {
    max: u32,
    state: Mutex<RateLimitState>,
}

impl Default for DailyRateLimiter {
    fn default() -> Self {
        Self::new(DAILY_COMMIT_LIMIT)
    }
}

impl DailyRateLimiter {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            state: Mutex::new(RateLimitState {
                day: None,
                count: 0,
            }),
        }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    fn lock(&self) -> MutexGuard<'_, RateLimitState> {
        // The state is two plain fields; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take one slot for the current UTC day
    pub fn try_acquire(&self) -> Result<RatePermit, BotError> {
        self.try_acquire_at(Utc::now())
    }

    /// Take one slot for the UTC day of `now`
    pub fn try_acquire_at(&self, now: DateTime<Utc>) -> Result<RatePermit, BotError> {
        let today = now.date_naive();
        let mut state = self.lock();

        if state.day != Some(today) {
            *state = RateLimitState {
                day: Some(today),
                count: 0,
            };
        }

        if state.count >= self.max {
            return Err(BotError::RateLimitExceeded {
                count: state.count,
                max: self.max,
            });
        }

        state.count += 1;
        Ok(RatePermit {
            day: today,
            remaining: self.max - state.count,
            max: self.max,
        })
    }

    /// Hand a slot back after the protected operation failed.
    ///
    /// No-op when the day has rolled over since the permit was granted.
    ///
    /// ```compile_fail
    /// use contrib_bot::DailyRateLimiter;
    ///
    /// let limiter = DailyRateLimiter::default();
    /// let permit = limiter.try_acquire().unwrap();
    /// limiter.release(permit);
    /// limiter.release(permit);
    /// ```
    pub fn release(&self, permit: RatePermit) {
        let mut state = self.lock();
        if state.day == Some(permit.day) && state.count > 0 {
            state.count -= 1;
        }
    }

    /// Slots used on the UTC day of `now`
    pub fn used_at(&self, now: DateTime<Utc>) -> u32 {
        let state = self.lock();
        if state.day == Some(now.date_naive()) {
            state.count
        } else {
            0
        }
    }
}
