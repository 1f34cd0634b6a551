//! Sliding-window rate limiter for inference calls
//!
//! Each limited class (contract analysis, transaction analysis) owns its own
//! window of admission timestamps. Denied callers sleep until the oldest
//! admission ages out and then try again: calls are delayed, never dropped.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::models::config::RateLimitConfig;
use crate::models::errors::{AppError, AppResult};

pub struct RateLimiter {
    name: &'static str,
    max_requests: usize,
    window: Duration,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max_requests: usize, window: Duration) -> Self {
        Self {
            name,
            max_requests: max_requests.max(1),
            window,
            requests: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    pub fn from_config(name: &'static str, config: RateLimitConfig) -> Self {
        Self::new(name, config.max_requests, config.window)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn window_guard(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        // The deque is always left consistent, so a poisoned lock is still usable
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn prune(requests: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(&oldest) = requests.front() {
            if now.saturating_duration_since(oldest) >= window {
                requests.pop_front();
            } else {
                break;
            }
        }
    }

    /// Admit and record a request if the window has room
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut requests = self.window_guard();
        Self::prune(&mut requests, now, self.window);
        if requests.len() >= self.max_requests {
            return false;
        }
        requests.push_back(now);
        true
    }

    /// Delay until the oldest in-window request ages out; zero if not full
    pub fn wait_time(&self) -> Duration {
        self.wait_time_at(Instant::now())
    }

    pub fn wait_time_at(&self, now: Instant) -> Duration {
        let mut requests = self.window_guard();
        Self::prune(&mut requests, now, self.window);
        if requests.len() < self.max_requests {
            return Duration::ZERO;
        }
        match requests.front() {
            Some(&oldest) => (oldest + self.window).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Requests currently inside the window
    pub fn in_flight(&self) -> usize {
        let mut requests = self.window_guard();
        Self::prune(&mut requests, Instant::now(), self.window);
        requests.len()
    }

    /// Block the calling task until admitted. First-come-first-served on
    /// wake-up, no fairness beyond that.
    pub async fn acquire(&self, cancel: &CancellationToken) -> AppResult<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(AppError::cancelled("Rate limiter wait"));
            }
            if self.try_acquire() {
                return Ok(());
            }

            let wait = self.wait_time();
            info!(
                limiter = self.name,
                "⏳ Rate limit reached. Waiting {:.2} seconds",
                wait.as_secs_f64()
            );
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(AppError::cancelled("Rate limiter wait"));
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
