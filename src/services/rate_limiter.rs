//! Sign-in throttling
//!
//! Sliding-window counters keyed by email (failed attempts) and by client IP
//! (all attempts). Counters live in memory and reset on restart.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// Failed sign-ins allowed per email within [`EMAIL_WINDOW_MINUTES`]
pub const MAX_FAILURES_PER_EMAIL: usize = 5;
pub const EMAIL_WINDOW_MINUTES: i64 = 15;
/// Sign-in attempts allowed per IP within one minute
pub const MAX_ATTEMPTS_PER_IP: usize = 10;

/// Counts events per key over a trailing window.
pub struct SlidingWindow {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl SlidingWindow {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `key` has reached the limit
    pub async fn is_limited(&self, key: &str) -> bool {
        self.is_limited_at(key, Utc::now()).await
    }

    pub async fn record(&self, key: &str) {
        self.record_at(key, Utc::now()).await
    }

    pub async fn clear(&self, key: &str) {
        self.hits.lock().await.remove(key);
    }

    /// Drop keys with no hits inside the window
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        self.hits.lock().await.retain(|_, times| {
            prune(times, cutoff);
            !times.is_empty()
        });
    }

    async fn is_limited_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut hits = self.hits.lock().await;
        match hits.get_mut(key) {
            Some(times) => {
                prune(times, now - self.window);
                times.len() >= self.limit
            }
            None => false,
        }
    }

    async fn record_at(&self, key: &str, now: DateTime<Utc>) {
        let mut hits = self.hits.lock().await;
        let times = hits.entry(key.to_string()).or_default();
        prune(times, now - self.window);
        times.push_back(now);
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.hits.lock().await.len()
    }
}

fn prune(times: &mut VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) {
    while times.front().is_some_and(|t| *t <= cutoff) {
        times.pop_front();
    }
}

/// Per-email and per-IP limits for the sign-in endpoint.
pub struct LoginRateLimiter {
    failures_by_email: SlidingWindow,
    attempts_by_ip: SlidingWindow,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            failures_by_email: SlidingWindow::new(
                MAX_FAILURES_PER_EMAIL,
                Duration::minutes(EMAIL_WINDOW_MINUTES),
            ),
            attempts_by_ip: SlidingWindow::new(MAX_ATTEMPTS_PER_IP, Duration::minutes(1)),
        }
    }

    pub async fn is_email_limited(&self, email: &str) -> bool {
        self.failures_by_email.is_limited(&email.trim().to_lowercase()).await
    }

    pub async fn record_failure(&self, email: &str) {
        self.failures_by_email.record(&email.trim().to_lowercase()).await
    }

    /// Successful sign-in resets the email's failure count
    pub async fn clear_email(&self, email: &str) {
        self.failures_by_email.clear(&email.trim().to_lowercase()).await
    }

    /// Count an attempt from `ip`; returns `false` if it is over the limit.
    pub async fn admit_ip(&self, ip: &str) -> bool {
        if self.attempts_by_ip.is_limited(ip).await {
            return false;
        }
        self.attempts_by_ip.record(ip).await;
        true
    }

    pub async fn cleanup(&self) {
        self.failures_by_email.cleanup().await;
        self.attempts_by_ip.cleanup().await;
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
