use std::collections::HashMap;
use tokio::sync::RwLock;
use chrono::{DateTime, Utc, Duration};

use crate::config::RateLimitSettings;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_size: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_size: Duration::minutes(1),
            max_requests: 5,  // 5 generations per window
        }
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            window_size: Duration::seconds(settings.window_secs as i64),
            max_requests: settings.max_requests,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { count: u32, reset_at: DateTime<Utc> },
    Denied { count: u32, reset_at: DateTime<Utc> },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }

    /// Whole seconds until the window resets, never less than one.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let reset_at = match self {
            RateLimitDecision::Allowed { reset_at, .. } | RateLimitDecision::Denied { reset_at, .. } => *reset_at,
        };
        let millis = (reset_at - now).num_milliseconds().max(0) as u64;
        ((millis + 999) / 1000).max(1)
    }
}

#[derive(Debug)]
struct RateWindow {
    count: u32,
    reset_at: DateTime<Utc>,
}

impl RateWindow {
    fn new(now: DateTime<Utc>, window_size: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + window_size,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_at
    }
}

/// Fixed-window request counter keyed by verified subject id.
///
/// State lives in process memory only and is lost on restart. Denied
/// attempts still count against the window.
pub struct RateLimiter {
    windows: RwLock<HashMap<String, RateWindow>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub async fn check_rate_limit(&self, subject_id: &str) -> RateLimitDecision {
        self.check_rate_limit_at(subject_id, Utc::now()).await
    }

    pub async fn check_rate_limit_at(&self, subject_id: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let mut windows = self.windows.write().await;

        // Get or create window for subject
        let window = windows
            .entry(subject_id.to_string())
            .or_insert_with(|| RateWindow::new(now, self.config.window_size));

        if window.is_expired(now) {
            *window = RateWindow::new(now, self.config.window_size);
        }

        window.count = window.count.saturating_add(1);

        if window.count > self.config.max_requests {
            RateLimitDecision::Denied { count: window.count, reset_at: window.reset_at }
        } else {
            RateLimitDecision::Allowed { count: window.count, reset_at: window.reset_at }
        }
    }

    /// Drops windows that have already expired. Returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        self.cleanup_at(Utc::now()).await
    }

    pub async fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, window| !window.is_expired(now));
        before - windows.len()
    }

    pub async fn tracked_subjects(&self) -> usize {
        self.windows.read().await.len()
    }
}
