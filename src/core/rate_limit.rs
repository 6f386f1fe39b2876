//! Fixed-window request limiter for the automated generation endpoint.
//!
//! Each identifier gets `max_requests` per window, counted from its
//! first request. Windows do not slide, so up to twice the limit can
//! pass across a window boundary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

/// Identifier used when the client cannot be identified
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Limits for one limiter instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Interval between sweeps of expired entries (default: 300 = 5 min)
    #[serde(default = "default_sweep_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_max_requests() -> u32 {
    5
}
fn default_window_seconds() -> u64 {
    3600
}
fn default_sweep_seconds() -> u64 {
    300
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
            sweep_interval_seconds: default_sweep_seconds(),
        }
    }
}

/// Per-identifier window state
#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// In-memory fixed-window limiter
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.window_seconds as i64)
    }

    /// Count a request from `identifier` now
    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        self.check_at(identifier, Utc::now())
    }

    /// Count a request from `identifier` at `now`
    pub fn check_at(&self, identifier: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let limit = self.config.max_requests;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let entry = entries
            .entry(identifier.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                reset_at: now,
            });

        if entry.count == 0 || now >= entry.reset_at {
            *entry = RateLimitEntry {
                count: 1,
                reset_at: now + self.window(),
            };
        } else if entry.count < limit {
            entry.count += 1;
        } else {
            debug!(identifier, "Rate limit reached");
            return RateLimitDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_at: entry.reset_at,
            };
        }

        RateLimitDecision {
            allowed: entry.count <= limit,
            limit,
            remaining: limit.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    /// Drop entries whose window has elapsed; returns how many were removed
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at > now);
        before - entries.len()
    }

    /// Number of tracked identifiers
    pub fn tracked(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Start the background sweep task
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.sweep_interval_seconds.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = self.sweep_expired(Utc::now());
                if removed > 0 {
                    debug!(removed, "Swept expired rate limit entries");
                }
            }
        })
    }
}

/// Client identifier from an `X-Forwarded-For` value
pub fn client_identifier(forwarded_for: Option<&str>) -> String {
    forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
