use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default quota window length in seconds.
pub const WINDOW_SECS: i64 = 60;

/// Per-client rate-limit state: request count since the window opened.
#[derive(Debug, Clone, Copy)]
struct QuotaWindow {
    count: u32,
    window_start: DateTime<Utc>,
}

/// An in-process sliding-window quota table, one per gated endpoint.
///
/// The window restarts relative to the first request that opened it, not on
/// wall-clock boundaries. Entries are created lazily and live for the
/// process lifetime; state resets on restart, so across multiple instances
/// this is best-effort deterrence rather than a hard guarantee.
#[derive(Clone)]
pub struct QuotaTable {
    ceiling: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, QuotaWindow>>>,
}

impl QuotaTable {
    /// Creates a new `QuotaTable`.
    ///
    /// # Arguments
    ///
    /// * `ceiling` - Maximum requests per client per window.
    pub fn new(ceiling: u32) -> Self {
        Self::with_window(ceiling, Duration::seconds(WINDOW_SECS))
    }

    /// Creates a new `QuotaTable` with an explicit window length.
    pub fn with_window(ceiling: u32, window: Duration) -> Self {
        Self {
            ceiling,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers one request for `identity` and reports whether it is within
    /// quota.
    ///
    /// Increment-then-compare happens under the table lock so two concurrent
    /// requests cannot both slip under the ceiling.
    ///
    /// # Arguments
    ///
    /// * `identity` - The client identity bucket.
    /// * `now` - The current time.
    ///
    /// # Returns
    ///
    /// `true` if the request is allowed, `false` if the quota is exceeded.
    pub async fn register(&self, identity: &str, now: DateTime<Utc>) -> bool {
        let mut windows = self.windows.lock().await;

        let entry = windows
            .entry(identity.to_string())
            .or_insert(QuotaWindow {
                count: 0,
                window_start: now,
            });

        if now - entry.window_start > self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= self.ceiling
    }

    /// The configured per-window ceiling.
    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }
}
