// Rate limiting for feed API calls.
//
// Two concerns live here:
//
// - Classification: a pure inspection of a failed response (status code plus
//   the remaining-quota and reset headers) that yields a suggested resume
//   delay. The loader never retries on its own; the delay travels up inside
//   FetchError::RateLimited and the scheduler uses it to push back the next
//   cycle for that target.
// - Pacing: a sliding-window limiter the HTTP client acquires before every
//   request so a single process stays under the per-window quota. It is
//   shared by all target tasks via Arc<ApiClient>, using interior mutability
//   so callers only need &self.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use tracing::info;

/// Header carrying the number of calls left in the current window.
pub const REMAINING_HEADER: &str = "x-rate-limit-remaining";

/// Header carrying the window reset time as epoch seconds.
pub const RESET_HEADER: &str = "x-rate-limit-reset";

/// Delay suggested when the API reports a limit but no reset time.
pub const DEFAULT_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Rate-limit counters reported on a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: Option<u32>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitInfo {
    /// Read the quota headers. Missing or malformed headers become `None`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_u64 = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };

        let remaining = header_u64(REMAINING_HEADER).map(|v| v.min(u32::MAX as u64) as u32);
        let reset_at = header_u64(RESET_HEADER)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        Self {
            remaining,
            reset_at,
        }
    }
}

/// Decide whether a failed response was a rate limit and, if so, how long to
/// wait before trying again.
///
/// A response counts as rate limited when the status is 429 or the quota
/// header says nothing is left. The delay runs until the reported reset time
/// (zero if that is already in the past) or `DEFAULT_LIMIT_WINDOW` when no
/// reset time was given.
pub fn suggested_delay(status: u16, info: &RateLimitInfo, now: DateTime<Utc>) -> Option<Duration> {
    let limited = status == 429 || info.remaining == Some(0);
    if !limited {
        return None;
    }

    match info.reset_at {
        Some(reset_at) => Some((reset_at - now).to_std().unwrap_or(Duration::ZERO)),
        None => Some(DEFAULT_LIMIT_WINDOW),
    }
}

/// Client-side pacing: at most `max_requests` calls in any `window`.
pub struct RateLimiter {
    /// Send times still inside the window, oldest first.
    requests: Mutex<VecDeque<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests_per_window: u32, window: Duration) -> Self {
        Self {
            requests: Mutex::new(VecDeque::new()),
            max_requests: max_requests_per_window.max(1),
            window,
        }
    }

    /// Wait until a request slot is free, then claim it.
    pub async fn acquire(&self) {
        loop {
            // The guard must be gone before the sleep below.
            let wait = {
                let now = Instant::now();
                let mut requests = self.requests.lock().unwrap();

                while let Some(&oldest) = requests.front() {
                    if now.duration_since(oldest) >= self.window {
                        requests.pop_front();
                    } else {
                        break;
                    }
                }

                if (requests.len() as u32) < self.max_requests {
                    requests.push_back(now);
                    None
                } else {
                    requests
                        .front()
                        .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
                }
            };

            match wait {
                None => return,
                Some(wait) => {
                    info!(
                        delay_ms = wait.as_millis() as u64,
                        "Request budget spent, pausing"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
