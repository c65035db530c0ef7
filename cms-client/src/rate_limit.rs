use std::time::Duration;

use shared::counter;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::metrics_defs::RATE_LIMIT_WAITS;

/// Minimum spacing between two outbound CMS calls.
pub const MIN_REQUEST_SPACING: Duration = Duration::from_secs(1);

/// One-shot extra delay armed when the remaining quota runs low.
pub const LOW_QUOTA_PENALTY: Duration = Duration::from_secs(2);

/// Remaining-quota level below which the penalty is armed.
const LOW_QUOTA_WATERMARK: u64 = 10;

struct LimiterState {
    last_call: Option<Instant>,
    penalty: Duration,
}

/// Paces all outbound CMS traffic for the process.
///
/// One instance is shared by every request flow. The mutex is held across the
/// wait itself, so two concurrent flows cannot both observe "no wait needed"
/// and burst the upstream.
pub struct RateLimiter {
    min_spacing: Duration,
    quota_penalty: Duration,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(min_spacing: Duration, quota_penalty: Duration) -> Self {
        Self {
            min_spacing,
            quota_penalty,
            state: Mutex::new(LimiterState {
                last_call: None,
                penalty: Duration::ZERO,
            }),
        }
    }

    /// Wait until the next outbound call is allowed, then mark it as issued.
    ///
    /// The first call never waits. A pending low-quota penalty is consumed
    /// here whether or not it ends up causing a wait.
    pub async fn throttle(&self) {
        let mut state = self.state.lock().await;
        let penalty = std::mem::take(&mut state.penalty);

        if let Some(last_call) = state.last_call {
            let required = self.min_spacing + penalty;
            let elapsed = last_call.elapsed();
            if elapsed < required {
                counter!(RATE_LIMIT_WAITS).increment(1);
                tokio::time::sleep(required - elapsed).await;
            }
        }

        state.last_call = Some(Instant::now());
    }

    /// Feed the upstream's remaining-quota header back into the limiter.
    pub async fn note_remaining_quota(&self, remaining: u64) {
        if remaining < LOW_QUOTA_WATERMARK {
            tracing::warn!(
                remaining,
                "approaching upstream rate limit, delaying the next call"
            );
            self.state.lock().await.penalty = self.quota_penalty;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MIN_REQUEST_SPACING, LOW_QUOTA_PENALTY)
    }
}
