use crate::client::types::{CallProgress, CallResult};
use std::time::Duration;

const DEFAULT_PENDING_STATUSES: &[&str] = &["Pending", "Submitted", "Processing", "Queued", "Running"];

/// Status-polling policy for state-changing calls.
///
/// Important constraints:
/// - Polling only repeats on a *pending* status, never on an error.
/// - The loop gives up with `CallTimeout` once `timeout` of wall-clock time has
///   elapsed, and never earlier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before the second status check.
    pub initial_delay: Duration,
    /// Upper bound for a single backoff interval.
    pub max_delay: Duration,
    /// Total wall-clock budget for reaching a terminal status.
    pub timeout: Duration,
    /// Statuses (case-insensitive) meaning "not finished yet".
    pub pending_statuses: Vec<String>,
    /// The one terminal status that counts as success.
    pub success_status: String,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(60),
            pending_statuses: DEFAULT_PENDING_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            success_status: "Successful".to_string(),
        }
    }
}

impl PollPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pending_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Overlay `GATEWAY_POLL_*` environment variables on top of this policy.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(secs) = env_u64("GATEWAY_POLL_TIMEOUT_SECS") {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64("GATEWAY_POLL_INITIAL_DELAY_MS") {
            self.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("GATEWAY_POLL_MAX_DELAY_MS") {
            self.max_delay = Duration::from_millis(ms);
        }
        self
    }

    /// Exponential backoff: `initial_delay * 2^attempt`, capped at `max_delay`.
    ///
    /// `attempt` is 0-based (delay after the first pending answer => attempt=0).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis().min(u64::MAX as u128) as u64;
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(base.saturating_mul(factor));
        delay.min(self.max_delay)
    }

    pub fn is_pending(&self, status: &str) -> bool {
        let status = status.trim();
        status.is_empty()
            || self
                .pending_statuses
                .iter()
                .any(|p| p.eq_ignore_ascii_case(status))
    }

    /// Classify a status string reported by the gateway.
    pub fn classify(&self, status: Option<&str>) -> CallProgress {
        match status {
            Some(s) if !self.is_pending(s) => CallProgress::Terminal(CallResult {
                status: s.to_string(),
                is_successful: s == self.success_status,
            }),
            other => CallProgress::Pending {
                status: other.filter(|s| !s.is_empty()).map(|s| s.to_string()),
            },
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<u64>().ok())
}
