use std::collections::BTreeSet;
use std::time::Duration;

use super::HttpError;

/// Fixed wait between attempts used by the points API call sites.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// The only status the profile fetch treats as transient.
pub const BAD_GATEWAY: u16 = 502;

/// When and how often a failed request is repeated.
///
/// `retry_all` retries every transport or status failure; otherwise only
/// statuses listed in `retry_statuses` are retried. A body that fails to
/// decode is never retried. `max_attempts = None` retries forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_all: bool,
    pub retry_statuses: BTreeSet<u16>,
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Single attempt; every failure is returned to the caller.
    pub fn none() -> Self {
        Self {
            retry_all: false,
            retry_statuses: BTreeSet::new(),
            delay: Duration::ZERO,
            max_attempts: Some(1),
        }
    }

    /// Retry any failure with a fixed delay.
    pub fn unconditional(delay: Duration) -> Self {
        Self {
            retry_all: true,
            retry_statuses: BTreeSet::new(),
            delay,
            max_attempts: None,
        }
    }

    /// Retry only responses with one of the given statuses.
    pub fn on_statuses(statuses: impl IntoIterator<Item = u16>, delay: Duration) -> Self {
        Self {
            retry_all: false,
            retry_statuses: statuses.into_iter().collect(),
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Whether this failure is worth another attempt.
    pub fn is_retryable(&self, error: &HttpError) -> bool {
        match error {
            HttpError::Transport(_) => self.retry_all,
            HttpError::Status { status, .. } => {
                self.retry_all || self.retry_statuses.contains(status)
            }
            HttpError::Decode(_)
            | HttpError::RetriesExhausted { .. }
            | HttpError::InvalidHeader(_) => false,
        }
    }

    /// Whether another attempt may follow `attempts_made` failed ones.
    pub fn has_attempts_left(&self, attempts_made: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts_made < max,
            None => true,
        }
    }
}
