//! # Retry Advice
//!
//! The orchestrator never retries a pair itself; the next scheduled
//! invocation is the retry. This module tells the scheduler how to schedule
//! it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Summary                         Advice              Backoff           │
//! │  ───────────────────────────     ────────────────    ───────────────   │
//! │  auth failures                   Reauthenticate      reset             │
//! │  other hard failures             RetryNextCycle      reset             │
//! │  transport failures only         BackOff(delay)      advance (x2)      │
//! │  clean                           None                reset             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tandem_core::ResultSummary;

use crate::config::SyncSettings;

/// What the scheduler should do after an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAdvice {
    /// Nothing failed.
    None,
    /// Credentials were rejected; prompt the user before retrying.
    Reauthenticate,
    /// Hard failures that waiting will not fix; retry on the normal schedule.
    RetryNextCycle,
    /// Only soft failures; retry after the given delay.
    BackOff(Duration),
}

impl RetryAdvice {
    /// Returns the suggested delay, if any.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            RetryAdvice::BackOff(delay) => Some(*delay),
            _ => None,
        }
    }
}

/// Tracks consecutive soft-failed invocations and grows the suggested delay.
#[derive(Debug)]
pub struct RetryAdvisor {
    backoff: ExponentialBackoff,
}

impl RetryAdvisor {
    pub fn new(settings: &SyncSettings) -> Self {
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(settings.initial_backoff_ms),
            max_interval: Duration::from_secs(settings.max_backoff_secs),
            multiplier: 2.0,
            max_elapsed_time: None, // No limit on total time
            ..Default::default()
        };
        backoff.reset();

        RetryAdvisor { backoff }
    }

    /// Derives advice from a finished invocation's summary.
    pub fn advise(&mut self, summary: &ResultSummary) -> RetryAdvice {
        if summary.needs_reauthentication() {
            self.backoff.reset();
            return RetryAdvice::Reauthenticate;
        }

        if summary.has_hard_error() {
            self.backoff.reset();
            return RetryAdvice::RetryNextCycle;
        }

        if summary.has_soft_error() {
            let delay = self
                .backoff
                .next_backoff()
                .unwrap_or(self.backoff.max_interval);
            return RetryAdvice::BackOff(delay);
        }

        self.backoff.reset();
        RetryAdvice::None
    }
}
