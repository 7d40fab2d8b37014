//! Client statistics
//!
//! Relaxed atomic counters shared by every request a client runs. They are
//! owned by the client rather than being process-global, so independent
//! clients (and tests) never observe each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Request, attempt and retry counters for one client.
#[derive(Debug)]
pub struct ClientStats {
    /// Logical requests started
    pub requests: AtomicU64,
    /// Transport dispatches, including retries
    pub attempts: AtomicU64,
    /// Retries scheduled after a failed attempt
    pub retries: AtomicU64,
    pub successes: AtomicU64,
    /// Requests rejected for any reason other than cancellation
    pub failures: AtomicU64,
    pub cancellations: AtomicU64,
    created_at: Instant,
}

impl Default for ClientStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    #[inline]
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Time since the stats were created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Clear every counter.
    pub fn reset(&self) {
        for counter in [
            &self.requests,
            &self.attempts,
            &self.retries,
            &self.successes,
            &self.failures,
            &self.cancellations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            age: self.age(),
        }
    }
}

/// Counters read at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientStatsSnapshot {
    pub requests: u64,
    pub attempts: u64,
    pub retries: u64,
    pub successes: u64,
    pub failures: u64,
    pub cancellations: u64,
    pub age: Duration,
}

impl ClientStatsSnapshot {
    /// Fraction of requests that succeeded, `0.0` before any request.
    #[must_use]
    // Precision loss acceptable for rate statistics
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.requests > 0 {
            self.successes as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Average retries per request, `0.0` before any request.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_retries_per_request(&self) -> f64 {
        if self.requests > 0 {
            self.retries as f64 / self.requests as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_and_rates() {
        let stats = ClientStats::new();
        stats.record_request();
        stats.record_request();
        stats.record_attempt();
        stats.record_attempt();
        stats.record_attempt();
        stats.record_retry();
        stats.record_success();
        stats.record_cancellation();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 2);
        assert_eq!(snapshot.attempts, 3);
        assert_eq!(snapshot.cancellations, 1);
        assert!((snapshot.success_rate() - 0.5).abs() < f64::EPSILON);
        assert!((snapshot.avg_retries_per_request() - 0.5).abs() < f64::EPSILON);

        stats.reset();
        assert_eq!(stats.snapshot().requests, 0);
        assert!(stats.snapshot().success_rate().abs() < f64::EPSILON);
    }
}
