//! Per-code transaction statistics.
//!
//! Each published handle keeps counts and latencies per operation code so
//! an external observability sink can poll them. Recording never fails and
//! never blocks on the sink.
//!
//! Codes the stub does not register, and any code past the first
//! [`MAX_TRACKED_CODES`] distinct ones, are folded into a single
//! [`TransactionStats::unknown`] bucket so a caller cannot grow the table.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Statistics for one operation code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStats {
    /// Requests delivered to the stub.
    pub count: u64,
    /// Requests that returned a non-OK status.
    pub failures: u64,
    /// Sum of handler latencies in microseconds.
    pub total_latency_us: u64,
    /// Largest handler latency in microseconds.
    pub max_latency_us: u64,
}

impl CodeStats {
    /// Mean handler latency in microseconds, 0 when nothing was recorded.
    #[must_use]
    pub fn mean_latency_us(&self) -> u64 {
        self.total_latency_us.checked_div(self.count).unwrap_or(0)
    }

    fn summary(&self) -> String {
        format!(
            "count={} failures={} mean_us={} max_us={}",
            self.count,
            self.failures,
            self.mean_latency_us(),
            self.max_latency_us
        )
    }

    fn record(&mut self, latency_us: u64, ok: bool) {
        self.count = self.count.saturating_add(1);
        if !ok {
            self.failures = self.failures.saturating_add(1);
        }
        self.total_latency_us = self.total_latency_us.saturating_add(latency_us);
        self.max_latency_us = self.max_latency_us.max(latency_us);
    }
}

/// Distinct codes tracked individually per handle.
pub const MAX_TRACKED_CODES: usize = 256;

/// Statistics for every code seen by one handle.
#[derive(Debug, Default)]
pub struct TransactionStats {
    per_code: Mutex<HashMap<u32, CodeStats>>,
    unknown: Mutex<CodeStats>,
    total: AtomicU64,
    failures: AtomicU64,
}

impl TransactionStats {
    /// Create empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished request.
    pub fn record(&self, code: u32, latency: Duration, ok: bool) {
        let latency_us = self.count(latency, ok);
        let mut per_code = self.per_code.lock();
        if let Some(stats) = per_code.get_mut(&code) {
            stats.record(latency_us, ok);
        } else if per_code.len() < MAX_TRACKED_CODES {
            per_code.entry(code).or_default().record(latency_us, ok);
        } else {
            drop(per_code);
            self.unknown.lock().record(latency_us, ok);
        }
    }

    /// Record a request for a code the stub does not register.
    pub fn record_unknown(&self, latency: Duration) {
        let latency_us = self.count(latency, false);
        self.unknown.lock().record(latency_us, false);
    }

    fn count(&self, latency: Duration, ok: bool) -> u64 {
        self.total.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        u64::try_from(latency.as_micros()).unwrap_or(u64::MAX)
    }

    /// Requests for unregistered codes and for codes past the tracking limit.
    #[must_use]
    pub fn unknown(&self) -> CodeStats {
        self.unknown.lock().clone()
    }

    /// Statistics for `code`, if it was ever seen.
    #[must_use]
    pub fn get(&self, code: u32) -> Option<CodeStats> {
        self.per_code.lock().get(&code).cloned()
    }

    /// Copy of all statistics ordered by code.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<u32, CodeStats> {
        self.per_code
            .lock()
            .iter()
            .map(|(code, stats)| (*code, stats.clone()))
            .collect()
    }

    /// One line per tracked code in code order, then the unknown bucket
    /// when it saw any request.
    #[must_use]
    pub fn dump_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .snapshot()
            .iter()
            .map(|(code, stats)| format!("code {code}: {}", stats.summary()))
            .collect();
        let unknown = self.unknown();
        if unknown.count > 0 {
            lines.push(format!("unknown: {}", unknown.summary()));
        }
        lines
    }

    /// Total requests recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Total failed requests recorded.
    #[must_use]
    pub fn total_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        self.per_code.lock().clear();
        *self.unknown.lock() = CodeStats::default();
        self.total.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
    }
}
