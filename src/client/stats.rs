//! Client Statistics Module
//!
//! Hit/miss counters, latency samples and the performance report built from them.

use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheStats;

// == Latency Totals ==
/// Running sum and count of latency samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyTotals {
    pub count: u64,
    pub total: Duration,
}

impl LatencyTotals {
    pub fn record(&mut self, latency: Duration) {
        self.count += 1;
        self.total = self.total.saturating_add(latency);
    }

    /// Mean sample in microseconds, None without samples.
    pub fn average_micros(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.total.as_secs_f64() * 1_000_000.0 / self.count as f64)
    }
}

// == Client Stats ==
/// Request-path counters owned by a client.
///
/// Every `reset` starts a new epoch. A remote sample tagged with an older
/// epoch belongs to a miss counted before the reset and is dropped.
#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    /// Requests served from the local store
    pub hits: u64,
    /// Requests that went to a backend
    pub misses: u64,
    /// Local lookup latency of hits
    pub local: LatencyTotals,
    /// Remote round trip of completed misses
    pub remote: LatencyTotals,
    epoch: u64,
}

impl ClientStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a hit together with its lookup latency.
    pub fn record_hit(&mut self, latency: Duration) {
        self.hits += 1;
        self.local.record(latency);
    }

    /// Counts a miss and returns the epoch it was counted in.
    pub fn record_miss(&mut self) -> u64 {
        self.misses += 1;
        self.epoch
    }

    /// Records the round trip of a miss counted in `epoch`.
    ///
    /// Returns false if the counters were reset since.
    pub fn record_remote_latency(&mut self, epoch: u64, latency: Duration) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.remote.record(latency);
        true
    }

    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn reset(&mut self) {
        *self = Self {
            epoch: self.epoch + 1,
            ..Self::default()
        };
    }

    // == Report ==
    /// Builds a report; `NoData` when nothing has been requested yet.
    pub fn report(&self, store: CacheStats) -> PerformanceReport {
        let total_requests = self.total_requests();
        if total_requests == 0 {
            return PerformanceReport::NoData;
        }

        let hit_rate = self.hits as f64 / total_requests as f64 * 100.0;
        PerformanceReport::Summary(PerformanceSummary {
            total_requests,
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            miss_rate: 100.0 - hit_rate,
            avg_local_latency_us: self.local.average_micros(),
            avg_remote_latency_us: self.remote.average_micros(),
            fill_ratio: store.fill_ratio(),
            store,
        })
    }
}

// == Performance Report ==
/// Result of evaluating a client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PerformanceReport {
    /// No request has been made since the last reset
    NoData,
    Summary(PerformanceSummary),
}

impl PerformanceReport {
    pub fn summary(&self) -> Option<&PerformanceSummary> {
        match self {
            PerformanceReport::NoData => None,
            PerformanceReport::Summary(summary) => Some(summary),
        }
    }
}

/// Aggregates for a client with at least one request.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    /// Percentage, 0-100
    pub hit_rate: f64,
    /// Percentage, 0-100
    pub miss_rate: f64,
    /// Mean local lookup latency in microseconds, None without hits
    pub avg_local_latency_us: Option<f64>,
    /// Mean remote round trip in microseconds, None without completed misses
    pub avg_remote_latency_us: Option<f64>,
    /// Share of the store capacity in use, 0-1
    pub fill_ratio: f64,
    /// Store bookkeeping at report time
    pub store: CacheStats,
}
