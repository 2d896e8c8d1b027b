// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome tally for flood simulations.

use pdf_upload_gateway::models::AccessGrant;
use pdf_upload_gateway::UploadError;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Label recorded for an accepted upload.
pub const SUCCESS: &str = "success";

/// Collects outcomes while a flood runs.
#[derive(Debug, Default)]
pub struct FloodMetrics {
    start_time: Option<Instant>,
    end_time: Option<Instant>,
    /// Count of attempts by outcome label
    outcomes: HashMap<&'static str, usize>,
    /// Count of attempts by client key
    requests_per_client: HashMap<String, usize>,
    /// Latency samples (microseconds)
    latencies: Vec<u64>,
}

impl FloodMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Record the result of one gateway call.
    pub fn record(
        &mut self,
        result: &Result<AccessGrant, UploadError>,
        client: &str,
        latency: Duration,
    ) {
        let label = match result {
            Ok(_) => SUCCESS,
            Err(e) => e.outcome(),
        };
        *self.outcomes.entry(label).or_insert(0) += 1;
        *self.requests_per_client.entry(client.to_string()).or_insert(0) += 1;
        self.latencies.push(latency.as_micros() as u64);
    }

    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn count(&self, outcome: &str) -> usize {
        self.outcomes.get(outcome).copied().unwrap_or(0)
    }

    pub fn accepted(&self) -> usize {
        self.count(SUCCESS)
    }

    pub fn duration(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Ratio of rejected attempts to all attempts.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        (total - self.accepted()) as f64 / total as f64
    }

    pub fn median_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        sorted[sorted.len() / 2]
    }

    pub fn p99_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        let idx = (sorted.len() as f64 * 0.99) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn unique_clients(&self) -> usize {
        self.requests_per_client.len()
    }

    pub fn report(&self) -> FloodReport {
        FloodReport {
            total_requests: self.total_requests(),
            accepted: self.accepted(),
            rate_limited: self.count("rate_limited"),
            rejected_content: self.count("not_a_pdf") + self.count("file_too_large"),
            duration_ms: self.duration().as_millis() as u64,
            block_rate: self.block_rate(),
            median_latency_us: self.median_latency_us(),
            p99_latency_us: self.p99_latency_us(),
            unique_clients: self.unique_clients(),
        }
    }
}

/// Summary of a flood run.
#[derive(Debug, Clone)]
pub struct FloodReport {
    pub total_requests: usize,
    pub accepted: usize,
    pub rate_limited: usize,
    pub rejected_content: usize,
    pub duration_ms: u64,
    pub block_rate: f64,
    pub median_latency_us: u64,
    pub p99_latency_us: u64,
    pub unique_clients: usize,
}

impl fmt::Display for FloodReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Flood Simulation Report ===")?;
        writeln!(f, "Total requests:   {}", self.total_requests)?;
        writeln!(f, "Accepted:         {}", self.accepted)?;
        writeln!(f, "Rate limited:     {}", self.rate_limited)?;
        writeln!(f, "Content rejected: {}", self.rejected_content)?;
        writeln!(f, "Block rate:       {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "Duration:         {}ms", self.duration_ms)?;
        writeln!(f, "Median latency:   {}us", self.median_latency_us)?;
        writeln!(f, "P99 latency:      {}us", self.p99_latency_us)?;
        write!(f, "Unique clients:   {}", self.unique_clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_by_outcome() {
        let mut metrics = FloodMetrics::new();
        metrics.start();
        metrics.record(&Err(UploadError::NotAPdf), "10.0.0.1", Duration::from_micros(10));
        metrics.record(
            &Err(UploadError::RateLimited {
                retry_after: Duration::from_secs(1),
            }),
            "10.0.0.2",
            Duration::from_micros(30),
        );
        metrics.finish();

        let report = metrics.report();
        assert_eq!(report.total_requests, 2);
        assert_eq!(report.accepted, 0);
        assert_eq!(report.rate_limited, 1);
        assert_eq!(report.rejected_content, 1);
        assert_eq!(report.unique_clients, 2);
        assert!((report.block_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_tally() {
        let metrics = FloodMetrics::new();
        assert_eq!(metrics.block_rate(), 0.0);
        assert_eq!(metrics.median_latency_us(), 0);
        assert_eq!(metrics.p99_latency_us(), 0);
    }
}
