//! Application state management
//!
//! Author: hephaex@gmail.com

use entilens_core::{AppConfig, Result};
use entilens_extractor::ExtractionPipeline;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;

use crate::sessions::SessionStore;

/// Request latency histogram buckets
#[derive(Debug, Clone, Default)]
pub struct LatencyBuckets {
    pub under_10ms: u64,
    pub ms_10_50: u64,
    pub ms_50_100: u64,
    pub ms_100_500: u64,
    pub ms_500_1000: u64,
    pub over_1s: u64,
}

impl LatencyBuckets {
    /// Upper bounds in seconds of the finite buckets
    pub const BOUNDS: [&'static str; 5] = ["0.01", "0.05", "0.1", "0.5", "1.0"];

    pub fn record(&mut self, latency_us: u64) {
        match latency_us {
            0..=9_999 => self.under_10ms += 1,
            10_000..=49_999 => self.ms_10_50 += 1,
            50_000..=99_999 => self.ms_50_100 += 1,
            100_000..=499_999 => self.ms_100_500 += 1,
            500_000..=999_999 => self.ms_500_1000 += 1,
            _ => self.over_1s += 1,
        }
    }

    /// Counts of the finite buckets in `BOUNDS` order
    pub fn finite(&self) -> [u64; 5] {
        [
            self.under_10ms,
            self.ms_10_50,
            self.ms_50_100,
            self.ms_100_500,
            self.ms_500_1000,
        ]
    }
}

/// Per-endpoint request metrics
#[derive(Debug, Clone, Default)]
pub struct EndpointMetrics {
    /// Responses by status code
    pub status_counts: BTreeMap<u16, u64>,
    pub latency_buckets: LatencyBuckets,
    pub total_latency_us: u64,
    pub latency_count: u64,
    pub min_latency_us: u64,
    pub max_latency_us: u64,
}

impl EndpointMetrics {
    fn record(&mut self, status: u16, latency_us: u64) {
        *self.status_counts.entry(status).or_insert(0) += 1;
        self.latency_buckets.record(latency_us);
        self.min_latency_us = if self.latency_count == 0 {
            latency_us
        } else {
            self.min_latency_us.min(latency_us)
        };
        self.max_latency_us = self.max_latency_us.max(latency_us);
        self.total_latency_us += latency_us;
        self.latency_count += 1;
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Document and recognition pipeline
    pub pipeline: ExtractionPipeline,
    /// Saved extractions
    pub sessions: SessionStore,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Completed extractions
    pub extraction_count: AtomicU64,
    /// Entities returned across all extractions
    pub entity_count: AtomicU64,
    /// Per-endpoint metrics keyed by normalized path
    pub metrics: RwLock<HashMap<String, EndpointMetrics>>,
}

impl AppState {
    /// Create new application state with config
    pub fn new(config: AppConfig) -> Result<Self> {
        let pipeline = ExtractionPipeline::from_config(&config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create state around an existing pipeline
    pub fn with_pipeline(config: AppConfig, pipeline: ExtractionPipeline) -> Self {
        let sessions = SessionStore::new(config.sessions.max_sessions);
        Self {
            config,
            pipeline,
            sessions,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            extraction_count: AtomicU64::new(0),
            entity_count: AtomicU64::new(0),
            metrics: RwLock::new(HashMap::new()),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Count a completed extraction
    pub fn record_extraction(&self, entities: usize) {
        self.extraction_count.fetch_add(1, Ordering::SeqCst);
        self.entity_count.fetch_add(entities as u64, Ordering::SeqCst);
    }

    pub fn get_extraction_count(&self) -> u64 {
        self.extraction_count.load(Ordering::SeqCst)
    }

    pub fn get_entity_count(&self) -> u64 {
        self.entity_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Record one finished request
    pub async fn record_request(&self, endpoint: String, status: u16, latency_us: u64) {
        self.increment_requests();
        self.metrics
            .write()
            .await
            .entry(endpoint)
            .or_default()
            .record(status, latency_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entilens_extractor::RecognizerRegistry;

    fn state() -> AppState {
        AppState::with_pipeline(
            AppConfig::default(),
            ExtractionPipeline::new(RecognizerRegistry::new()),
        )
    }

    #[test]
    fn test_latency_buckets() {
        let mut buckets = LatencyBuckets::default();
        for us in [500, 20_000, 75_000, 250_000, 750_000, 2_000_000, 9_999] {
            buckets.record(us);
        }
        assert_eq!(buckets.finite(), [2, 1, 1, 1, 1]);
        assert_eq!(buckets.over_1s, 1);
    }

    #[tokio::test]
    async fn test_record_request() {
        let state = state();
        state.record_request("/health".into(), 200, 1_000).await;
        state.record_request("/health".into(), 200, 3_000).await;
        state.record_request("/health".into(), 503, 2_000).await;

        let metrics = state.metrics.read().await;
        let health = &metrics["/health"];
        assert_eq!(health.status_counts[&200], 2);
        assert_eq!(health.status_counts[&503], 1);
        assert_eq!(health.min_latency_us, 1_000);
        assert_eq!(health.max_latency_us, 3_000);
        assert_eq!(health.latency_count, 3);
        assert_eq!(state.get_request_count(), 3);
    }

    #[test]
    fn test_extraction_counters() {
        let state = state();
        state.record_extraction(4);
        state.record_extraction(0);
        assert_eq!(state.get_extraction_count(), 2);
        assert_eq!(state.get_entity_count(), 4);
    }
}
