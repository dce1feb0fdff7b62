use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics collector for the application.
///
/// Tracks request counts, extraction outcomes and latency.
/// Thread-safe and can be shared across the application.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    single_requests: AtomicUsize,
    batch_requests: AtomicUsize,
    extractions_succeeded: AtomicUsize,
    extractions_failed: AtomicUsize,
    extraction_latency_ms: RwLock<Vec<u64>>,
    start_time: Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub single_requests: usize,
    pub batch_requests: usize,
    pub extractions_succeeded: usize,
    pub extractions_failed: usize,
    pub average_extraction_ms: f64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                single_requests: AtomicUsize::new(0),
                batch_requests: AtomicUsize::new(0),
                extractions_succeeded: AtomicUsize::new(0),
                extractions_failed: AtomicUsize::new(0),
                extraction_latency_ms: RwLock::new(Vec::new()),
                start_time: Instant::now(),
            }),
        }
    }

    pub fn record_single_request(&self) {
        self.inner.single_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_request(&self) {
        self.inner.batch_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_extraction(&self, success: bool, duration: Duration) {
        if success {
            self.inner
                .extractions_succeeded
                .fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.extractions_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.inner
            .extraction_latency_ms
            .write()
            .push(duration.as_millis() as u64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let latencies = self.inner.extraction_latency_ms.read();
        let average_extraction_ms = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<u64>() as f64 / latencies.len() as f64
        };

        MetricsSnapshot {
            uptime_seconds: self.inner.start_time.elapsed().as_secs(),
            single_requests: self.inner.single_requests.load(Ordering::Relaxed),
            batch_requests: self.inner.batch_requests.load(Ordering::Relaxed),
            extractions_succeeded: self
                .inner
                .extractions_succeeded
                .load(Ordering::Relaxed),
            extractions_failed: self.inner.extractions_failed.load(Ordering::Relaxed),
            average_extraction_ms,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
