use pipeline::ProcessingMetadata;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    timed_out_requests: AtomicUsize,

    // Timing (in microseconds)
    total_process_time_us: AtomicU64,

    // Counts
    total_chunks_processed: AtomicUsize,
    total_model_calls: AtomicUsize,
    total_tokens_used: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            timed_out_requests: AtomicUsize::new(0),
            total_process_time_us: AtomicU64::new(0),
            total_chunks_processed: AtomicUsize::new(0),
            total_model_calls: AtomicUsize::new(0),
            total_tokens_used: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Counts as a failed request too.
    pub fn record_timeout(&self) {
        self.timed_out_requests.fetch_add(1, Ordering::Relaxed);
        self.record_request(false);
    }

    pub fn record_process(&self, duration: Duration, metadata: &ProcessingMetadata) {
        self.total_process_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_chunks_processed.fetch_add(metadata.chunks_processed, Ordering::Relaxed);
        self.total_model_calls.fetch_add(metadata.model_calls, Ordering::Relaxed);
        self.total_tokens_used.fetch_add(metadata.tokens_used, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            timed_out_requests: self.timed_out_requests.load(Ordering::Relaxed),
            avg_process_time_ms: self.avg_time_ms(&self.total_process_time_us, &self.successful_requests),
            total_chunks_processed: self.total_chunks_processed.load(Ordering::Relaxed),
            total_model_calls: self.total_model_calls.load(Ordering::Relaxed),
            total_tokens_used: self.total_tokens_used.load(Ordering::Relaxed),
        }
    }

    fn avg_time_ms(&self, total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
        let total = total_us.load(Ordering::Relaxed) as f64;
        let cnt = count.load(Ordering::Relaxed) as f64;
        if cnt > 0.0 {
            total / cnt / 1000.0 // Convert to ms
        } else {
            0.0
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub timed_out_requests: usize,
    pub avg_process_time_ms: f64,
    pub total_chunks_processed: usize,
    pub total_model_calls: usize,
    pub total_tokens_used: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
