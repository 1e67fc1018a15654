//! Wall-clock bookkeeping for ensemble members.
//!
//! Members are long-lived OS processes, so timing is always on. The numbers
//! feed log lines and the scheduler's run statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Seconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch(Instant);

impl Stopwatch {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed_s(&self) -> f64 {
        self.0.elapsed().as_secs_f64()
    }
}

/// Totals over member runs, updated from many worker threads at once.
#[derive(Debug, Default)]
pub struct RunTimings {
    total_ms: AtomicU64,
    slowest_ms: AtomicU64,
    finished: AtomicU64,
    failed: AtomicU64,
}

impl RunTimings {
    pub const fn new() -> Self {
        Self {
            total_ms: AtomicU64::new(0),
            slowest_ms: AtomicU64::new(0),
            finished: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn record(&self, elapsed_s: f64, succeeded: bool) {
        let ms = (elapsed_s.max(0.0) * 1e3).round() as u64;
        self.total_ms.fetch_add(ms, Ordering::Relaxed);
        self.slowest_ms.fetch_max(ms, Ordering::Relaxed);
        self.finished.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn slowest_s(&self) -> f64 {
        self.slowest_ms.load(Ordering::Relaxed) as f64 / 1e3
    }

    /// Mean member wall time; zero before any member finishes.
    pub fn mean_s(&self) -> f64 {
        match self.finished() {
            0 => 0.0,
            n => self.total_ms.load(Ordering::Relaxed) as f64 / 1e3 / n as f64,
        }
    }
}
