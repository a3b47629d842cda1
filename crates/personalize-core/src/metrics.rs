//! Global atomic counters for personalization runs.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at process exit).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    runs_completed: AtomicU64,
    classifications_degraded: AtomicU64,
    render_failures: AtomicU64,
    fallback_renders: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            runs_completed: AtomicU64::new(0),
            classifications_degraded: AtomicU64::new(0),
            render_failures: AtomicU64::new(0),
            fallback_renders: AtomicU64::new(0),
        }
    }

    pub fn inc_runs_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_completed", "counter incremented");
    }

    pub fn inc_classifications_degraded(&self) {
        self.classifications_degraded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "classifications_degraded", "counter incremented");
    }

    pub fn inc_render_failures(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "render_failures", "counter incremented");
    }

    pub fn inc_fallback_renders(&self) {
        self.fallback_renders.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "fallback_renders", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            runs_completed = self.runs_completed(),
            classifications_degraded = self.classifications_degraded(),
            render_failures = self.render_failures(),
            fallback_renders = self.fallback_renders(),
        );
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    pub fn classifications_degraded(&self) -> u64 {
        self.classifications_degraded.load(Ordering::Relaxed)
    }

    pub fn render_failures(&self) -> u64 {
        self.render_failures.load(Ordering::Relaxed)
    }

    pub fn fallback_renders(&self) -> u64 {
        self.fallback_renders.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.runs_completed.store(0, Ordering::Relaxed);
        self.classifications_degraded.store(0, Ordering::Relaxed);
        self.render_failures.store(0, Ordering::Relaxed);
        self.fallback_renders.store(0, Ordering::Relaxed);
    }
}
