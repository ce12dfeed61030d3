// Activity metrics module
//
// Lightweight counters for the file-open hook and gearset reconciliation

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters shared between the hook and the login handler.
///
/// Uses atomic operations so the hook can record from any game thread
/// without locking. Logged on shutdown.
#[derive(Debug)]
pub struct SyncMetrics {
    /// Paths seen by the file-open hook
    pub paths_intercepted: AtomicU64,

    /// Paths rewritten to the main character
    pub redirects: AtomicU64,

    /// Rewrites suppressed by safe mode
    pub safe_mode_skips: AtomicU64,

    /// Failures caught inside the hook
    pub intercept_errors: AtomicU64,

    /// Completed reconciliation runs
    pub reconciliations: AtomicU64,

    /// Reconciliation runs aborted by an error
    pub reconcile_failures: AtomicU64,

    /// Gearset swaps applied to the live table
    pub gearset_swaps: AtomicU64,

    /// Total reconciliation time in microseconds
    pub total_reconcile_time_us: AtomicU64,

    start_time: Instant,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            paths_intercepted: AtomicU64::new(0),
            redirects: AtomicU64::new(0),
            safe_mode_skips: AtomicU64::new(0),
            intercept_errors: AtomicU64::new(0),
            reconciliations: AtomicU64::new(0),
            reconcile_failures: AtomicU64::new(0),
            gearset_swaps: AtomicU64::new(0),
            total_reconcile_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_path_intercepted(&self) {
        self.paths_intercepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_redirect(&self) {
        self.redirects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_safe_mode_skip(&self) {
        self.safe_mode_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_intercept_error(&self) {
        self.intercept_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished reconciliation run and the swaps it applied
    pub fn record_reconciliation(&self, swaps: usize, duration: Duration) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
        self.gearset_swaps.fetch_add(swaps as u64, Ordering::Relaxed);
        self.total_reconcile_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_reconcile_failure(&self) {
        self.reconcile_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average reconciliation time in microseconds
    pub fn avg_reconcile_time_us(&self) -> f64 {
        let total = self.total_reconcile_time_us.load(Ordering::Relaxed);
        let count = self.reconciliations.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== CharacterSync Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Files: {} intercepted, {} redirected, {} held by safe mode, {} errors",
            self.paths_intercepted.load(Ordering::Relaxed),
            self.redirects.load(Ordering::Relaxed),
            self.safe_mode_skips.load(Ordering::Relaxed),
            self.intercept_errors.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Gearsets: {} runs ({} failed), {} swaps, avg {:.0}µs",
            self.reconciliations.load(Ordering::Relaxed),
            self.reconcile_failures.load(Ordering::Relaxed),
            self.gearset_swaps.load(Ordering::Relaxed),
            self.avg_reconcile_time_us()
        );
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}
