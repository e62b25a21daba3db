//! Live search statistics and the shared stop flag

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Coordinator state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    Running,
    Found,
    Exhausted,
    LimitReached,
}

impl SearchPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SearchPhase::Idle,
            1 => SearchPhase::Running,
            2 => SearchPhase::Found,
            3 => SearchPhase::Exhausted,
            _ => SearchPhase::LimitReached,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchPhase::Found | SearchPhase::Exhausted | SearchPhase::LimitReached)
    }
}

/// Thread-safe search statistics
#[derive(Debug)]
pub struct SearchStats {
    /// Candidates that passed validation and were derived
    checked: AtomicU64,
    /// Orderings pulled off a unit, valid or not
    visited: AtomicU64,
    derive_failures: AtomicU64,
    abandoned_units: AtomicU64,
    space: u128,
    start_time: Instant,
    running: AtomicBool,
    found: AtomicBool,
    limit_reached: AtomicBool,
    phase: AtomicU8,
}

impl SearchStats {
    /// Create new stats for a rank space of `space` orderings
    pub fn new(space: u128) -> Arc<Self> {
        Arc::new(Self {
            checked: AtomicU64::new(0),
            visited: AtomicU64::new(0),
            derive_failures: AtomicU64::new(0),
            abandoned_units: AtomicU64::new(0),
            space,
            start_time: Instant::now(),
            running: AtomicBool::new(true),
            found: AtomicBool::new(false),
            limit_reached: AtomicBool::new(false),
            phase: AtomicU8::new(SearchPhase::Idle as u8),
        })
    }

    /// Count one derived candidate, returning the new total
    pub fn add_checked(&self) -> u64 {
        self.checked.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn total_checked(&self) -> u64 {
        self.checked.load(Ordering::Relaxed)
    }

    pub fn add_visited(&self, count: u64) {
        self.visited.fetch_add(count, Ordering::Relaxed);
    }

    pub fn total_visited(&self) -> u64 {
        self.visited.load(Ordering::Relaxed)
    }

    pub fn record_derive_failure(&self) {
        self.derive_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn derive_failures(&self) -> u64 {
        self.derive_failures.load(Ordering::Relaxed)
    }

    pub fn record_abandoned_unit(&self) {
        self.abandoned_units.fetch_add(1, Ordering::Relaxed);
    }

    pub fn abandoned_units(&self) -> u64 {
        self.abandoned_units.load(Ordering::Relaxed)
    }

    pub fn space(&self) -> u128 {
        self.space
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Derived candidates per second
    pub fn checked_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_checked() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Fraction of the rank space visited so far
    pub fn progress(&self) -> f64 {
        if self.space == 0 {
            return 1.0;
        }
        (self.total_visited() as f64 / self.space as f64).min(1.0)
    }

    /// Every ordering in the space was visited
    pub fn is_covered(&self) -> bool {
        self.total_visited() as u128 >= self.space
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the search; workers notice between items and between pulls
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Mark as found and stop. True only for the first caller.
    pub fn mark_found(&self) -> bool {
        let first = !self.found.swap(true, Ordering::AcqRel);
        self.stop();
        first
    }

    pub fn is_found(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }

    /// A budget ran out; stop without a match
    pub fn mark_limit_reached(&self) {
        self.limit_reached.store(true, Ordering::Release);
        self.stop();
    }

    pub fn is_limit_reached(&self) -> bool {
        self.limit_reached.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> SearchPhase {
        SearchPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Idle → Running. False if the search already started.
    pub fn begin(&self) -> bool {
        self.phase
            .compare_exchange(
                SearchPhase::Idle as u8,
                SearchPhase::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Running → terminal. Succeeds at most once per search.
    pub fn finish(&self, phase: SearchPhase) -> bool {
        debug_assert!(phase.is_terminal());
        self.phase
            .compare_exchange(
                SearchPhase::Running as u8,
                phase as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Get formatted stats string
    pub fn format(&self) -> String {
        format!(
            "[{:.1} checked/s][Checked {}][Visited {} of {} ({:.4}%)][Elapsed {}]",
            self.checked_per_second(),
            format_count(self.total_checked() as u128),
            format_count(self.total_visited() as u128),
            format_count(self.space),
            self.progress() * 100.0,
            format_duration(self.elapsed().as_secs_f64()),
        )
    }
}

pub(crate) fn format_count(n: u128) -> String {
    if n >= 1_000_000_000_000 {
        format!("{:.2}T", n as f64 / 1e12)
    } else if n >= 1_000_000_000 {
        format!("{:.2}G", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1e6)
    } else if n >= 1000 {
        format!("{:.2}K", n as f64 / 1e3)
    } else {
        format!("{}", n)
    }
}

pub(crate) fn format_duration(seconds: f64) -> String {
    if seconds <= 0.0 {
        return "0s".to_string();
    }
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.0}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.0}m", seconds / 60.0)
    } else if seconds < 86400.0 {
        format!("{:.1}h", seconds / 3600.0)
    } else {
        format!("{:.1}d", seconds / 86400.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phase_reached_once() {
        let stats = SearchStats::new(6);
        assert_eq!(stats.phase(), SearchPhase::Idle);
        assert!(!stats.finish(SearchPhase::Exhausted));

        assert!(stats.begin());
        assert!(!stats.begin());
        assert_eq!(stats.phase(), SearchPhase::Running);

        assert!(stats.finish(SearchPhase::Found));
        assert!(!stats.finish(SearchPhase::Exhausted));
        assert_eq!(stats.phase(), SearchPhase::Found);
    }

    #[test]
    fn test_mark_found_first_wins() {
        let stats = SearchStats::new(6);
        assert!(stats.is_running());
        assert!(stats.mark_found());
        assert!(!stats.mark_found());
        assert!(!stats.is_running());
        assert!(stats.is_found());
    }

    #[test]
    fn test_counters() {
        let stats = SearchStats::new(200);
        assert_eq!(stats.add_checked(), 1);
        assert_eq!(stats.add_checked(), 2);
        stats.add_visited(50);
        stats.record_derive_failure();
        assert_eq!(stats.total_checked(), 2);
        assert_eq!(stats.derive_failures(), 1);
        assert!((stats.progress() - 0.25).abs() < f64::EPSILON);
        assert!(!stats.is_covered());
        stats.add_visited(150);
        assert!(stats.is_covered());
        assert!(stats.format().contains("[Checked 2]"));
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(479_001_600), "479.00M");
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(90.0), "2m");
    }
}
