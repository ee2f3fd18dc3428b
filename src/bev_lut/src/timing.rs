//! Build timing instrumentation.
//!
//! Timings are collected when the `profiling` feature is enabled. Without the
//! feature, the timer and collector compile to no-ops.

use serde::{Deserialize, Serialize};
#[cfg(feature = "profiling")]
use std::time::Instant;

/// Timing breakdown for a single lookup table build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildTiming {
    /// Total build time
    pub total_ms: f64,
    /// Input and buffer validation
    pub validate_ms: f64,
    /// Projection kernel
    pub kernel_ms: f64,
    /// Statistics pass over the finished table
    pub stats_ms: f64,
}

/// Timer that can be enabled/disabled at compile time.
#[cfg(feature = "profiling")]
pub struct Timer {
    start: Instant,
}

#[cfg(feature = "profiling")]
#[allow(clippy::new_without_default)]
impl Timer {
    #[inline]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// No-op timer when profiling is disabled.
#[cfg(not(feature = "profiling"))]
pub struct Timer;

#[cfg(not(feature = "profiling"))]
#[allow(clippy::new_without_default)]
impl Timer {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }

    #[inline(always)]
    pub fn elapsed_ms(&self) -> f64 {
        0.0
    }
}

/// Collector for phase timings during one build.
#[derive(Debug, Default)]
pub struct TimingCollector {
    #[cfg(feature = "profiling")]
    start: Option<Instant>,
    timing: BuildTiming,
}

impl TimingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn start(&mut self) {
        #[cfg(feature = "profiling")]
        {
            self.start = Some(Instant::now());
        }
        self.timing = BuildTiming::default();
    }

    #[inline]
    pub fn record_phase(&mut self, phase: &str, duration_ms: f64) {
        match phase {
            "validate" => self.timing.validate_ms += duration_ms,
            "kernel" => self.timing.kernel_ms += duration_ms,
            "stats" => self.timing.stats_ms += duration_ms,
            _ => {}
        }
    }

    pub fn finish(&mut self) -> BuildTiming {
        #[cfg(feature = "profiling")]
        {
            self.timing.total_ms = self
                .start
                .map(|s| s.elapsed().as_secs_f64() * 1000.0)
                .unwrap_or(0.0);
        }
        std::mem::take(&mut self.timing)
    }
}

/// Time a block of code and record it under `phase`.
///
/// Usage:
/// ```ignore
/// let result = time_phase!(collector, "kernel", {
///     run_kernel()
/// });
/// ```
#[macro_export]
macro_rules! time_phase {
    ($collector:expr, $phase:expr, $block:expr) => {{
        let _timer = $crate::timing::Timer::new();

        let result = $block;

        $collector.record_phase($phase, _timer.elapsed_ms());

        result
    }};
}
