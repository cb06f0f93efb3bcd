//! Cumulative wall-clock timers.

use std::fmt;
use std::time::{Duration, Instant};

/// A stopwatch that accumulates time over many start/stop segments.
///
/// ```
/// use strand_engine::Stopwatch;
///
/// let mut watch = Stopwatch::new();
/// let answer = watch.time(|| 6 * 7);
/// assert_eq!(answer, 42);
/// assert!(!watch.is_running());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Stopwatch {
    accumulated: Duration,
    started: Option<Instant>,
}

impl Stopwatch {
    /// A stopped watch reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a segment. Starting a running watch has no effect.
    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// End the current segment and return its length.
    ///
    /// Stopping a stopped watch returns zero.
    pub fn stop(&mut self) -> Duration {
        match self.started.take() {
            Some(start) => {
                let segment = start.elapsed();
                self.accumulated += segment;
                segment
            }
            None => Duration::ZERO,
        }
    }

    /// Total time, including the running segment if any.
    pub fn elapsed(&self) -> Duration {
        match self.started {
            Some(start) => self.accumulated + start.elapsed(),
            None => self.accumulated,
        }
    }

    /// Whether a segment is open.
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Run `f` inside one segment.
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        self.start();
        let out = f();
        self.stop();
        out
    }
}

/// The four accumulators of one run.
#[derive(Clone, Debug, Default)]
pub struct RunTimers {
    /// Kernel calls.
    pub compute: Stopwatch,
    /// Halo exchange.
    pub communication: Stopwatch,
    /// Gathers and checkpoint writes.
    pub io: Stopwatch,
    /// The whole run.
    pub total: Stopwatch,
}

impl RunTimers {
    /// All four timers stopped at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current readings.
    pub fn report(&self) -> TimerReport {
        TimerReport {
            compute: self.compute.elapsed(),
            communication: self.communication.elapsed(),
            io: self.io.elapsed(),
            total: self.total.elapsed(),
        }
    }
}

/// Readings of [`RunTimers`] at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimerReport {
    /// Time spent in the kernel.
    pub compute: Duration,
    /// Time spent exchanging halos.
    pub communication: Duration,
    /// Time spent gathering and writing checkpoints.
    pub io: Duration,
    /// Wall time of the run.
    pub total: Duration,
}

impl TimerReport {
    /// `part` as a percentage of the total; 0 when the total is zero.
    pub fn percent_of_total(&self, part: Duration) -> f64 {
        if self.total.is_zero() {
            0.0
        } else {
            part.as_secs_f64() / self.total.as_secs_f64() * 100.0
        }
    }
}

impl fmt::Display for TimerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Computation Time (%):   {:.2}",
            self.percent_of_total(self.compute)
        )?;
        writeln!(
            f,
            "Communication Time (%): {:.2}",
            self.percent_of_total(self.communication)
        )?;
        writeln!(f, "Input/Output Time (%):  {:.2}", self.percent_of_total(self.io))?;
        write!(f, "Total Time (s):         {:.3}", self.total.as_secs_f64())
    }
}
