//! Progress reporting and remaining-time estimates.

use std::fmt;
use std::time::Duration;

/// Steps between progress reports: a tenth of the run.
///
/// `None` when the run is shorter than ten steps, in which case no
/// progress is reported.
pub fn progress_interval(nsteps: u64) -> Option<u64> {
    let interval = nsteps / 10;
    (interval > 0).then_some(interval)
}

/// Linear extrapolation of the time left.
///
/// `remaining = (1 / fraction - 1) * elapsed`. Returns `None` when
/// `fraction` is not in `(0, 1]`, since nothing can be extrapolated
/// before any work is done.
///
/// ```
/// use std::time::Duration;
/// use strand_engine::progress::estimate_remaining;
///
/// let left = estimate_remaining(0.5, Duration::from_secs(100));
/// assert_eq!(left, Some(Duration::from_secs(100)));
/// assert_eq!(estimate_remaining(0.0, Duration::from_secs(100)), None);
/// ```
pub fn estimate_remaining(fraction: f64, elapsed: Duration) -> Option<Duration> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return None;
    }
    Duration::try_from_secs_f64((1.0 / fraction - 1.0) * elapsed.as_secs_f64()).ok()
}

/// A duration split into whole days, hours, minutes, and seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElapsedBreakdown {
    /// Whole days.
    pub days: u64,
    /// Hours past the last whole day.
    pub hours: u64,
    /// Minutes past the last whole hour.
    pub minutes: u64,
    /// Seconds past the last whole minute.
    pub seconds: u64,
}

impl From<Duration> for ElapsedBreakdown {
    fn from(d: Duration) -> Self {
        let total = d.as_secs();
        Self {
            days: total / 86_400,
            hours: total % 86_400 / 3_600,
            minutes: total % 3_600 / 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for ElapsedBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} days, {} hours, {} minutes, {} seconds",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_runs_skip_progress() {
        assert_eq!(progress_interval(0), None);
        assert_eq!(progress_interval(9), None);
        assert_eq!(progress_interval(10), Some(1));
        assert_eq!(progress_interval(1000), Some(100));
        assert_eq!(progress_interval(1009), Some(100));
    }

    #[test]
    fn remaining_shrinks_to_zero() {
        let elapsed = Duration::from_secs(100);
        assert_eq!(estimate_remaining(1.0, elapsed), Some(Duration::ZERO));
        let near_end = estimate_remaining(0.999, elapsed).unwrap();
        assert!(near_end < Duration::from_millis(101), "{near_end:?}");
        let quarter = estimate_remaining(0.25, elapsed).unwrap();
        assert_eq!(quarter, Duration::from_secs(300));
    }

    #[test]
    fn out_of_range_fractions_are_rejected() {
        let elapsed = Duration::from_secs(1);
        for f in [0.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            assert_eq!(estimate_remaining(f, elapsed), None, "{f}");
        }
    }

    #[test]
    fn breakdown_splits_units() {
        let d = Duration::from_secs(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5) + Duration::from_millis(900);
        let b = ElapsedBreakdown::from(d);
        assert_eq!(
            b,
            ElapsedBreakdown {
                days: 2,
                hours: 3,
                minutes: 4,
                seconds: 5
            }
        );
        assert_eq!(b.to_string(), "2 days, 3 hours, 4 minutes, 5 seconds");
    }
}
