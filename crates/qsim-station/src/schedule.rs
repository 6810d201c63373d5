//! Piecewise-constant arrival rate.

use serde::Serialize;

/// A step of the arrival rate function.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RateSegment {
    /// Time at which the segment becomes effective.
    pub start: f64,
    /// Rate (events per time unit) while the segment is effective.
    pub rate: f64,
}

impl RateSegment {
    pub fn new(start: f64, rate: f64) -> Self {
        Self { start, rate }
    }
}

/// Arrival rate as a step function of simulated time.
///
/// The effective rate at time `t` is the rate of the last segment starting at or before `t`,
/// or the base rate if no segment has started yet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PiecewiseRateSchedule {
    base_rate: f64,
    segments: Vec<RateSegment>,
}

impl PiecewiseRateSchedule {
    /// Creates a schedule; segments are sorted by start time, keeping the given order for equal starts.
    pub fn new(base_rate: f64, mut segments: Vec<RateSegment>) -> Self {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { base_rate, segments }
    }

    pub fn constant(rate: f64) -> Self {
        Self::new(rate, Vec::new())
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    pub fn segments(&self) -> &[RateSegment] {
        &self.segments
    }

    /// Returns the rate effective at time `t`.
    pub fn rate_at(&self, t: f64) -> f64 {
        let started = self.segments.partition_point(|s| s.start <= t);
        if started == 0 {
            self.base_rate
        } else {
            self.segments[started - 1].rate
        }
    }

    /// Returns the earliest segment start strictly after `t`.
    pub fn next_breakpoint(&self, t: f64) -> Option<f64> {
        let started = self.segments.partition_point(|s| s.start <= t);
        self.segments.get(started).map(|s| s.start)
    }

    /// Returns the time of the next arrival of a Poisson process with this rate function, observed from `now`.
    ///
    /// `unit_exp` must draw from the exponential distribution with rate 1. A candidate that overshoots the next
    /// breakpoint is discarded and redrawn from the breakpoint at the new rate, which is exact for
    /// piecewise-constant rates. Returns `None` if the rate is zero at the point where a draw is due:
    /// arrivals stop for good at that point, even if a later segment has a positive rate.
    pub fn next_arrival<F>(&self, now: f64, mut unit_exp: F) -> Option<f64>
    where
        F: FnMut() -> f64,
    {
        let mut t = now;
        loop {
            let rate = self.rate_at(t);
            if rate <= 0. {
                return None;
            }
            let candidate = t + unit_exp() / rate;
            match self.next_breakpoint(t) {
                Some(breakpoint) if candidate > breakpoint => t = breakpoint,
                _ => return Some(candidate),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> PiecewiseRateSchedule {
        PiecewiseRateSchedule::new(
            1.0,
            vec![RateSegment::new(60., 0.), RateSegment::new(30., 2.0), RateSegment::new(90., 4.0)],
        )
    }

    #[test]
    fn rate_is_a_step_function() {
        let s = schedule();
        assert_eq!(s.rate_at(0.), 1.0);
        assert_eq!(s.rate_at(29.999), 1.0);
        assert_eq!(s.rate_at(30.), 2.0);
        assert_eq!(s.rate_at(59.), 2.0);
        assert_eq!(s.rate_at(60.), 0.);
        assert_eq!(s.rate_at(1000.), 4.0);
        assert_eq!(s.next_breakpoint(0.), Some(30.));
        assert_eq!(s.next_breakpoint(30.), Some(60.));
        assert_eq!(s.next_breakpoint(95.), None);
    }

    #[test]
    fn constant_schedule_uses_a_single_draw() {
        let s = PiecewiseRateSchedule::constant(0.5);
        let mut draws = 0;
        let next = s.next_arrival(10., || {
            draws += 1;
            3.0
        });
        assert_eq!(next, Some(16.));
        assert_eq!(draws, 1);
    }

    #[test]
    fn overshooting_draw_is_redrawn_from_breakpoint() {
        let s = schedule();
        let mut values = vec![100.0, 1.0].into_iter();
        // 0 + 100/1 overshoots 30, so the second draw starts at 30 with rate 2
        let next = s.next_arrival(0., || values.next().unwrap());
        assert_eq!(next, Some(30.5));
    }

    #[test]
    fn zero_rate_stops_arrivals() {
        let s = schedule();
        assert_eq!(s.next_arrival(60., || 1.0), None);
        // crossing into the zero segment stops the process as well
        let mut values = vec![100.0].into_iter();
        assert_eq!(s.next_arrival(45., || values.next().unwrap()), None);
    }
}
