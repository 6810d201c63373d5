//! Time-weighted performance trackers and per-customer samples.

use serde::Serialize;

/// Integrates the number of waiting customers over time.
///
/// Each update closes the interval since the previous update, assuming the queue length passed in
/// was constant over it, so callers must report the length as it was just before the current instant changes it.
#[derive(Clone, Debug, Default)]
pub struct QueueAreaTracker {
    last_update: f64,
    area: f64,
}

impl QueueAreaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, now: f64, queue_len: usize) {
        let dt = now - self.last_update;
        if dt > 0. {
            self.area += queue_len as f64 * dt;
            self.last_update = now;
        }
    }

    /// Integral of the queue length up to the last update.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Time-average queue length over `[0, horizon]`.
    pub fn average(&self, horizon: f64) -> f64 {
        if horizon <= 0. {
            return 0.;
        }
        self.area / horizon
    }
}

/// Integrates the number of busy servers over time.
///
/// [`finalize`](Self::finalize) must be called at the end of the run, otherwise the interval
/// after the last service start or end is lost.
#[derive(Clone, Debug)]
pub struct UtilizationTracker {
    capacity: usize,
    busy_servers: usize,
    busy_area: f64,
    last_update: f64,
}

impl UtilizationTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            busy_servers: 0,
            busy_area: 0.,
            last_update: 0.,
        }
    }

    fn accumulate(&mut self, now: f64) {
        let dt = now - self.last_update;
        if dt > 0. {
            self.busy_area += self.busy_servers as f64 * dt;
            self.last_update = now;
        }
    }

    pub fn start_service(&mut self, now: f64) {
        self.accumulate(now);
        self.busy_servers = (self.busy_servers + 1).min(self.capacity);
    }

    pub fn end_service(&mut self, now: f64) {
        self.accumulate(now);
        self.busy_servers = self.busy_servers.saturating_sub(1);
    }

    pub fn finalize(&mut self, now: f64) {
        self.accumulate(now);
    }

    pub fn busy_servers(&self) -> usize {
        self.busy_servers
    }

    /// Integral of the number of busy servers up to the last update.
    pub fn busy_area(&self) -> f64 {
        self.busy_area
    }

    /// Fraction of the available server time `capacity * horizon` that servers were busy.
    pub fn utilization(&self, horizon: f64) -> f64 {
        if horizon <= 0. || self.capacity == 0 {
            return 0.;
        }
        self.busy_area / (self.capacity as f64 * horizon)
    }
}

/// A collection of observed values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SampleMetric {
    data: Vec<f64>,
}

impl SampleMetric {
    pub fn add(&mut self, x: f64) {
        self.data.push(x);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Arithmetic mean, zero for an empty sample.
    pub fn mean(&self) -> f64 {
        mean(&self.data)
    }

    /// The 95th percentile, available only with at least 20 observations.
    pub fn p95(&self) -> Option<f64> {
        if self.data.len() < 20 {
            return None;
        }
        Some(exclusive_quantile(&self.data, 19, 20))
    }
}

impl From<Vec<f64>> for SampleMetric {
    fn from(data: Vec<f64>) -> Self {
        Self { data }
    }
}

/// Arithmetic mean, zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// The `i`-th of the `n - 1` cut points dividing the data into `n` equal-probability groups.
///
/// Uses the exclusive method: the data is treated as a sample of a population that may contain values
/// more extreme than the observed ones, with position `i * (len + 1) / n` in the sorted data
/// linearly interpolated between neighbours. Requires at least two values and `0 < i < n`.
pub fn exclusive_quantile(values: &[f64], i: usize, n: usize) -> f64 {
    assert!(values.len() >= 2, "at least two values are required for quantiles");
    assert!(i > 0 && i < n, "cut point {} is out of range for {} groups", i, n);
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let len = sorted.len();
    let m = len + 1;
    let j = (i * m / n).clamp(1, len - 1);
    let delta = (i * m) as f64 - (j * n) as f64;
    (sorted[j - 1] * (n as f64 - delta) + sorted[j] * delta) / n as f64
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn queue_area_is_time_weighted() {
        let mut q = QueueAreaTracker::new();
        q.update(2., 0);
        q.update(5., 2);
        q.update(5., 7); // zero-length interval is ignored
        q.update(6., 1);
        assert_eq!(q.area(), 7.);
        assert_eq!(q.average(10.), 0.7);
        assert_eq!(q.average(0.), 0.);
    }

    #[test]
    fn last_interval_needs_finalize() {
        let mut u = UtilizationTracker::new(2);
        u.start_service(1.);
        u.start_service(2.);
        u.end_service(4.);
        assert_eq!(u.busy_area(), 1. + 2. * 2.);
        u.finalize(10.);
        assert_eq!(u.busy_area(), 5. + 6.);
        assert_eq!(u.utilization(10.), 11. / 20.);
    }

    #[test]
    fn busy_servers_are_clamped() {
        let mut u = UtilizationTracker::new(1);
        u.end_service(1.);
        assert_eq!(u.busy_servers(), 0);
        u.start_service(1.);
        u.start_service(1.);
        assert_eq!(u.busy_servers(), 1);
        u.finalize(3.);
        assert_eq!(u.utilization(3.), 2. / 3.);
    }

    #[test]
    fn p95_matches_exclusive_quantile() {
        let sample: SampleMetric = (1..=20).map(|x| x as f64).collect::<Vec<_>>().into();
        // position 19 * 21 / 20 = 19.95
        assert!((sample.p95().unwrap() - 19.95).abs() < 1e-12);

        let short: SampleMetric = vec![1.; 19].into();
        assert_eq!(short.p95(), None);

        let unsorted: Vec<f64> = (0..100).rev().map(|x| x as f64).collect();
        // position 19 * 101 / 20 = 95.95, between 95 and 96 (1-based), i.e. values 94 and 95
        assert!((exclusive_quantile(&unsorted, 19, 20) - 94.95).abs() < 1e-12);
        // quartiles of 1..=8 are 2.25, 4.5 and 6.75 with the exclusive method
        let eight: Vec<f64> = (1..=8).map(|x| x as f64).collect();
        assert!((exclusive_quantile(&eight, 1, 4) - 2.25).abs() < 1e-12);
        assert!((exclusive_quantile(&eight, 2, 4) - 4.5).abs() < 1e-12);
        assert!((exclusive_quantile(&eight, 3, 4) - 6.75).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn utilization_is_a_fraction(
            capacity in 1usize..6,
            steps in prop::collection::vec((0.0f64..5.0, any::<bool>()), 0..100),
            tail in 0.0f64..10.0,
        ) {
            let mut u = UtilizationTracker::new(capacity);
            let mut now = 0.;
            for (dt, start) in steps {
                now += dt;
                if start {
                    u.start_service(now);
                } else {
                    u.end_service(now);
                }
                prop_assert!(u.busy_servers() <= capacity);
            }
            let horizon = now + tail;
            u.finalize(horizon);
            if horizon > 0. {
                let value = u.utilization(horizon);
                prop_assert!((0.0..=1.0 + 1e-12).contains(&value));
            }
        }
    }
}
