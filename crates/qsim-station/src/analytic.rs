//! Closed-form steady-state metrics of the M/M/c queue, used as a reference for simulated results.

use serde::Serialize;

use crate::config::MINUTES_PER_HOUR;

/// Steady-state M/M/c metrics. Times are in minutes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MmcMetrics {
    pub utilization_pct: f64,
    /// Mean time spent in the queue.
    pub wait_min: f64,
    /// Mean time spent in the system.
    pub total_min: f64,
    /// Mean number of customers in the queue.
    pub queue_len: f64,
}

/// Computes the M/M/c metrics for the given per-hour rates and number of servers using the Erlang C formula.
///
/// Returns `None` if the queue has no steady state (`lambda >= c * mu`) or the parameters are not positive.
pub fn mmc_metrics(lambda_per_hour: f64, mu_per_hour: f64, c: u32) -> Option<MmcMetrics> {
    if c == 0 || !(lambda_per_hour > 0.) || !(mu_per_hour > 0.) {
        return None;
    }
    let a = lambda_per_hour / mu_per_hour;
    let rho = a / c as f64;
    if rho >= 1. {
        return None;
    }

    // a^n / n! for n = 0..c, accumulated incrementally
    let mut term = 1.;
    let mut sum = 0.;
    for n in 0..c {
        sum += term;
        term *= a / (n + 1) as f64;
    }
    let tail = term / (1. - rho);
    let p0 = 1. / (sum + tail);
    let queue_len = p0 * term * rho / ((1. - rho) * (1. - rho));

    let wait_min = queue_len / lambda_per_hour * MINUTES_PER_HOUR;
    Some(MmcMetrics {
        utilization_pct: rho * 100.,
        wait_min,
        total_min: wait_min + MINUTES_PER_HOUR / mu_per_hour,
        queue_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_server_matches_mm1() {
        // M/M/1: Wq = rho / (mu - lambda)
        let m = mmc_metrics(6., 10., 1).unwrap();
        assert!((m.utilization_pct - 60.).abs() < 1e-9);
        assert!((m.wait_min - 0.6 / 4. * 60.).abs() < 1e-9);
        assert!((m.total_min - 60. / 4.).abs() < 1e-9);
        assert!((m.queue_len - 0.9).abs() < 1e-9);
    }

    #[test]
    fn two_servers() {
        // lambda = 10, mu = 12, c = 2: a = 5/6, rho = 5/12, P0 = 7/17, Lq = 125/714
        let m = mmc_metrics(10., 12., 2).unwrap();
        assert!((m.utilization_pct - 500. / 12.).abs() < 1e-9);
        assert!((m.queue_len - 125. / 714.).abs() < 1e-12);
        assert!((m.total_min - (m.wait_min + 5.)).abs() < 1e-12);
    }

    #[test]
    fn more_servers_wait_less() {
        let waits: Vec<f64> = (1..=4).map(|c| mmc_metrics(10., 12., c).unwrap().wait_min).collect();
        assert!(waits.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn unstable_queue_has_no_steady_state() {
        assert!(mmc_metrics(20., 10., 2).is_none());
        assert!(mmc_metrics(30., 10., 2).is_none());
        assert!(mmc_metrics(10., 10., 0).is_none());
        assert!(mmc_metrics(0., 10., 1).is_none());
    }
}
