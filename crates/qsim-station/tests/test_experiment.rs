mod common;
use common::assert_float_eq;

use qsim_station::analytic::mmc_metrics;
use qsim_station::customer::CustomerRecord;
use qsim_station::{
    run_experiment, run_experiment_n_workers, run_one, run_sweep, ConfigError, ExperimentConfig, ExperimentSummary,
    ReplicationSummary, SimulationError, StationConfig,
};

fn summary(avg_wait_min: f64, p95_wait_min: Option<f64>, completions: u64) -> ReplicationSummary {
    ReplicationSummary {
        avg_wait_min,
        p95_wait_min,
        avg_service_min: 6.,
        avg_total_min: avg_wait_min + 6.,
        avg_queue_len: avg_wait_min / 10.,
        utilization_pct: 50.,
        throughput_per_hour: completions as f64,
        arrivals: completions + 1,
        completions,
    }
}

#[test]
fn aggregate_averages_every_field() {
    let agg = ExperimentSummary::aggregate(&[summary(1., None, 10), summary(3., Some(8.), 20), summary(5., Some(12.), 30)]);
    assert_eq!(agg.replications, 3);
    assert_float_eq(agg.avg_wait_min, 3., 1e-12);
    assert_float_eq(agg.avg_total_min, 9., 1e-12);
    assert_float_eq(agg.avg_queue_len, 0.3, 1e-12);
    assert_float_eq(agg.utilization_pct, 50., 1e-12);
    assert_float_eq(agg.throughput_per_hour, 20., 1e-12);
    assert_float_eq(agg.completions, 20., 1e-12);
    assert_float_eq(agg.arrivals, 21., 1e-12);
    // replications without a percentile are left out
    assert_eq!(agg.p95_wait_min, Some(10.));
    assert_eq!(agg.wall_clock, None);
}

#[test]
fn aggregate_without_percentiles() {
    let agg = ExperimentSummary::aggregate(&[summary(1., None, 1), summary(2., None, 2)]);
    assert_eq!(agg.p95_wait_min, None);
}

#[test]
fn replications_use_consecutive_seeds() {
    let config = StationConfig::new(20., 12., 2, 4.);
    let experiment = run_experiment_n_workers(&config, 4, 1000, 3).unwrap();
    assert_eq!(experiment.results.len(), 4);
    for (i, result) in experiment.results.iter().enumerate() {
        assert_eq!(result.seed, 1000 + i as u64);
        let single = run_one(&config.clone().with_seed(1000 + i as u64)).unwrap();
        assert_eq!(result.summary, single.summary);
    }
    assert_eq!(experiment.summary.replications, 4);
    assert!(experiment.summary.wall_clock.is_some());
}

#[test]
fn experiment_config_seeds_from_seed_base() {
    let config: ExperimentConfig = serde_json::from_str(
        r#"{"experiment_name": "baseline", "tellers": 2, "arrival_rate_per_hour": 20,
            "service_rate_per_hour": 12, "hours": 2, "seed_base": 77, "replications": 3}"#,
    )
    .unwrap();
    let experiment = run_experiment(&config.base_station(), config.replications).unwrap();
    let seeds: Vec<u64> = experiment.results.iter().map(|r| r.seed).collect();
    assert_eq!(seeds, vec![77, 78, 79]);
}

#[test]
fn worker_count_does_not_change_results() {
    let config = StationConfig::new(20., 10., 2, 4.).with_seed(500);
    let serial = run_experiment_n_workers(&config, 5, 500, 1).unwrap();
    let parallel = run_experiment_n_workers(&config, 5, 500, 5).unwrap();
    let strip = |s: &ExperimentSummary| ExperimentSummary { wall_clock: None, ..s.clone() };
    assert_eq!(strip(&serial.summary), strip(&parallel.summary));
    assert_eq!(serial.results, parallel.results);
}

#[test]
fn zero_replications_are_refused() {
    let config = StationConfig::new(20., 10., 2, 4.);
    assert!(matches!(
        run_experiment(&config, 0),
        Err(SimulationError::Config(ConfigError::NoReplications))
    ));
}

#[test]
fn invalid_config_is_refused_before_running() {
    let config = StationConfig::new(20., 10., 0, 4.);
    assert!(matches!(
        run_experiment(&config, 3),
        Err(SimulationError::Config(ConfigError::NonPositiveCapacity))
    ));
}

#[test]
fn critically_loaded_station_saturates() {
    let heavy = run_experiment(&StationConfig::new(20., 10., 2, 8.).with_seed(100), 10).unwrap();
    let light = run_experiment(&StationConfig::new(10., 10., 2, 8.).with_seed(100), 10).unwrap();
    assert!(heavy.summary.utilization_pct > 75.);
    assert!(heavy.summary.utilization_pct <= 100.);
    assert!(heavy.summary.avg_queue_len > 2. * light.summary.avg_queue_len);
    assert!(heavy.summary.avg_wait_min > light.summary.avg_wait_min);
    // the backlog left at the horizon shows the queue has not stabilized
    assert!(heavy.summary.arrivals > heavy.summary.completions);
}

fn waiting_at(customers: &[CustomerRecord], time: f64) -> usize {
    customers
        .iter()
        .filter(|c| c.arrival_time <= time && c.service_start_time.map_or(true, |start| start > time))
        .count()
}

#[test]
fn critically_loaded_queue_keeps_growing() {
    let experiment = run_experiment(&StationConfig::new(20., 10., 2, 8.).with_seed(500), 30).unwrap();
    let mean_waiting = |time: f64| {
        let total: usize = experiment.results.iter().map(|r| waiting_at(&r.customers, time)).sum();
        total as f64 / experiment.results.len() as f64
    };
    let early = mean_waiting(120.);
    let late = mean_waiting(480.);
    assert!(early > 0.);
    assert!(late > early, "backlog {} at 480 min is not above {} at 120 min", late, early);
}

#[test]
fn seeds_near_the_top_of_the_range_wrap_around() {
    let config = StationConfig::new(10., 12., 2, 1.).with_seed(u64::MAX - 1);
    let experiment = run_experiment(&config, 3).unwrap();
    let seeds: Vec<u64> = experiment.results.iter().map(|r| r.seed).collect();
    assert_eq!(seeds, vec![u64::MAX - 1, u64::MAX, 0]);
    assert_eq!(experiment.summary.replications, 3);
}

#[test]
fn long_run_agrees_with_erlang_c() {
    let config = StationConfig::new(10., 12., 2, 200.).with_seed(1);
    let experiment = run_experiment(&config, 4).unwrap();
    let expected = mmc_metrics(10., 12., 2).unwrap();
    assert_float_eq(experiment.summary.utilization_pct, expected.utilization_pct, 4.);
    assert_float_eq(experiment.summary.avg_queue_len, expected.queue_len, 0.08);
    assert_float_eq(experiment.summary.avg_service_min, 5., 0.5);
    assert!(experiment.summary.p95_wait_min.is_some());
}

#[test]
fn sweep_runs_one_experiment_per_server_count() {
    let config = StationConfig::new(10., 12., 1, 8.).with_seed(10);
    let sweep = run_sweep(&config, &[1, 2, 3], 3).unwrap();
    let servers: Vec<u32> = sweep.iter().map(|(c, _)| *c).collect();
    assert_eq!(servers, vec![1, 2, 3]);
    let waits: Vec<f64> = sweep.iter().map(|(_, e)| e.summary.avg_wait_min).collect();
    assert!(waits[0] > waits[2]);
    for (_, experiment) in &sweep {
        assert_eq!(experiment.results[0].seed, 10);
        assert_eq!(experiment.summary.replications, 3);
        assert!(experiment.results.iter().all(|r| r.summary.utilization_pct <= 100.));
    }
}
