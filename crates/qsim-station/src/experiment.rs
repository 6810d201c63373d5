//! Independent replications of a station and their aggregation.

use std::sync::mpsc::channel;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use threadpool::ThreadPool;

use crate::config::StationConfig;
use crate::error::{ConfigError, SimulationError};
use crate::metrics::mean;
use crate::replication::{run_replication, ReplicationResult, ReplicationSummary};

/// Cross-replication averages of [`ReplicationSummary`] fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExperimentSummary {
    pub replications: usize,
    pub avg_wait_min: f64,
    /// Mean of the per-replication 95th percentiles over the replications that have one.
    pub p95_wait_min: Option<f64>,
    pub avg_service_min: f64,
    pub avg_total_min: f64,
    pub avg_queue_len: f64,
    pub utilization_pct: f64,
    pub throughput_per_hour: f64,
    pub arrivals: f64,
    pub completions: f64,
    /// Time spent running the replications, set by [`run_experiment`].
    #[serde(skip)]
    pub wall_clock: Option<Duration>,
}

impl ExperimentSummary {
    /// Averages the replication summaries field by field. Zero replications yield all-zero averages.
    pub fn aggregate(summaries: &[ReplicationSummary]) -> Self {
        let avg = |f: &dyn Fn(&ReplicationSummary) -> f64| mean(&summaries.iter().map(f).collect::<Vec<_>>());
        let p95s: Vec<f64> = summaries.iter().filter_map(|s| s.p95_wait_min).collect();
        Self {
            replications: summaries.len(),
            avg_wait_min: avg(&|s| s.avg_wait_min),
            p95_wait_min: if p95s.is_empty() { None } else { Some(mean(&p95s)) },
            avg_service_min: avg(&|s| s.avg_service_min),
            avg_total_min: avg(&|s| s.avg_total_min),
            avg_queue_len: avg(&|s| s.avg_queue_len),
            utilization_pct: avg(&|s| s.utilization_pct),
            throughput_per_hour: avg(&|s| s.throughput_per_hour),
            arrivals: avg(&|s| s.arrivals as f64),
            completions: avg(&|s| s.completions as f64),
            wall_clock: None,
        }
    }

    pub fn wall_clock_seconds(&self) -> Option<f64> {
        self.wall_clock.map(|d| d.as_secs_f64())
    }
}

/// Results of all replications, ordered by replication index, and their aggregate.
#[derive(Clone, Debug)]
pub struct Experiment {
    pub results: Vec<ReplicationResult>,
    pub summary: ExperimentSummary,
}

/// Runs `replications` replications of `config` with seeds `config.seed + i` using a worker per available CPU.
pub fn run_experiment(config: &StationConfig, replications: usize) -> Result<Experiment, SimulationError> {
    let n_workers = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    run_experiment_n_workers(config, replications, config.seed, n_workers)
}

/// Runs `replications` replications with seeds `seed_base + i` (wrapping at `u64::MAX`) in a thread pool with `n_workers` worker threads.
///
/// Replications share nothing but the configuration; results are reported in replication order
/// regardless of the order in which workers finish.
pub fn run_experiment_n_workers(
    config: &StationConfig,
    replications: usize,
    seed_base: u64,
    n_workers: usize,
) -> Result<Experiment, SimulationError> {
    config.validate()?;
    if replications == 0 {
        return Err(ConfigError::NoReplications.into());
    }

    let start = Instant::now();
    let pool = ThreadPool::new(n_workers.clamp(1, replications));
    let (tx, rx) = channel();
    for index in 0..replications {
        let tx = tx.clone();
        let config = config.clone();
        pool.execute(move || {
            let seed = seed_base.wrapping_add(index as u64);
            let result = run_replication(&config, seed);
            if let Ok(result) = &result {
                log::info!(
                    "replication {}/{} (seed {}) finished: avg wait {:.4} min, utilization {:.2}%",
                    index + 1,
                    replications,
                    seed,
                    result.summary.avg_wait_min,
                    result.summary.utilization_pct
                );
            }
            // the receiver outlives the pool, so sending can only fail after a panic elsewhere
            let _ = tx.send((index, result));
        });
    }
    drop(tx);

    let mut collected: Vec<_> = rx.iter().take(replications).collect();
    if collected.len() < replications {
        return Err(SimulationError::Incomplete {
            expected: replications,
            received: collected.len(),
        });
    }
    collected.sort_by_key(|x| x.0);
    let results = collected
        .into_iter()
        .map(|x| x.1)
        .collect::<Result<Vec<_>, _>>()?;

    let summaries: Vec<_> = results.iter().map(|r| r.summary.clone()).collect();
    let mut summary = ExperimentSummary::aggregate(&summaries);
    summary.wall_clock = Some(start.elapsed());
    Ok(Experiment { results, summary })
}

/// Runs one experiment per server count, keeping every other parameter of `config`.
pub fn run_sweep(
    config: &StationConfig,
    servers: &[u32],
    replications: usize,
) -> Result<Vec<(u32, Experiment)>, SimulationError> {
    servers
        .iter()
        .map(|&c| {
            let mut config = config.clone();
            config.servers = c;
            log::info!("sweep: {} servers", c);
            run_experiment(&config, replications).map(|e| (c, e))
        })
        .collect()
}
