//! A single replication of the station and its summary.

use serde::Serialize;
use sugars::{rc, refcell};

use qsim_core::Simulation;

use crate::arrivals::ArrivalGenerator;
use crate::config::StationConfig;
use crate::customer::CustomerRecord;
use crate::error::SimulationError;
use crate::metrics::{mean, SampleMetric};
use crate::station::{throughput_per_hour, ServiceStation};

/// Raw per-customer observations of a replication.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CustomerSamples {
    /// Waiting times of customers that started service, in order of service start.
    pub waits: SampleMetric,
    /// Drawn service times of customers that started service, in order of service start.
    pub services: SampleMetric,
    /// Times in system of departed customers, in order of departure.
    pub totals: SampleMetric,
}

/// Performance metrics of one replication. Times are in minutes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplicationSummary {
    pub avg_wait_min: f64,
    /// Present only if at least 20 customers started service.
    pub p95_wait_min: Option<f64>,
    pub avg_service_min: f64,
    pub avg_total_min: f64,
    pub avg_queue_len: f64,
    pub utilization_pct: f64,
    pub throughput_per_hour: f64,
    pub arrivals: u64,
    pub completions: u64,
}

impl ReplicationSummary {
    /// Recomputes the summary of a run that ended at `horizon` from the customer records alone.
    ///
    /// Time-weighted metrics are obtained by summing per-customer intervals instead of integrating
    /// the queue and server occupancy, so this serves as an independent check of the trackers.
    pub fn from_records(records: &[CustomerRecord], servers: usize, horizon: f64) -> Self {
        let waits: SampleMetric = records.iter().filter_map(|r| r.wait()).collect::<Vec<_>>().into();
        let services: Vec<f64> = records.iter().filter_map(|r| r.service_time).collect();
        let totals: Vec<f64> = records.iter().filter_map(|r| r.total()).collect();

        let queue_area: f64 = records
            .iter()
            .map(|r| r.service_start_time.unwrap_or(horizon).min(horizon) - r.arrival_time)
            .sum();
        let busy_area: f64 = records
            .iter()
            .filter_map(|r| {
                let start = r.service_start_time?;
                Some(r.departure_time.unwrap_or(horizon).min(horizon) - start)
            })
            .sum();
        let completions = totals.len() as u64;

        Self {
            avg_wait_min: waits.mean(),
            p95_wait_min: waits.p95(),
            avg_service_min: mean(&services),
            avg_total_min: mean(&totals),
            avg_queue_len: if horizon > 0. { queue_area / horizon } else { 0. },
            utilization_pct: if horizon > 0. {
                busy_area / (servers as f64 * horizon) * 100.
            } else {
                0.
            },
            throughput_per_hour: throughput_per_hour(completions, horizon),
            arrivals: records.len() as u64,
            completions,
        }
    }
}

/// Everything produced by one replication.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplicationResult {
    pub seed: u64,
    pub summary: ReplicationSummary,
    pub samples: CustomerSamples,
    /// Records of all customers that arrived, ordered by customer id.
    pub customers: Vec<CustomerRecord>,
}

/// Runs one replication with the seed from the config.
///
/// The configuration is validated first; nothing is simulated if it is rejected.
pub fn run_one(config: &StationConfig) -> Result<ReplicationResult, SimulationError> {
    config.validate()?;
    run_replication(config, config.seed)
}

/// Runs one replication of an already validated config with the given seed.
pub(crate) fn run_replication(config: &StationConfig, seed: u64) -> Result<ReplicationResult, SimulationError> {
    let horizon = config.horizon_minutes();
    let mut sim = Simulation::new(seed);

    let station = rc!(refcell!(ServiceStation::new(
        config.servers as usize,
        config.service_rate_per_minute(),
        sim.create_context("station"),
    )));
    let station_id = sim.add_handler("station", station.clone());

    let arrivals = rc!(refcell!(ArrivalGenerator::new(
        config.arrival_schedule(),
        horizon,
        station_id,
        sim.create_context("arrivals"),
    )));
    sim.add_handler("arrivals", arrivals.clone());
    arrivals.borrow_mut().start()?;

    sim.step_until_time(horizon);

    let (summary, samples, customers) = station.borrow_mut().finish(horizon);
    Ok(ReplicationResult {
        seed,
        summary,
        samples,
        customers,
    })
}
