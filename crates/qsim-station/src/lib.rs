//! A discrete-event model of a multi-server service station (M/M/c queue) built on `qsim-core`.
//!
//! Customers arrive according to a Poisson process, optionally with a piecewise-constant rate,
//! wait in a single FIFO queue and are served by one of `c` identical servers with exponential service times.
//!
//! - [`replication::run_one`] runs a single seeded replication and summarizes it.
//! - [`experiment::run_experiment`] runs independent replications in parallel and averages their summaries.
//! - [`analytic::mmc_metrics`] gives the steady-state values to compare the simulated ones with.

pub mod analytic;
pub mod arrivals;
pub mod config;
pub mod customer;
pub mod error;
pub mod events;
pub mod experiment;
pub mod metrics;
pub mod pool;
pub mod replication;
pub mod schedule;
pub mod station;

pub use config::{ExperimentConfig, RawRateSegment, StationConfig};
pub use error::{ConfigError, SimulationError};
pub use experiment::{run_experiment, run_experiment_n_workers, run_sweep, Experiment, ExperimentSummary};
pub use replication::{run_one, ReplicationResult, ReplicationSummary};
