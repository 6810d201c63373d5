//! Input configuration of the service station.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schedule::{PiecewiseRateSchedule, RateSegment};

/// Minutes per hour; rates are given per hour while simulated time runs in minutes.
pub const MINUTES_PER_HOUR: f64 = 60.0;

fn default_seed() -> u64 {
    123
}

fn default_snapshot_minutes() -> f64 {
    1.0
}

fn default_replications() -> usize {
    5
}

fn default_seed_base() -> u64 {
    1000
}

/// One step of the time-varying arrival rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawRateSegment {
    /// Simulated minute at which the segment starts.
    pub start_min: f64,
    /// Arrival rate (customers per hour) from `start_min` until the next segment.
    pub rate_per_hour: f64,
}

/// Parameters of one replication of the station.
///
/// Deserializable from JSON or YAML. Fields with defaults:
/// `seed` (123), `snapshot_minutes` (1.0, kept for compatibility and ignored),
/// `piecewise_arrival_per_hour` (none, the arrival rate is constant).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Mean number of arrivals per hour outside of any piecewise segment.
    pub arrival_rate_per_hour: f64,
    /// Mean number of service completions per hour of a single busy server.
    pub service_rate_per_hour: f64,
    /// Number of identical servers.
    #[serde(alias = "tellers")]
    pub servers: u32,
    /// Simulated duration.
    pub hours: f64,
    /// Seed of the replication random number generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Snapshot granularity accepted for configuration compatibility, not used by the simulation.
    #[serde(default = "default_snapshot_minutes")]
    pub snapshot_minutes: f64,
    /// Optional step function overriding the arrival rate from given minutes on.
    #[serde(default)]
    pub piecewise_arrival_per_hour: Option<Vec<RawRateSegment>>,
}

impl StationConfig {
    /// Creates a config with constant arrival rate and default optional fields.
    pub fn new(arrival_rate_per_hour: f64, service_rate_per_hour: f64, servers: u32, hours: f64) -> Self {
        Self {
            arrival_rate_per_hour,
            service_rate_per_hour,
            servers,
            hours,
            seed: default_seed(),
            snapshot_minutes: default_snapshot_minutes(),
            piecewise_arrival_per_hour: None,
        }
    }

    /// Returns a copy with the given seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns a copy with the given piecewise arrival segments.
    pub fn with_piecewise_arrivals(mut self, segments: Vec<RawRateSegment>) -> Self {
        self.piecewise_arrival_per_hour = Some(segments);
        self
    }

    /// Checks that the configuration describes a runnable station.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("arrival_rate_per_hour", self.arrival_rate_per_hour)?;
        check_rate("service_rate_per_hour", self.service_rate_per_hour)?;
        if self.servers == 0 {
            return Err(ConfigError::NonPositiveCapacity);
        }
        if !(self.hours.is_finite() && self.hours > 0.) {
            return Err(ConfigError::NonPositiveHorizon { hours: self.hours });
        }
        for (index, segment) in self.piecewise_arrival_per_hour.iter().flatten().enumerate() {
            if !segment.start_min.is_finite() {
                return Err(ConfigError::InvalidSegment {
                    index,
                    reason: format!("start_min {} is not finite", segment.start_min),
                });
            }
            if segment.start_min < 0. {
                return Err(ConfigError::InvalidSegment {
                    index,
                    reason: format!("start_min {} is negative", segment.start_min),
                });
            }
            // zero is allowed here: it switches arrivals off
            if !(segment.rate_per_hour.is_finite() && segment.rate_per_hour >= 0.) {
                return Err(ConfigError::InvalidSegment {
                    index,
                    reason: format!("rate_per_hour {} is negative or not finite", segment.rate_per_hour),
                });
            }
        }
        Ok(())
    }

    /// Simulated duration in minutes.
    pub fn horizon_minutes(&self) -> f64 {
        self.hours * MINUTES_PER_HOUR
    }

    /// Service rate of a single server in completions per minute.
    pub fn service_rate_per_minute(&self) -> f64 {
        self.service_rate_per_hour / MINUTES_PER_HOUR
    }

    /// Builds the arrival rate schedule in arrivals per minute.
    pub fn arrival_schedule(&self) -> PiecewiseRateSchedule {
        let segments = self
            .piecewise_arrival_per_hour
            .iter()
            .flatten()
            .map(|s| RateSegment::new(s.start_min, s.rate_per_hour / MINUTES_PER_HOUR))
            .collect();
        PiecewiseRateSchedule::new(self.arrival_rate_per_hour / MINUTES_PER_HOUR, segments)
    }
}

fn check_rate(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveRate { field, value })
    }
}

/// A named set of replications of one station configuration.
///
/// Replication `i` (0-based) runs with seed `seed_base + i`; the `seed` of the station config is ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Name used for output files.
    pub experiment_name: String,
    /// Number of independent replications.
    #[serde(default = "default_replications")]
    pub replications: usize,
    /// Seed of the first replication.
    #[serde(default = "default_seed_base")]
    pub seed_base: u64,
    /// Station parameters.
    #[serde(flatten)]
    pub station: StationConfig,
}

impl ExperimentConfig {
    /// Station config with the seed set to `seed_base`.
    pub fn base_station(&self) -> StationConfig {
        self.station.clone().with_seed(self.seed_base)
    }
}
