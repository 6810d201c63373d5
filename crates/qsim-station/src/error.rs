//! Error types.

use thiserror::Error;

use qsim_core::SchedulingError;

/// Invalid simulation input, detected before any simulation state is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A rate is zero, negative or not finite.
    #[error("`{field}` must be a positive finite number, got {value}")]
    NonPositiveRate {
        /// Name of the offending field.
        field: &'static str,
        /// Supplied value.
        value: f64,
    },
    /// The number of servers is zero.
    #[error("the number of servers must be at least 1")]
    NonPositiveCapacity,
    /// The simulated duration is zero, negative or not finite.
    #[error("`hours` must be a positive finite number, got {hours}")]
    NonPositiveHorizon {
        /// Supplied value.
        hours: f64,
    },
    /// A piecewise arrival segment is malformed.
    #[error("piecewise arrival segment #{index} is invalid: {reason}")]
    InvalidSegment {
        /// Position of the segment in the configuration.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
    /// An experiment was requested with zero replications.
    #[error("the number of replications must be at least 1")]
    NoReplications,
}

/// Error returned by the replication driver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The model tried to schedule an event in the past.
    #[error("scheduling failed: {0}")]
    Scheduling(#[from] SchedulingError),
    /// Some replications did not report back, which means their worker thread panicked.
    #[error("only {received} of {expected} replications finished")]
    Incomplete {
        /// Number of requested replications.
        expected: usize,
        /// Number of replications that reported a result.
        received: usize,
    },
}
