//! Scheduling errors.

use thiserror::Error;

/// Error returned when an event cannot be placed into the event queue.
///
/// Any of these errors means that the model tried to act in the past or produced a broken delay value,
/// which is a defect in the model rather than a recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulingError {
    /// The requested delay is negative.
    #[error("negative event delay {delay}: it is not allowed to add events from the past")]
    NegativeDelay {
        /// Requested delay.
        delay: f64,
    },
    /// The requested delay is NaN.
    #[error("event delay is not a number")]
    NotANumber,
}
