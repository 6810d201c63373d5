//! Status of resumable model processes.
//!
//! Model entities such as customers or arrival sources are written as explicit state machines
//! that are advanced by events delivered to their owning component. Between two events a process
//! is suspended, waiting either for a timer or for a resource.

use serde::Serialize;

/// Coarse status of a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProcessStatus {
    /// The process is being advanced by the current event.
    Running,
    /// The process waits for a scheduled event or for a resource grant.
    Suspended,
    /// The process has finished and will not be resumed again.
    Terminated,
}

/// A resumable unit of model logic.
pub trait Process {
    /// Returns the current status of the process.
    fn status(&self) -> ProcessStatus;

    /// Returns `true` if the process will never be resumed again.
    fn is_terminated(&self) -> bool {
        self.status() == ProcessStatus::Terminated
    }
}
