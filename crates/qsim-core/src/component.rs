//! Simulation components.

/// Identifier of a simulation component, assigned sequentially on registration.
pub type Id = u32;
