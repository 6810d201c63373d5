//! Per-component access to the simulation.

use std::cell::RefCell;
use std::rc::Rc;

use rand::distributions::Distribution;

use crate::component::Id;
use crate::error::SchedulingError;
use crate::event::{EventData, EventId};
use crate::state::SimulationState;

/// Handle through which a component reads the clock, draws random numbers and schedules events.
///
/// Every event scheduled through a context carries the component's id as its source.
/// Contexts are created by [`Simulation::create_context`](crate::Simulation::create_context).
pub struct SimulationContext {
    id: Id,
    name: String,
    state: Rc<RefCell<SimulationState>>,
}

impl SimulationContext {
    pub(crate) fn new(id: Id, name: &str, state: Rc<RefCell<SimulationState>>) -> Self {
        Self {
            id,
            name: name.to_owned(),
            state,
        }
    }

    /// Id of the component owning this context.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of the component owning this context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.state.borrow().time()
    }

    /// Draws a value from `dist` using the random number generator of the simulation.
    ///
    /// All components of a simulation share one generator, so the drawn sequence depends only on the seed
    /// and on the order of events.
    pub fn sample<T, D: Distribution<T>>(&mut self, dist: &D) -> T {
        self.state.borrow_mut().sample(dist)
    }

    /// Schedules an event for `dest` after `delay` time units.
    ///
    /// Fails without scheduling anything if the delay is negative or NaN.
    pub fn try_emit<T>(&mut self, data: T, dest: Id, delay: f64) -> Result<EventId, SchedulingError>
    where
        T: EventData,
    {
        self.state.borrow_mut().schedule(data, self.id, dest, delay)
    }

    /// Schedules an event for `dest` after `delay` time units.
    ///
    /// Panics if the delay is negative or NaN. Use [`try_emit`](Self::try_emit) where the delay comes from
    /// outside of the model.
    pub fn emit<T>(&mut self, data: T, dest: Id, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.try_emit(data, dest, delay)
            .unwrap_or_else(|e| panic!("component `{}` failed to emit event: {}", self.name, e))
    }

    /// Schedules an event for `dest` at the current time.
    pub fn emit_now<T>(&mut self, data: T, dest: Id) -> EventId
    where
        T: EventData,
    {
        self.emit(data, dest, 0.)
    }

    /// Schedules an event for the owning component after `delay` time units.
    pub fn emit_self<T>(&mut self, data: T, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.emit(data, self.id, delay)
    }

    /// Schedules an event for the owning component at the current time.
    pub fn emit_self_now<T>(&mut self, data: T) -> EventId
    where
        T: EventData,
    {
        self.emit(data, self.id, 0.)
    }

    /// Name of the component with the given id.
    pub fn lookup_name(&self, id: Id) -> String {
        self.state.borrow().component_name(id).to_owned()
    }
}
