//! Simulation setup and execution.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rand::distributions::Distribution;

use crate::component::Id;
use crate::context::SimulationContext;
use crate::handler::EventHandler;
use crate::log::{event_json, log_undelivered_event, paint};
use crate::state::SimulationState;

/// A discrete-event simulation: virtual clock, pending events and a seeded random number generator.
///
/// Events are delivered one at a time in ascending order of their time. Events scheduled for the same time
/// are delivered in the order they were scheduled, so a run is a deterministic function of the seed
/// and the model. The clock never goes backwards.
///
/// A simulation is single-threaded. Independent simulations share nothing and may run on different threads.
pub struct Simulation {
    state: Rc<RefCell<SimulationState>>,
    ids: HashMap<String, Id>,
    handlers: Vec<Option<Rc<RefCell<dyn EventHandler>>>>,
}

impl Simulation {
    /// Creates an empty simulation at time zero whose random number generator is seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimulationState::new(seed))),
            ids: HashMap::new(),
            handlers: Vec::new(),
        }
    }

    fn register(&mut self, name: &str) -> Id {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.state.borrow_mut().register(name);
        self.ids.insert(name.to_owned(), id);
        self.handlers.push(None);
        log::debug!(
            target: "simulation",
            "[{:.3} {} simulation] registered component `{}` with id {}",
            self.time(),
            paint("DEBUG", colored::Color::Blue),
            name,
            id
        );
        id
    }

    /// Returns the context of the component with the given name, registering the component if it is new.
    ///
    /// ```rust
    /// use qsim_core::Simulation;
    ///
    /// let mut sim = Simulation::new(1);
    /// let arrivals = sim.create_context("arrivals");
    /// let station = sim.create_context("station");
    /// assert_eq!((arrivals.id(), station.id()), (0, 1));
    /// assert_eq!(sim.lookup_id("station"), 1);
    /// ```
    pub fn create_context<S: AsRef<str>>(&mut self, name: S) -> SimulationContext {
        let id = self.register(name.as_ref());
        SimulationContext::new(id, name.as_ref(), self.state.clone())
    }

    /// Installs the event handler of the component with the given name and returns the component id.
    ///
    /// A component whose context was created earlier keeps its id.
    pub fn add_handler<S: AsRef<str>>(&mut self, name: S, handler: Rc<RefCell<dyn EventHandler>>) -> Id {
        let id = self.register(name.as_ref());
        self.handlers[id as usize] = Some(handler);
        id
    }

    /// Id of the component with the given name. Panics if there is no such component.
    pub fn lookup_id(&self, name: &str) -> Id {
        self.ids[name]
    }

    /// Name of the component with the given id. Panics if there is no such component.
    pub fn lookup_name(&self, id: Id) -> String {
        self.state.borrow().component_name(id).to_owned()
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.state.borrow().time()
    }

    /// Draws a value from `dist` using the random number generator of the simulation.
    pub fn sample<T, D: Distribution<T>>(&mut self, dist: &D) -> T {
        self.state.borrow_mut().sample(dist)
    }

    /// Delivers the earliest pending event, advancing the clock to its time.
    ///
    /// An event addressed to a component without a handler is logged and dropped.
    /// Returns `false` if there were no pending events.
    pub fn step(&mut self) -> bool {
        let event = match self.state.borrow_mut().pop() {
            Some(event) => event,
            None => return false,
        };
        match self.handlers.get(event.dest as usize) {
            Some(Some(handler)) => {
                if log::log_enabled!(target: "simulation", log::Level::Trace) {
                    let state = self.state.borrow();
                    log::trace!(
                        target: "simulation",
                        "[{:.3} {} simulation] {}",
                        event.time,
                        paint("EVENT", colored::Color::BrightBlack),
                        event_json(&event, state.component_name(event.src), state.component_name(event.dest))
                    );
                }
                handler.borrow_mut().on(event);
            }
            _ => {
                let state = self.state.borrow();
                log_undelivered_event(&event, state.component_name(event.src), state.component_name(event.dest));
            }
        }
        true
    }

    /// Delivers events until none are left.
    pub fn step_until_no_events(&mut self) {
        while self.step() {}
    }

    /// Delivers all events scheduled at or before `horizon`.
    ///
    /// The first event after the horizon stays pending and the clock is not moved to it, so afterwards
    /// the clock shows the time of the last delivered event. Returns `true` if events remain pending.
    ///
    /// ```rust
    /// use serde::Serialize;
    /// use qsim_core::Simulation;
    ///
    /// #[derive(Serialize)]
    /// struct Timeout {}
    ///
    /// let mut sim = Simulation::new(1);
    /// let mut ctx = sim.create_context("timer");
    /// ctx.emit_self(Timeout {}, 30.);
    /// ctx.emit_self(Timeout {}, 60.);
    /// ctx.emit_self(Timeout {}, 90.);
    ///
    /// assert!(sim.step_until_time(60.));
    /// assert_eq!(sim.time(), 60.);
    /// assert_eq!(sim.pending_event_count(), 1);
    /// assert!(!sim.step_until_time(120.));
    /// assert_eq!(sim.time(), 90.);
    /// ```
    pub fn step_until_time(&mut self, horizon: f64) -> bool {
        loop {
            let next = self.state.borrow().peek_time();
            match next {
                Some(time) if time <= horizon => {
                    self.step();
                }
                Some(_) => return true,
                None => return false,
            }
        }
    }

    /// Total number of events scheduled so far.
    pub fn event_count(&self) -> u64 {
        self.state.borrow().scheduled_count()
    }

    /// Number of events not delivered yet.
    pub fn pending_event_count(&self) -> usize {
        self.state.borrow().pending_count()
    }
}
