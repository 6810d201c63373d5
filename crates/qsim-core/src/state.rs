use std::collections::BinaryHeap;

use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::component::Id;
use crate::error::SchedulingError;
use crate::event::{Event, EventData, EventId};
use crate::log::log_rejected_event;

/// Delays this close below zero are floating-point noise and are scheduled at the current time.
pub const EPSILON: f64 = 1e-12;

/// State shared by the simulation and all component contexts.
pub(crate) struct SimulationState {
    clock: f64,
    rng: Pcg64,
    queue: BinaryHeap<Event>,
    next_event_id: EventId,
    components: Vec<String>,
}

impl SimulationState {
    pub fn new(seed: u64) -> Self {
        Self {
            clock: 0.,
            rng: Pcg64::seed_from_u64(seed),
            queue: BinaryHeap::new(),
            next_event_id: 0,
            components: Vec::new(),
        }
    }

    pub fn time(&self) -> f64 {
        self.clock
    }

    pub fn sample<T, D: Distribution<T>>(&mut self, dist: &D) -> T {
        dist.sample(&mut self.rng)
    }

    pub fn register(&mut self, name: &str) -> Id {
        self.components.push(name.to_owned());
        (self.components.len() - 1) as Id
    }

    pub fn component_name(&self, id: Id) -> &str {
        &self.components[id as usize]
    }

    /// Puts an event into the queue at `clock + delay` under the next insertion sequence number.
    pub fn schedule<T>(&mut self, data: T, src: Id, dest: Id, delay: f64) -> Result<EventId, SchedulingError>
    where
        T: EventData,
    {
        let error = if delay.is_nan() {
            Some(SchedulingError::NotANumber)
        } else if delay < -EPSILON {
            Some(SchedulingError::NegativeDelay { delay })
        } else {
            None
        };
        let event = Event {
            id: self.next_event_id,
            time: self.clock + delay.max(0.),
            src,
            dest,
            data: Box::new(data),
        };
        if let Some(error) = error {
            log_rejected_event(&event, self.component_name(src), &error);
            return Err(error);
        }
        self.next_event_id += 1;
        let id = event.id;
        self.queue.push(event);
        Ok(id)
    }

    /// Removes the earliest event and moves the clock to its time.
    pub fn pop(&mut self) -> Option<Event> {
        let event = self.queue.pop()?;
        debug_assert!(event.time >= self.clock);
        self.clock = event.time;
        Some(event)
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek().map(|e| e.time)
    }

    pub fn scheduled_count(&self) -> u64 {
        self.next_event_id
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }
}
