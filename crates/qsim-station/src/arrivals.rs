//! Source of customers.

use rand_distr::Exp1;

use qsim_core::{cast, log_debug, log_trace};
use qsim_core::{Event, EventHandler, Id, Process, ProcessStatus, SchedulingError, SimulationContext};

use crate::customer::CustomerId;
use crate::events::{CustomerArrived, GenerateArrival};
use crate::schedule::PiecewiseRateSchedule;

/// Generates customers according to a (possibly non-stationary) Poisson process.
///
/// Each arrival is sent to the station as a [`CustomerArrived`] event carrying a sequential customer id.
/// No new arrivals are scheduled once the horizon is reached or the arrival rate drops to zero.
pub struct ArrivalGenerator {
    schedule: PiecewiseRateSchedule,
    horizon: f64,
    station: Id,
    next_customer_id: CustomerId,
    halted: bool,
    ctx: SimulationContext,
}

impl ArrivalGenerator {
    pub fn new(schedule: PiecewiseRateSchedule, horizon: f64, station: Id, ctx: SimulationContext) -> Self {
        Self {
            schedule,
            horizon,
            station,
            next_customer_id: 0,
            halted: false,
            ctx,
        }
    }

    /// Schedules the first arrival.
    pub fn start(&mut self) -> Result<(), SchedulingError> {
        log_debug!(
            self.ctx,
            "starting with rate {:.4}/min until t={}",
            self.schedule.rate_at(self.ctx.time()),
            self.horizon
        );
        self.schedule_next()
    }

    /// Number of customers generated so far.
    pub fn generated(&self) -> u64 {
        self.next_customer_id
    }

    fn schedule_next(&mut self) -> Result<(), SchedulingError> {
        let now = self.ctx.time();
        if now >= self.horizon {
            self.halted = true;
            return Ok(());
        }
        let ctx = &mut self.ctx;
        let next = self.schedule.next_arrival(now, || ctx.sample(&Exp1));
        match next {
            Some(time) => {
                let id = self.ctx.id();
                self.ctx.try_emit(GenerateArrival {}, id, time - now)?;
            }
            None => {
                log_debug!(self.ctx, "arrival rate is zero, no more customers");
                self.halted = true;
            }
        }
        Ok(())
    }
}

impl Process for ArrivalGenerator {
    fn status(&self) -> ProcessStatus {
        if self.halted {
            ProcessStatus::Terminated
        } else {
            ProcessStatus::Suspended
        }
    }
}

impl EventHandler for ArrivalGenerator {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            GenerateArrival {} => {
                let customer_id = self.next_customer_id;
                self.next_customer_id += 1;
                log_trace!(self.ctx, "customer {} generated", customer_id);
                self.ctx.emit_now(CustomerArrived { customer_id }, self.station);
                if let Err(err) = self.schedule_next() {
                    panic!("arrival generator failed: {}", err);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use sugars::{rc, refcell};

    use qsim_core::Simulation;

    use super::*;
    use crate::schedule::RateSegment;

    struct Sink {
        arrivals: Vec<(f64, CustomerId)>,
        ctx: SimulationContext,
    }

    impl EventHandler for Sink {
        fn on(&mut self, event: Event) {
            cast!(match event.data {
                CustomerArrived { customer_id } => {
                    self.arrivals.push((self.ctx.time(), customer_id));
                }
            })
        }
    }

    fn setup(schedule: PiecewiseRateSchedule, horizon: f64) -> (Simulation, Rc<RefCell<ArrivalGenerator>>, Rc<RefCell<Sink>>) {
        let mut sim = Simulation::new(17);
        let sink = rc!(refcell!(Sink {
            arrivals: Vec::new(),
            ctx: sim.create_context("sink"),
        }));
        let sink_id = sim.add_handler("sink", sink.clone());
        let generator = rc!(refcell!(ArrivalGenerator::new(
            schedule,
            horizon,
            sink_id,
            sim.create_context("arrivals")
        )));
        sim.add_handler("arrivals", generator.clone());
        (sim, generator, sink)
    }

    #[test]
    fn generates_sequential_customers_until_horizon() {
        let (mut sim, generator, sink) = setup(PiecewiseRateSchedule::constant(0.5), 100.);
        generator.borrow_mut().start().unwrap();
        sim.step_until_time(100.);

        let arrivals = &sink.borrow().arrivals;
        assert!(arrivals.len() > 10);
        assert!(arrivals.iter().all(|(t, _)| *t <= 100.));
        assert!(arrivals.windows(2).all(|w| w[0].0 <= w[1].0 && w[1].1 == w[0].1 + 1));
        assert_eq!(arrivals[0].1, 0);
        assert_eq!(generator.borrow().generated(), arrivals.len() as u64);
        assert_eq!(generator.borrow().status(), ProcessStatus::Suspended);

        // the draw made past the horizon is never delivered within the run
        assert_eq!(sim.pending_event_count(), 1);
        sim.step_until_no_events();
        assert!(generator.borrow().is_terminated());
    }

    #[test]
    fn zero_rate_halts_generation() {
        let schedule = PiecewiseRateSchedule::new(0.5, vec![RateSegment::new(30., 0.), RateSegment::new(60., 1.)]);
        let (mut sim, generator, sink) = setup(schedule, 120.);
        generator.borrow_mut().start().unwrap();
        sim.step_until_time(120.);

        assert!(sink.borrow().arrivals.iter().all(|(t, _)| *t < 30.));
        assert!(generator.borrow().is_terminated());
        assert_eq!(sim.pending_event_count(), 0);
    }

    #[test]
    fn zero_initial_rate_schedules_nothing() {
        let (mut sim, generator, sink) = setup(PiecewiseRateSchedule::constant(0.), 60.);
        generator.borrow_mut().start().unwrap();
        assert!(generator.borrow().is_terminated());
        assert!(!sim.step());
        assert!(sink.borrow().arrivals.is_empty());
    }
}
