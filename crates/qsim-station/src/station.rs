//! The service station: a FIFO server pool shared by the customers.

use std::collections::BTreeMap;

use rand_distr::Exp1;

use qsim_core::{cast, log_debug, log_error, log_trace};
use qsim_core::{Event, EventHandler, SimulationContext};

use crate::config::MINUTES_PER_HOUR;
use crate::customer::{Customer, CustomerId, CustomerRecord};
use crate::events::{CustomerArrived, ServerGranted, ServiceCompleted};
use crate::metrics::{QueueAreaTracker, UtilizationTracker};
use crate::pool::{Admission, ServerHandle, ServerPool};
use crate::replication::{CustomerSamples, ReplicationSummary};

/// Single-queue multi-server station with exponential service times.
///
/// Drives every customer through its lifecycle and keeps the performance trackers up to date:
/// - on arrival the customer requests a server and either starts service or waits in the queue;
/// - a waiting customer resumes when a departing customer hands its server over;
/// - after the service time elapses the customer departs and releases the server.
pub struct ServiceStation {
    pool: ServerPool<CustomerId>,
    service_rate: f64,
    customers: BTreeMap<CustomerId, Customer>,
    departed: Vec<CustomerRecord>,
    queue_area: QueueAreaTracker,
    utilization: UtilizationTracker,
    samples: CustomerSamples,
    arrivals: u64,
    completions: u64,
    ctx: SimulationContext,
}

impl ServiceStation {
    /// Creates a station with `servers` servers, each completing `service_rate` customers per time unit.
    pub fn new(servers: usize, service_rate: f64, ctx: SimulationContext) -> Self {
        Self {
            pool: ServerPool::new(servers),
            service_rate,
            customers: BTreeMap::new(),
            departed: Vec::new(),
            queue_area: QueueAreaTracker::new(),
            utilization: UtilizationTracker::new(servers),
            samples: CustomerSamples::default(),
            arrivals: 0,
            completions: 0,
            ctx,
        }
    }

    pub fn queue_len(&self) -> usize {
        self.pool.queue_len()
    }

    pub fn busy_servers(&self) -> usize {
        self.pool.busy()
    }

    pub fn arrivals(&self) -> u64 {
        self.arrivals
    }

    pub fn completions(&self) -> u64 {
        self.completions
    }

    fn on_arrival(&mut self, customer_id: CustomerId) {
        let now = self.ctx.time();
        self.arrivals += 1;
        self.queue_area.update(now, self.pool.queue_len());
        let mut customer = Customer::arrive(customer_id, now);
        match self.pool.request(customer_id) {
            Admission::Granted(handle) => self.start_service(customer, handle),
            Admission::Queued { position } => {
                log_trace!(self.ctx, "customer {} waits at position {}", customer_id, position);
                customer.enqueue();
                self.customers.insert(customer_id, customer);
            }
        }
    }

    fn on_server_granted(&mut self, customer_id: CustomerId, handle: ServerHandle) {
        match self.customers.remove(&customer_id) {
            Some(customer) => self.start_service(customer, handle),
            None => log_error!(self.ctx, "server granted to unknown customer {}", customer_id),
        }
    }

    fn start_service(&mut self, mut customer: Customer, handle: ServerHandle) {
        let now = self.ctx.time();
        let service_time = self.ctx.sample::<f64, _>(&Exp1) / self.service_rate;
        let wait = customer.start_service(now, handle, service_time);
        self.queue_area.update(now, self.pool.queue_len());
        self.utilization.start_service(now);
        self.samples.waits.add(wait);
        self.samples.services.add(service_time);
        log_trace!(
            self.ctx,
            "customer {} starts service after waiting {:.3}, service takes {:.3}",
            customer.id(),
            wait,
            service_time
        );
        self.ctx.emit_self(
            ServiceCompleted {
                customer_id: customer.id(),
            },
            service_time,
        );
        self.customers.insert(customer.id(), customer);
    }

    fn on_service_completed(&mut self, customer_id: CustomerId) {
        let mut customer = match self.customers.remove(&customer_id) {
            Some(customer) => customer,
            None => {
                log_error!(self.ctx, "service completed for unknown customer {}", customer_id);
                return;
            }
        };
        let now = self.ctx.time();
        // the departing customer's server is handed over below, so the queue is still as long as it has been
        self.queue_area.update(now, self.pool.queue_len());
        let handle = customer.depart(now);
        if let Some(grant) = self.pool.release(handle) {
            self.ctx.emit_self_now(ServerGranted {
                customer_id: grant.requester,
                handle: grant.handle,
            });
        }
        self.utilization.end_service(now);
        let record = customer.record();
        let total = now - record.arrival_time;
        self.samples.totals.add(total);
        self.completions += 1;
        log_trace!(self.ctx, "customer {} departs after {:.3}", customer_id, total);
        self.departed.push(record);
    }

    /// Closes the trackers at `horizon` and summarizes the run.
    ///
    /// Customers still in the station are reported with their partial records.
    pub fn finish(&mut self, horizon: f64) -> (ReplicationSummary, CustomerSamples, Vec<CustomerRecord>) {
        self.utilization.finalize(horizon);
        self.queue_area.update(horizon, self.pool.queue_len());

        let summary = ReplicationSummary {
            avg_wait_min: self.samples.waits.mean(),
            p95_wait_min: self.samples.waits.p95(),
            avg_service_min: self.samples.services.mean(),
            avg_total_min: self.samples.totals.mean(),
            avg_queue_len: self.queue_area.average(horizon),
            utilization_pct: self.utilization.utilization(horizon) * 100.,
            throughput_per_hour: throughput_per_hour(self.completions, horizon),
            arrivals: self.arrivals,
            completions: self.completions,
        };
        log_debug!(
            self.ctx,
            "finished: {} arrivals, {} completions, {} in queue, {} in service",
            self.arrivals,
            self.completions,
            self.pool.queue_len(),
            self.pool.busy()
        );

        let mut records = std::mem::take(&mut self.departed);
        records.extend(self.customers.values().map(Customer::record));
        records.sort_by_key(|r| r.id);
        (summary, self.samples.clone(), records)
    }
}

pub(crate) fn throughput_per_hour(completions: u64, horizon: f64) -> f64 {
    let hours = horizon / MINUTES_PER_HOUR;
    if hours > 0. {
        completions as f64 / hours
    } else {
        0.
    }
}

impl EventHandler for ServiceStation {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            CustomerArrived { customer_id } => {
                self.on_arrival(customer_id);
            }
            ServerGranted { customer_id, handle } => {
                self.on_server_granted(customer_id, handle);
            }
            ServiceCompleted { customer_id } => {
                self.on_service_completed(customer_id);
            }
        })
    }
}
