//! Lifecycle of a single customer.

use serde::Serialize;

use qsim_core::{Process, ProcessStatus};

use crate::pool::ServerHandle;

/// Sequential customer number assigned by the arrival generator.
pub type CustomerId = u64;

/// Position of a customer in its lifecycle.
///
/// Transitions go strictly forward: `Arrived -> (Queued) -> InService -> Departed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CustomerState {
    /// Just entered the station.
    Arrived,
    /// Waiting for a free server.
    Queued,
    /// Holding a server.
    InService,
    /// Left the station after service.
    Departed,
}

/// A customer moving through the station.
#[derive(Clone, Debug)]
pub struct Customer {
    id: CustomerId,
    state: CustomerState,
    arrival_time: f64,
    service_start_time: Option<f64>,
    service_time: Option<f64>,
    departure_time: Option<f64>,
    server: Option<ServerHandle>,
}

impl Customer {
    pub fn arrive(id: CustomerId, now: f64) -> Self {
        Self {
            id,
            state: CustomerState::Arrived,
            arrival_time: now,
            service_start_time: None,
            service_time: None,
            departure_time: None,
            server: None,
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn state(&self) -> CustomerState {
        self.state
    }

    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    pub fn server(&self) -> Option<ServerHandle> {
        self.server
    }

    /// All servers were busy on arrival.
    pub fn enqueue(&mut self) {
        assert_eq!(self.state, CustomerState::Arrived, "customer {} queued twice", self.id);
        self.state = CustomerState::Queued;
    }

    /// Takes a server for `service_time` and returns the time spent waiting for it.
    pub fn start_service(&mut self, now: f64, server: ServerHandle, service_time: f64) -> f64 {
        assert!(
            matches!(self.state, CustomerState::Arrived | CustomerState::Queued),
            "customer {} is admitted in state {:?}",
            self.id,
            self.state
        );
        self.state = CustomerState::InService;
        self.service_start_time = Some(now);
        self.service_time = Some(service_time);
        self.server = Some(server);
        now - self.arrival_time
    }

    /// Leaves the station, returning the server to be released.
    pub fn depart(&mut self, now: f64) -> ServerHandle {
        assert_eq!(
            self.state,
            CustomerState::InService,
            "customer {} departs without being served",
            self.id
        );
        self.state = CustomerState::Departed;
        self.departure_time = Some(now);
        self.server.take().expect("customer in service holds a server")
    }

    pub fn record(&self) -> CustomerRecord {
        CustomerRecord {
            id: self.id,
            arrival_time: self.arrival_time,
            service_start_time: self.service_start_time,
            service_time: self.service_time,
            departure_time: self.departure_time,
        }
    }
}

impl Process for Customer {
    fn status(&self) -> ProcessStatus {
        match self.state {
            CustomerState::Arrived => ProcessStatus::Running,
            CustomerState::Queued | CustomerState::InService => ProcessStatus::Suspended,
            CustomerState::Departed => ProcessStatus::Terminated,
        }
    }
}

/// Timestamps of a customer, as observed when the replication ended.
///
/// Customers still waiting or in service at the horizon have the later fields unset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub arrival_time: f64,
    pub service_start_time: Option<f64>,
    /// Drawn service duration.
    pub service_time: Option<f64>,
    pub departure_time: Option<f64>,
}

impl CustomerRecord {
    pub fn wait(&self) -> Option<f64> {
        self.service_start_time.map(|start| start - self.arrival_time)
    }

    /// Time actually spent at a server, from service start to departure.
    pub fn service(&self) -> Option<f64> {
        Some(self.departure_time? - self.service_start_time?)
    }

    pub fn total(&self) -> Option<f64> {
        self.departure_time.map(|departure| departure - self.arrival_time)
    }

    pub fn has_departed(&self) -> bool {
        self.departure_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Admission, ServerPool};

    fn handle() -> ServerHandle {
        match ServerPool::new(1).request(()) {
            Admission::Granted(handle) => handle,
            Admission::Queued { .. } => unreachable!(),
        }
    }

    #[test]
    fn lifecycle_with_waiting() {
        let mut customer = Customer::arrive(7, 1.5);
        assert_eq!(customer.status(), ProcessStatus::Running);
        customer.enqueue();
        assert_eq!(customer.state(), CustomerState::Queued);
        assert_eq!(customer.status(), ProcessStatus::Suspended);

        let wait = customer.start_service(4.0, handle(), 2.0);
        assert_eq!(wait, 2.5);
        assert_eq!(customer.state(), CustomerState::InService);

        customer.depart(6.0);
        assert!(customer.is_terminated());
        assert!(customer.server().is_none());

        let record = customer.record();
        assert_eq!(record.wait(), Some(2.5));
        assert_eq!(record.service(), Some(2.0));
        assert_eq!(record.total(), Some(4.5));
    }

    #[test]
    fn unfinished_customer_has_partial_record() {
        let mut customer = Customer::arrive(1, 0.0);
        customer.start_service(0.0, handle(), 10.0);
        let record = customer.record();
        assert_eq!(record.wait(), Some(0.0));
        assert_eq!(record.service(), None);
        assert_eq!(record.total(), None);
        assert!(!record.has_departed());
    }

    #[test]
    #[should_panic(expected = "departs without being served")]
    fn departure_requires_service() {
        let mut customer = Customer::arrive(1, 0.0);
        customer.enqueue();
        customer.depart(1.0);
    }
}
