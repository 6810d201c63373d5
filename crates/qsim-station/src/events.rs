//! Event payloads exchanged by the arrival generator and the station.

use serde::Serialize;

use crate::customer::CustomerId;
use crate::pool::ServerHandle;

/// Internal timer of the arrival generator.
#[derive(Clone, Serialize)]
pub struct GenerateArrival {}

/// A new customer enters the station.
#[derive(Clone, Serialize)]
pub struct CustomerArrived {
    pub customer_id: CustomerId,
}

/// A waiting customer has been given a server and resumes.
#[derive(Clone, Serialize)]
pub struct ServerGranted {
    pub customer_id: CustomerId,
    pub handle: ServerHandle,
}

/// Service of a customer has finished.
#[derive(Clone, Serialize)]
pub struct ServiceCompleted {
    pub customer_id: CustomerId,
}
