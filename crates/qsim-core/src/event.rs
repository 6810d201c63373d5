//! Simulation events.

use std::cmp::Ordering;

use downcast_rs::{impl_downcast, Downcast};
use serde::ser::Serialize;

use crate::component::Id;

/// Event identifier.
///
/// Identifiers are assigned sequentially in the order of event creation,
/// so they also serve as the insertion sequence used for tie-breaking.
pub type EventId = u64;

/// Trait that should be implemented by event payload.
///
/// It is implemented automatically for every serializable `'static` type.
pub trait EventData: Downcast + erased_serde::Serialize {}

impl_downcast!(EventData);

erased_serde::serialize_trait_object!(EventData);

impl<T: Serialize + 'static> EventData for T {}

/// Representation of event.
pub struct Event {
    /// Unique event identifier (insertion sequence).
    pub id: EventId,
    /// Time of event occurrence.
    pub time: f64,
    /// Identifier of event source.
    pub src: Id,
    /// Identifier of event destination.
    pub dest: Id,
    /// Event payload.
    pub data: Box<dyn EventData>,
}

impl Eq for Event {}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

// Reversed, so that BinaryHeap pops the earliest event and the oldest one among simultaneous events.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.total_cmp(&self.time).then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    fn event(id: EventId, time: f64) -> Event {
        Event {
            id,
            time,
            src: 0,
            dest: 0,
            data: Box::new(()),
        }
    }

    #[test]
    fn heap_pops_by_time_then_by_id() {
        let mut heap = BinaryHeap::new();
        heap.push(event(0, 2.0));
        heap.push(event(1, 1.0));
        heap.push(event(2, 2.0));
        heap.push(event(3, 1.0));
        heap.push(event(4, 0.5));

        let order: Vec<EventId> = std::iter::from_fn(|| heap.pop()).map(|e| e.id).collect();
        assert_eq!(order, vec![4, 1, 3, 0, 2]);
    }
}
