//! Event handling.

use crate::event::Event;

/// Component that reacts to events addressed to it.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use serde::Serialize;
/// use qsim_core::{cast, Event, EventHandler, Simulation};
///
/// #[derive(Clone, Serialize)]
/// struct CustomerArrived {
///     customer_id: u64,
/// }
///
/// #[derive(Default)]
/// struct Door {
///     entered: Vec<u64>,
/// }
///
/// impl EventHandler for Door {
///     fn on(&mut self, event: Event) {
///         cast!(match event.data {
///             CustomerArrived { customer_id } => {
///                 self.entered.push(customer_id);
///             }
///         })
///     }
/// }
///
/// let mut sim = Simulation::new(1);
/// let mut source = sim.create_context("source");
/// let door = Rc::new(RefCell::new(Door::default()));
/// let door_id = sim.add_handler("door", door.clone());
///
/// source.emit(CustomerArrived { customer_id: 7 }, door_id, 2.5);
/// sim.step();
/// assert_eq!(door.borrow().entered, vec![7]);
/// assert_eq!(sim.time(), 2.5);
/// ```
pub trait EventHandler {
    /// Processes an event. The simulation clock is already set to the event time.
    fn on(&mut self, event: Event);
}

/// Dispatches an event payload by its concrete type.
///
/// Each arm names a payload struct and destructures it; the first arm whose type matches the payload
/// is executed. Payloads matching no arm are logged as unhandled.
#[macro_export]
macro_rules! cast {
    ( match $event:ident.data { $( $type:ident { $($field:tt)* } => { $($body:tt)* } )+ } ) => {{
        let __payload: Option<Box<dyn $crate::EventData>> = Some($event.data);
        $(
            let __payload = match __payload {
                Some(data) => match data.downcast::<$type>() {
                    Ok(value) => {
                        let $type { $($field)* } = *value;
                        { $($body)* };
                        None
                    }
                    Err(data) => Some(data),
                },
                None => None,
            };
        )+
        if let Some(data) = __payload {
            $crate::log::log_unhandled_event($crate::Event { data, ..$event });
        }
    }};
}
