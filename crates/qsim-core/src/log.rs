//! Logging macros for simulation components.
//!
//! Messages go through the [`log`] facade with the component name as the target and are prefixed
//! with the simulation time, the level and the component name, e.g. `[12.500 DEBUG station] ...`.
//! Level names are coloured when stderr is a terminal.

use atty::Stream;
use colored::{Color, ColoredString, Colorize};
use serde::Serialize;
use serde_json::json;
use serde_type_name::type_name;

use crate::error::SchedulingError;
use crate::event::Event;

/// Returns `s` in the given colour, or uncoloured if stderr is not a terminal.
pub fn paint(s: &str, color: Color) -> ColoredString {
    if atty::is(Stream::Stderr) {
        s.color(color)
    } else {
        s.normal()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with_ctx {
    ($level:ident, $label:literal, $color:ident, $ctx:expr, $format:literal $(, $arg:expr)* $(,)?) => {
        log::$level!(
            target: $ctx.name(),
            concat!("[{:.3} {} {}] ", $format),
            $ctx.time(),
            $crate::log::paint($label, $crate::colored::Color::$color),
            $ctx.name()
            $(, $arg)*
        )
    };
    ($level:ident, $label:literal, $color:ident, $ctx:expr, $msg:expr) => {
        $crate::__log_with_ctx!($level, $label, $color, $ctx, "{}", $msg)
    };
}

/// Logs a message of a component at the info level.
///
/// The first argument is anything with `time()` and `name()` methods, normally the component's
/// [`SimulationContext`](crate::SimulationContext). The rest is a format string with arguments or a single
/// displayable value.
///
/// ```rust
/// use qsim_core::{log_info, Simulation};
///
/// let mut sim = Simulation::new(1);
/// let ctx = sim.create_context("station");
/// log_info!(ctx, "opened with {} servers", 3);
/// log_info!(ctx, "closed");
/// ```
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => { $crate::__log_with_ctx!(info, "INFO", Green, $ctx, $($arg)+) };
}

/// Logs a message of a component at the debug level. See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => { $crate::__log_with_ctx!(debug, "DEBUG", Blue, $ctx, $($arg)+) };
}

/// Logs a message of a component at the trace level. See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)+) => { $crate::__log_with_ctx!(trace, "TRACE", Cyan, $ctx, $($arg)+) };
}

/// Logs a message of a component at the warn level. See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => { $crate::__log_with_ctx!(warn, "WARN", Yellow, $ctx, $($arg)+) };
}

/// Logs a message of a component at the error level. See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => { $crate::__log_with_ctx!(error, "ERROR", Red, $ctx, $($arg)+) };
}

pub(crate) fn event_json<S: Serialize, D: Serialize>(event: &Event, src: S, dest: D) -> serde_json::Value {
    json!({
        "id": event.id,
        "type": type_name(&event.data).unwrap_or("unknown"),
        "data": event.data,
        "src": src,
        "dest": dest,
    })
}

fn log_kernel_error(time: f64, what: &str, details: serde_json::Value) {
    log::error!(
        target: "simulation",
        "[{:.3} {} simulation] {}: {}",
        time,
        paint("ERROR", Color::Red),
        what,
        details
    );
}

/// Logs an event whose payload type is not matched by the receiving handler.
///
/// Called by the [`cast!`](crate::cast!) macro.
pub fn log_unhandled_event(event: Event) {
    log_kernel_error(event.time, "unhandled event", event_json(&event, event.src, event.dest));
}

pub(crate) fn log_undelivered_event(event: &Event, src: &str, dest: &str) {
    log_kernel_error(event.time, "no handler for event", event_json(event, src, dest));
}

pub(crate) fn log_rejected_event(event: &Event, src: &str, error: &SchedulingError) {
    log_kernel_error(
        event.time,
        &format!("event rejected ({})", error),
        event_json(event, src, "?"),
    );
}
