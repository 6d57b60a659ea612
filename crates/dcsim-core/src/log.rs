//! Logging facilities.
//!
//! Component messages are prefixed with `[time LEVEL component]`, the level name is colored when the log goes
//! to a terminal. Messages of the engine itself use `simulation` as the component name.

use atty::Stream;
use colored::{Color, ColoredString, Colorize};
use log::{debug, error};
use serde_json::{json, Value};

use crate::event::{Event, EventData};

/// Applies the color to the string if stderr (log) goes to console.
pub fn get_colored(s: &str, color: Color) -> ColoredString {
    if atty::is(Stream::Stderr) {
        s.color(color)
    } else {
        s.normal()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_component {
    ($level:ident, $label:expr, $color:ident, $ctx:expr, $msg:expr) => (
        log::$level!(
            target: $ctx.name(),
            "[{:.3} {} {}] {}",
            $ctx.time(), $crate::log::get_colored($label, $crate::colored::Color::$color), $ctx.name(), $msg
        )
    );
    ($level:ident, $label:expr, $color:ident, $ctx:expr, $format:expr, $($arg:tt)+) => (
        log::$level!(
            target: $ctx.name(),
            concat!("[{:.3} {} {}] ", $format),
            $ctx.time(), $crate::log::get_colored($label, $crate::colored::Color::$color), $ctx.name(), $($arg)+
        )
    );
}

/// Logs a message at the info level.
///
/// The message is prefixed with the current simulation time and the component name.
///
/// # Examples
///
/// ```rust
/// use std::io::Write;
/// use env_logger::Builder;
/// use serde::Serialize;
/// use dcsim_core::{log_info, Simulation, SimulationContext};
///
/// #[derive(Serialize)]
/// enum Signal {
///     Start,
/// }
///
/// struct Component {
///     ctx: SimulationContext<Signal>,
/// }
///
/// impl Component {
///     fn start(&self) {
///         log_info!(self.ctx, "started with {} peers", 3);
///     }
/// }
///
/// Builder::from_default_env()
///     .format(|buf, record| writeln!(buf, "{}", record.args()))
///     .init();
///
/// let mut sim = Simulation::<Signal>::new(123);
/// let comp = Component { ctx: sim.create_context("comp") };
/// comp.start();
/// ```
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_component!(info, "INFO ", Green, $ctx, $($arg)+));
}

/// Logs a message at the debug level, see [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_component!(debug, "DEBUG", Blue, $ctx, $($arg)+));
}

/// Logs a message at the trace level, see [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_component!(trace, "TRACE", Cyan, $ctx, $($arg)+));
}

/// Logs a message at the warn level, see [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_component!(warn, "WARN ", Yellow, $ctx, $($arg)+));
}

/// Logs a message at the error level, see [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_component!(error, "ERROR", Red, $ctx, $($arg)+));
}

fn render<E: EventData>(event: &Event<E>) -> Value {
    json!({"id": event.id, "data": event.data, "src": event.src, "dst": event.dst})
}

pub(crate) fn log_engine_debug(time: f64, message: &str, details: Value) {
    debug!(
        target: "simulation",
        "[{:.3} {} simulation] {}: {}",
        time,
        get_colored("DEBUG", Color::Blue),
        message,
        details
    );
}

fn log_engine_error(time: f64, message: &str, details: Value) {
    error!(
        target: "simulation",
        "[{:.3} {} simulation] {}: {}",
        time,
        get_colored("ERROR", Color::Red),
        message,
        details
    );
}

/// Logs an event which was delivered to a component that does not accept it and panics.
///
/// Components call it from the fallback arm of their event handlers: such an event is a bug in the sender.
pub fn fail_on_unexpected_event<E: EventData>(event: Event<E>, component: &str) -> ! {
    let details = render(&event);
    log_engine_error(event.time, &format!("Unexpected event for {}", component), details.clone());
    panic!("Component {} received unexpected event: {}", component, details);
}

pub(crate) fn log_undelivered_event<E: EventData>(event: &Event<E>) {
    log_engine_error(event.time, "Undelivered event", render(event));
}

pub(crate) fn log_incorrect_event<E: EventData>(event: &Event<E>, reason: &str) {
    log_engine_error(event.time, &format!("Incorrect event ({})", reason), render(event));
}
