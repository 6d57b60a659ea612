//! Event handling.

use crate::event::Event;

/// Trait for consuming events in simulation components.
///
/// The payload type `E` is shared by all components of a simulation, so a handler matches on it
/// exhaustively and payloads of a wrong type cannot be delivered.
///
/// # Examples
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use serde::Serialize;
/// use dcsim_core::{Event, EventHandler, Simulation, SimulationContext};
///
/// #[derive(Serialize)]
/// pub enum Message {
///     Ping { value: u32 },
/// }
///
/// pub struct Component {
///     state: u32,
/// }
///
/// impl EventHandler<Message> for Component {
///     fn on(&mut self, event: Event<Message>) {
///         match event.data {
///             Message::Ping { value } => self.state = value,
///         }
///     }
/// }
///
/// let mut sim = Simulation::new(123);
/// let client_ctx = sim.create_context("client");
/// let comp = Rc::new(RefCell::new(Component { state: 0 }));
/// let comp_id = sim.add_handler("comp", comp.clone());
/// client_ctx.emit(Message::Ping { value: 16 }, comp_id, 1.2);
/// sim.step();
/// assert_eq!(comp.borrow().state, 16);
/// ```
pub trait EventHandler<E> {
    /// Processes event.
    fn on(&mut self, event: Event<E>);
}
