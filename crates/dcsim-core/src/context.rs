//! Accessing simulation from components.

use std::cell::RefCell;
use std::rc::Rc;

use rand::distributions::uniform::{SampleRange, SampleUniform};

use crate::component::Id;
use crate::event::{Event, EventData, EventId};
use crate::state::SimulationState;

/// A facade for accessing the simulation state and producing events from simulation components.
///
/// Every event emitted through the context has the context's component as its source, except for
/// [`emit_as`](Self::emit_as).
pub struct SimulationContext<E> {
    id: Id,
    name: String,
    state: Rc<RefCell<SimulationState<E>>>,
}

impl<E: EventData> SimulationContext<E> {
    pub(crate) fn new(id: Id, name: &str, state: Rc<RefCell<SimulationState<E>>>) -> Self {
        Self {
            id,
            name: name.to_owned(),
            state,
        }
    }

    /// Returns the identifier of component associated with this context.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the name of component associated with this context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.state.borrow().time()
    }

    /// Returns a random float in the range _[0, 1)_ from the simulation-wide generator.
    pub fn rand(&self) -> f64 {
        self.state.borrow_mut().rand()
    }

    /// Returns a random value in the specified range from the simulation-wide generator.
    pub fn gen_range<T, R>(&self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.state.borrow_mut().gen_range(range)
    }

    /// Creates new event with specified payload, destination and delay.
    pub fn emit(&self, data: E, dst: Id, delay: f64) -> EventId {
        self.emit_as(data, self.id, dst, delay)
    }

    /// Creates new immediate (zero-delay) event with specified payload and destination.
    pub fn emit_now(&self, data: E, dst: Id) -> EventId {
        self.emit_as(data, self.id, dst, 0.)
    }

    /// Creates new event for itself with specified payload and delay.
    pub fn emit_self(&self, data: E, delay: f64) -> EventId {
        self.emit_as(data, self.id, self.id, delay)
    }

    /// Creates new immediate event for itself.
    pub fn emit_self_now(&self, data: E) -> EventId {
        self.emit_as(data, self.id, self.id, 0.)
    }

    /// Creates new event on behalf of another component.
    pub fn emit_as(&self, data: E, src: Id, dst: Id, delay: f64) -> EventId {
        self.state.borrow_mut().add_event(data, src, dst, delay)
    }

    /// Cancels the event if it is still pending.
    pub fn cancel_event(&self, id: EventId) {
        self.state.borrow_mut().cancel_event(id);
    }

    /// Checks whether the queue holds a pending event matching the predicate.
    pub fn has_pending_event<F>(&self, pred: F) -> bool
    where
        F: Fn(&Event<E>) -> bool,
    {
        self.state.borrow().has_pending_event(pred)
    }

    /// Returns the name of component by its identifier.
    ///
    /// Panics if component with such id does not exist.
    pub fn lookup_name(&self, id: Id) -> String {
        match self.state.borrow().lookup_name(id) {
            Some(name) => name.to_owned(),
            None => panic!("Component with id {} does not exist", id),
        }
    }
}
