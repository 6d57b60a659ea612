//! Simulation configuration and execution.

use std::cell::RefCell;
use std::rc::Rc;

use log::Level::Trace;
use log::{log_enabled, trace};
use rand::distributions::uniform::{SampleRange, SampleUniform};
use serde_json::json;

use crate::component::Id;
use crate::context::SimulationContext;
use crate::event::{Event, EventData};
use crate::handler::EventHandler;
use crate::log::{get_colored, log_engine_debug, log_undelivered_event};
use crate::state::SimulationState;

type HandlerRef<E> = Rc<RefCell<dyn EventHandler<E>>>;

/// Represents a simulation, provides methods for its configuration and execution.
///
/// All components of a simulation exchange events of the same payload type `E`.
pub struct Simulation<E> {
    state: Rc<RefCell<SimulationState<E>>>,
    // indexed by component id
    handlers: Vec<Option<HandlerRef<E>>>,
}

impl<E: EventData> Simulation<E> {
    /// Creates a new simulation with specified random seed.
    pub fn new(seed: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimulationState::new(seed))),
            handlers: Vec::new(),
        }
    }

    fn register(&mut self, name: &str) -> Id {
        let id = self.state.borrow_mut().register(name);
        if self.handlers.len() <= id as usize {
            self.handlers.resize_with(id as usize + 1, || None);
        }
        id
    }

    /// Returns the identifier of component by its name.
    ///
    /// Panics if component with such name does not exist.
    pub fn lookup_id(&self, name: &str) -> Id {
        match self.state.borrow().lookup_id(name) {
            Some(id) => id,
            None => panic!("Component {} does not exist", name),
        }
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

    /// Creates a new simulation context with specified name.
    ///
    /// Component ids are assigned sequentially starting from 0, the id of already registered name is reused.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dcsim_core::Simulation;
    ///
    /// let mut sim = Simulation::<u32>::new(123);
    /// let comp_ctx = sim.create_context("comp");
    /// assert_eq!(comp_ctx.id(), 0);
    /// assert_eq!(comp_ctx.name(), "comp");
    /// ```
    pub fn create_context<S>(&mut self, name: S) -> SimulationContext<E>
    where
        S: AsRef<str>,
    {
        let name = name.as_ref();
        let id = self.register(name);
        log_engine_debug(self.time(), "Created context", json!({"name": name, "id": id}));
        SimulationContext::new(id, name, self.state.clone())
    }

    /// Registers the event handler for component with specified name, returns the component id.
    pub fn add_handler<S>(&mut self, name: S, handler: HandlerRef<E>) -> Id
    where
        S: AsRef<str>,
    {
        let id = self.register(name.as_ref());
        self.handlers[id as usize] = Some(handler);
        log_engine_debug(self.time(), "Added handler", json!({"name": name.as_ref(), "id": id}));
        id
    }

    /// Removes the event handler of component with specified name.
    ///
    /// Events destined to this component are logged as undelivered afterwards.
    pub fn remove_handler<S>(&mut self, name: S)
    where
        S: AsRef<str>,
    {
        let id = self.lookup_id(name.as_ref());
        self.handlers[id as usize] = None;
        log_engine_debug(self.time(), "Removed handler", json!({"name": name.as_ref(), "id": id}));
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.state.borrow().time()
    }

    /// Performs a single step through the simulation.
    ///
    /// Takes the next event from the queue, advances the simulation time to event time and passes the event to
    /// [`EventHandler::on`](crate::handler::EventHandler::on) of the destination component. Events for components
    /// without handler are logged and discarded.
    ///
    /// Returns `false` if there are no pending events, so no progress can be made.
    pub fn step(&mut self) -> bool {
        let next = self.state.borrow_mut().next_event();
        match next {
            Some(event) => {
                self.deliver(event);
                true
            }
            None => false,
        }
    }

    fn deliver(&self, event: Event<E>) {
        let handler = match self.handlers.get(event.dst as usize) {
            Some(Some(handler)) => handler.clone(),
            _ => {
                log_undelivered_event(&event);
                return;
            }
        };
        if log_enabled!(Trace) {
            let dst_name = self.lookup_name(event.dst);
            trace!(
                target: &dst_name,
                "[{:.3} {} {}] {}",
                event.time,
                get_colored("EVENT", colored::Color::BrightBlack),
                dst_name,
                json!({"data": event.data, "src": self.lookup_name(event.src)})
            );
        }
        handler.borrow_mut().on(event);
    }

    /// Performs up to `step_count` steps, returns `false` if the queue became empty.
    pub fn steps(&mut self, step_count: u64) -> bool {
        (0..step_count).all(|_| self.step())
    }

    /// Steps through the simulation until there are no pending events left.
    pub fn step_until_no_events(&mut self) {
        while self.step() {}
    }

    /// Processes all events with time not greater than `current time + duration`, then advances the simulation
    /// time to this point.
    ///
    /// Returns `true` if there are pending events left.
    pub fn step_for_duration(&mut self, duration: f64) -> bool {
        let end_time = self.time() + duration;
        self.step_until_time(end_time)
    }

    /// Processes all events with time not greater than `time`, then advances the simulation time to it.
    ///
    /// Returns `true` if there are pending events left.
    pub fn step_until_time(&mut self, time: f64) -> bool {
        loop {
            let next_time = self.state.borrow().next_event_time();
            match next_time {
                Some(t) if t <= time => {
                    self.step();
                }
                _ => break,
            }
        }
        if self.time() < time {
            self.state.borrow_mut().set_time(time);
        }
        self.pending_event_count() > 0
    }

    /// Returns a random float in the range _[0, 1)_ from the simulation-wide generator.
    pub fn rand(&mut self) -> f64 {
        self.state.borrow_mut().rand()
    }

    /// Returns a random value in the specified range from the simulation-wide generator.
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.state.borrow_mut().gen_range(range)
    }

    /// Returns the total number of created events, cancelled ones included.
    pub fn event_count(&self) -> u64 {
        self.state.borrow().event_count()
    }

    /// Returns the number of events waiting in the queue.
    pub fn pending_event_count(&self) -> usize {
        self.state.borrow().pending_event_count()
    }

    /// Cancels pending events matching the predicate and returns their number.
    pub fn cancel_events<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&Event<E>) -> bool,
    {
        self.state.borrow_mut().cancel_events(pred)
    }
}
