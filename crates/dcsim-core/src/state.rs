use std::collections::HashMap;

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::component::Id;
use crate::event::{Event, EventData, EventId};
use crate::log::log_incorrect_event;
use crate::queue::EventQueue;

/// Epsilon to compare floating point values for equality.
pub const EPSILON: f64 = 1e-12;

/// State shared by the simulation and all contexts: clock, random generator, pending events and component names.
pub(crate) struct SimulationState<E> {
    clock: f64,
    rand: Pcg64,
    queue: EventQueue<E>,
    next_event_id: EventId,
    names: Vec<String>,
    ids: HashMap<String, Id>,
}

impl<E: EventData> SimulationState<E> {
    pub fn new(seed: u64) -> Self {
        Self {
            clock: 0.,
            rand: Pcg64::seed_from_u64(seed),
            queue: EventQueue::new(),
            next_event_id: 0,
            names: Vec::new(),
            ids: HashMap::new(),
        }
    }

    pub fn time(&self) -> f64 {
        self.clock
    }

    pub fn set_time(&mut self, time: f64) {
        self.clock = time;
    }

    pub fn rand(&mut self) -> f64 {
        self.rand.gen_range(0.0..1.0)
    }

    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rand.gen_range(range)
    }

    /// Returns id of the component, registering the name on first use.
    pub fn register(&mut self, name: &str) -> Id {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as Id;
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    pub fn lookup_id(&self, name: &str) -> Option<Id> {
        self.ids.get(name).copied()
    }

    pub fn lookup_name(&self, id: Id) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn add_event(&mut self, data: E, src: Id, dst: Id, delay: f64) -> EventId {
        let event = Event {
            id: self.next_event_id,
            time: self.clock + delay.max(0.),
            src,
            dst,
            data,
        };
        if delay < -EPSILON {
            log_incorrect_event(&event, &format!("negative delay {}", delay));
            panic!("Event delay is negative! It is not allowed to add events from the past.");
        }
        self.next_event_id += 1;
        let id = event.id;
        self.queue.push(event);
        id
    }

    pub fn next_event(&mut self) -> Option<Event<E>> {
        let event = self.queue.pop()?;
        self.clock = event.time;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<f64> {
        self.queue.peek().map(|e| e.time)
    }

    pub fn cancel_event(&mut self, id: EventId) {
        self.queue.remove(id);
    }

    pub fn cancel_events<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&Event<E>) -> bool,
    {
        self.queue.remove_matching(pred)
    }

    pub fn has_pending_event<F>(&self, pred: F) -> bool
    where
        F: Fn(&Event<E>) -> bool,
    {
        self.queue.iter().any(pred)
    }

    pub fn pending_event_count(&self) -> usize {
        self.queue.len()
    }

    pub fn event_count(&self) -> u64 {
        self.next_event_id
    }
}
