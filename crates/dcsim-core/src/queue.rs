//! Pending events ordered by time and creation order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::event::{Event, EventId};

#[derive(Clone, Copy, Debug)]
struct Timestamp(f64);

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Event ids grow monotonically, so events with equal time leave the queue in creation order.
pub(crate) struct EventQueue<E> {
    events: BTreeMap<(Timestamp, EventId), Event<E>>,
    times: HashMap<EventId, Timestamp>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            times: HashMap::new(),
        }
    }

    pub fn push(&mut self, event: Event<E>) {
        let time = Timestamp(event.time);
        self.times.insert(event.id, time);
        self.events.insert((time, event.id), event);
    }

    pub fn pop(&mut self) -> Option<Event<E>> {
        let key = *self.events.keys().next()?;
        let event = self.events.remove(&key)?;
        self.times.remove(&event.id);
        Some(event)
    }

    pub fn peek(&self) -> Option<&Event<E>> {
        self.events.values().next()
    }

    /// Removes pending event, returns `None` if it was already delivered or removed.
    pub fn remove(&mut self, id: EventId) -> Option<Event<E>> {
        let time = self.times.remove(&id)?;
        self.events.remove(&(time, id))
    }

    /// Removes all pending events matching the predicate and returns their number.
    pub fn remove_matching<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&Event<E>) -> bool,
    {
        let ids: Vec<EventId> = self.events.values().filter(|e| pred(e)).map(|e| e.id).collect();
        for id in ids.iter() {
            self.remove(*id);
        }
        ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event<E>> {
        self.events.values()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: EventId, time: f64) -> Event<u32> {
        Event {
            id,
            time,
            src: 0,
            dst: 0,
            data: id as u32,
        }
    }

    #[test]
    fn test_order_by_time_then_id() {
        let mut queue = EventQueue::new();
        queue.push(event(0, 2.));
        queue.push(event(1, 1.));
        queue.push(event(2, 2.));
        queue.push(event(3, 0.5));
        let order: Vec<EventId> = std::iter::from_fn(|| queue.pop()).map(|e| e.id).collect();
        assert_eq!(order, vec![3, 1, 0, 2]);
    }

    #[test]
    fn test_remove() {
        let mut queue = EventQueue::new();
        queue.push(event(0, 1.));
        queue.push(event(1, 1.));
        queue.push(event(2, 3.));
        assert_eq!(queue.remove(0).map(|e| e.id), Some(0));
        assert!(queue.remove(0).is_none());
        assert_eq!(queue.remove_matching(|e| e.time > 2.), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek().map(|e| e.id), Some(1));
    }
}
