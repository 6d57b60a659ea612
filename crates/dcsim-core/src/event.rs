//! Simulation events.

use serde::Serialize;

use crate::component::Id;

/// Identifier of simulation event.
pub type EventId = u64;

/// Trait for event payloads.
///
/// Implemented for every serializable type, so that delivered events can be traced in logs.
pub trait EventData: Serialize + 'static {}

impl<T: Serialize + 'static> EventData for T {}

/// Representation of simulation event.
pub struct Event<E> {
    /// Unique event identifier, also defines the order of events with equal time.
    pub id: EventId,
    /// Time of event occurrence.
    pub time: f64,
    /// Identifier of event source.
    pub src: Id,
    /// Identifier of event destination.
    pub dst: Id,
    /// Event payload.
    pub data: E,
}
