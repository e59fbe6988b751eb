//! Event-map traits tying keys into a compile-time catalogue.

use strobe_events::EventKind;

/// Compile-time catalogue of event names and payload types.
///
/// Maps are zero-sized marker types with no runtime representation; their
/// entries are expressed as [`HasEvent`] impls. Declare maps with
/// [`event_map!`](crate::event_map).
pub trait EventMap: 'static {}

/// Membership bound tying the key `K` into a map.
///
/// A `TypedTarget<M>` accepts a key only where `M: HasEvent<K>`, which is
/// how listener registration and dispatch are checked against the map.
pub trait HasEvent<K: EventKind>: EventMap {}
