//! Statically-typed facade over the event delivery capability.
//!
//! An event map associates event-name keys with payload types at compile
//! time; [`TypedTarget`] then checks listener callbacks and dispatch calls
//! against the map with no runtime cost in the typed layer. Maps are
//! declared with [`event_map!`], and the facade remains a drop-in
//! [`EventTarget`](strobe_events::EventTarget) for code written against the
//! untyped capability.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

pub mod error;
pub mod facade;
pub mod keys;
mod macros;
pub mod policy;

pub use error::{DispatchError, DispatchResult};
pub use facade::{ListenerHandle, TypedTarget};
pub use keys::{EventMap, HasEvent};
pub use policy::DispatchPolicy;

pub use strobe_events::{
    Detail, Event, EventKind, EventTarget, Listener, ListenerOptions, LocalBus, Signal,
};
