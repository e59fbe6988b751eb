//! In-process event delivery primitives for the Strobe workspace.
//!
//! The crate defines the base event capability ([`Event`]), the shipped
//! payload types ([`Signal`] and [`Detail`]), the delivery-capability trait
//! ([`EventTarget`]) behind which alternate transports can be substituted,
//! and the default synchronous implementation ([`LocalBus`]). Dispatch
//! activity can be observed as an async stream through [`DispatchTap`].
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

pub mod event;
pub mod local;
pub mod options;
pub mod tap;
pub mod target;

pub use event::{Detail, Event, EventKind, Signal};
pub use local::LocalBus;
pub use options::ListenerOptions;
pub use tap::{DispatchRecord, DispatchTap, TapStream};
pub use target::{EventTarget, Listener};
