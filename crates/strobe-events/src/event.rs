//! Base event capability and the payload types shipped with it.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Base capability implemented by every dispatchable payload.
///
/// An event knows its intrinsic name, whether listeners may cancel it, and
/// whether a listener has done so. Cancellation state uses interior
/// mutability so listeners can cancel through the shared reference they are
/// handed during dispatch.
pub trait Event: Send + Sync + 'static {
    /// Intrinsic name carried by the payload.
    fn name(&self) -> &str;

    /// Whether listeners may cancel the event's default action.
    fn cancelable(&self) -> bool;

    /// Whether a listener has cancelled the default action.
    fn default_prevented(&self) -> bool;

    /// Overwrites the cancellation flag. Dispatchers use this to roll back
    /// cancellation attempts from passive listeners; most callers want
    /// [`Event::prevent_default`] instead.
    fn set_default_prevented(&self, prevented: bool);

    /// Upcast used by typed listeners to recover the concrete payload.
    fn as_any(&self) -> &dyn Any;

    /// Cancels the default action. No-op for non-cancelable events.
    fn prevent_default(&self) {
        if self.cancelable() {
            self.set_default_prevented(true);
        }
    }
}

/// Compile-time key naming one event category and its payload type.
///
/// Keys are zero-sized types; the association between the runtime name and
/// the payload type exists only in the type system.
pub trait EventKind: 'static {
    /// Event name the key stands for.
    const NAME: &'static str;

    /// Payload type delivered for this key.
    type Payload: Event;
}

/// Signal-only event carrying no data beyond its own identity.
#[derive(Debug, Serialize, Deserialize)]
pub struct Signal {
    name: String,
    cancelable: bool,
    #[serde(skip)]
    prevented: AtomicBool,
}

impl Signal {
    /// Creates a non-cancelable signal with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cancelable: false,
            prevented: AtomicBool::new(false),
        }
    }

    /// Creates a cancelable signal with the given name.
    #[must_use]
    pub fn cancelable(name: impl Into<String>) -> Self {
        Self {
            cancelable: true,
            ..Self::new(name)
        }
    }

    /// Creates a signal named after the key `K`, guaranteeing the name and
    /// key agree.
    #[must_use]
    pub fn keyed<K>() -> Self
    where
        K: EventKind<Payload = Self>,
    {
        Self::new(K::NAME)
    }

    /// Creates a cancelable signal named after the key `K`.
    #[must_use]
    pub fn keyed_cancelable<K>() -> Self
    where
        K: EventKind<Payload = Self>,
    {
        Self::cancelable(K::NAME)
    }
}

impl Clone for Signal {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            cancelable: self.cancelable,
            prevented: AtomicBool::new(self.prevented.load(Ordering::SeqCst)),
        }
    }
}

// Equality covers identity, not transient cancellation state.
impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.cancelable == other.cancelable
    }
}

impl Eq for Signal {}

impl Event for Signal {
    fn name(&self) -> &str {
        &self.name
    }

    fn cancelable(&self) -> bool {
        self.cancelable
    }

    fn default_prevented(&self) -> bool {
        self.prevented.load(Ordering::SeqCst)
    }

    fn set_default_prevented(&self, prevented: bool) {
        self.prevented.store(prevented, Ordering::SeqCst);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Event carrying an arbitrary attached detail value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detail<T> {
    #[serde(flatten)]
    base: Signal,
    detail: T,
}

impl<T> Detail<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a non-cancelable event with the given name and detail value.
    #[must_use]
    pub fn new(name: impl Into<String>, detail: T) -> Self {
        Self {
            base: Signal::new(name),
            detail,
        }
    }

    /// Creates a cancelable event with the given name and detail value.
    #[must_use]
    pub fn cancelable(name: impl Into<String>, detail: T) -> Self {
        Self {
            base: Signal::cancelable(name),
            detail,
        }
    }

    /// Creates an event named after the key `K`, guaranteeing the name and
    /// key agree.
    #[must_use]
    pub fn keyed<K>(detail: T) -> Self
    where
        K: EventKind<Payload = Self>,
    {
        Self::new(K::NAME, detail)
    }

    /// Creates a cancelable event named after the key `K`.
    #[must_use]
    pub fn keyed_cancelable<K>(detail: T) -> Self
    where
        K: EventKind<Payload = Self>,
    {
        Self::cancelable(K::NAME, detail)
    }

    /// Borrows the attached detail value.
    #[must_use]
    pub const fn detail(&self) -> &T {
        &self.detail
    }

    /// Consumes the event, returning the attached detail value.
    #[must_use]
    pub fn into_detail(self) -> T {
        self.detail
    }
}

impl<T> Event for Detail<T>
where
    T: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.base.name()
    }

    fn cancelable(&self) -> bool {
        Event::cancelable(&self.base)
    }

    fn default_prevented(&self) -> bool {
        self.base.default_prevented()
    }

    fn set_default_prevented(&self, prevented: bool) {
        self.base.set_default_prevented(prevented);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
