//! Delivery-capability trait implemented by event transports.

use std::sync::Arc;

use crate::event::Event;
use crate::options::ListenerOptions;

/// Erased callback invoked with dispatched events.
///
/// Implemented for any suitable closure; typed front-ends wrap payload-typed
/// callbacks into this form.
pub trait Listener: Send + Sync + 'static {
    /// Invoked once per dispatched event the listener is registered for.
    fn handle_event(&self, event: &dyn Event);
}

impl<F> Listener for F
where
    F: Fn(&dyn Event) + Send + Sync + 'static,
{
    fn handle_event(&self, event: &dyn Event) {
        self(event);
    }
}

/// Delivery capability behind which transports are substituted.
///
/// Implementations store listeners keyed by event name, invoke them
/// synchronously on dispatch, and report whether the event's default action
/// survived. Listener identity is the `Arc` allocation together with the
/// `capture` flag.
pub trait EventTarget: Send + Sync {
    /// Registers a listener under the given event name.
    fn register(&self, name: &str, listener: Arc<dyn Listener>, options: ListenerOptions);

    /// Removes a previously registered listener. Matching is by `Arc`
    /// identity and the `capture` flag; other options are ignored.
    fn unregister(&self, name: &str, listener: &Arc<dyn Listener>, options: &ListenerOptions);

    /// Dispatches the event to all listeners registered under its name,
    /// returning `false` iff a listener cancelled the default action.
    #[must_use]
    fn dispatch(&self, event: &dyn Event) -> bool;
}
