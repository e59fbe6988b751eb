//! Default in-process implementation of the delivery capability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::event::Event;
use crate::options::ListenerOptions;
use crate::target::{EventTarget, Listener};

/// Bookkeeping for one registered listener.
#[derive(Clone)]
struct Registration {
    id: Uuid,
    listener: Arc<dyn Listener>,
    options: ListenerOptions,
    removed: Arc<AtomicBool>,
}

impl Registration {
    fn matches(&self, listener: &Arc<dyn Listener>, capture: bool) -> bool {
        Arc::ptr_eq(&self.listener, listener) && self.options.capture == capture
    }

    fn aborted(&self) -> bool {
        self.options
            .signal
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Synchronous, in-process event target.
///
/// Listeners are invoked in registration order on the dispatching thread.
/// The registry lock is never held across listener invocations, so listeners
/// may register, remove, and dispatch re-entrantly: listeners added during a
/// dispatch first fire on the next one, and listeners removed during a
/// dispatch no longer fire within it.
#[derive(Default)]
pub struct LocalBus {
    registry: Mutex<HashMap<String, Vec<Registration>>>,
}

impl LocalBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registrations currently held under the given name.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.lock().get(name).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Registration>>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clones the live registrations for `name`, pruning any whose abort
    /// token has been cancelled.
    fn snapshot(&self, name: &str) -> Vec<Registration> {
        let mut registry = self.lock();
        let Some(entries) = registry.get_mut(name) else {
            return Vec::new();
        };
        entries.retain(|registration| {
            let aborted = registration.aborted();
            if aborted {
                registration.removed.store(true, Ordering::SeqCst);
                debug!(name, id = %registration.id, "listener aborted by signal");
            }
            !aborted
        });
        entries.clone()
    }

    fn discard(&self, name: &str, id: Uuid) {
        let mut registry = self.lock();
        if let Some(entries) = registry.get_mut(name) {
            entries.retain(|registration| registration.id != id);
            if entries.is_empty() {
                registry.remove(name);
            }
        }
    }
}

impl EventTarget for LocalBus {
    fn register(&self, name: &str, listener: Arc<dyn Listener>, options: ListenerOptions) {
        let mut registry = self.lock();
        let entries = registry.entry(name.to_owned()).or_default();
        if entries
            .iter()
            .any(|registration| registration.matches(&listener, options.capture))
        {
            debug!(name, "listener already registered");
            return;
        }
        let id = Uuid::new_v4();
        debug!(name, %id, once = options.once, passive = options.passive, "listener registered");
        entries.push(Registration {
            id,
            listener,
            options,
            removed: Arc::new(AtomicBool::new(false)),
        });
    }

    fn unregister(&self, name: &str, listener: &Arc<dyn Listener>, options: &ListenerOptions) {
        let mut registry = self.lock();
        let Some(entries) = registry.get_mut(name) else {
            return;
        };
        if let Some(position) = entries
            .iter()
            .position(|registration| registration.matches(listener, options.capture))
        {
            let registration = entries.remove(position);
            registration.removed.store(true, Ordering::SeqCst);
            debug!(name, id = %registration.id, "listener removed");
        }
        if entries.is_empty() {
            registry.remove(name);
        }
    }

    fn dispatch(&self, event: &dyn Event) -> bool {
        let snapshot = self.snapshot(event.name());
        trace!(name = event.name(), listeners = snapshot.len(), "dispatching event");
        for registration in snapshot {
            if registration.removed.load(Ordering::SeqCst) {
                continue;
            }
            if registration.aborted() {
                self.discard(event.name(), registration.id);
                continue;
            }
            if registration.options.once {
                // One-shot listeners leave the registry before they run, so
                // a re-entrant dispatch cannot fire them twice.
                if registration.removed.swap(true, Ordering::SeqCst) {
                    continue;
                }
                self.discard(event.name(), registration.id);
            }
            if registration.options.passive {
                let prevented = event.default_prevented();
                registration.listener.handle_event(event);
                if event.default_prevented() != prevented {
                    event.set_default_prevented(prevented);
                    warn!(
                        name = event.name(),
                        id = %registration.id,
                        "passive listener attempted to cancel event"
                    );
                }
            } else {
                registration.listener.handle_event(event);
            }
        }
        !event.default_prevented()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Signal;
    use std::sync::atomic::AtomicUsize;

    fn counting_listener(counter: &Arc<AtomicUsize>) -> Arc<dyn Listener> {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &dyn Event| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let bus = LocalBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..3_usize {
            let order = Arc::clone(&order);
            bus.register(
                "hello",
                Arc::new(move |_: &dyn Event| {
                    order.lock().expect("order lock").push(tag);
                }),
                ListenerOptions::default(),
            );
        }

        assert!(bus.dispatch(&Signal::new("hello")));
        assert_eq!(*order.lock().expect("order lock"), vec![0, 1, 2]);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let bus = LocalBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(&counter);

        bus.register("hello", Arc::clone(&listener), ListenerOptions::default());
        bus.register("hello", Arc::clone(&listener), ListenerOptions::default());
        assert_eq!(bus.listener_count("hello"), 1);

        let _ = bus.dispatch(&Signal::new("hello"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn capture_flag_scopes_identity() {
        let bus = LocalBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(&counter);

        bus.register("hello", Arc::clone(&listener), ListenerOptions::capture());
        bus.unregister("hello", &listener, &ListenerOptions::default());
        assert_eq!(bus.listener_count("hello"), 1);

        bus.unregister("hello", &listener, &ListenerOptions::capture());
        assert_eq!(bus.listener_count("hello"), 0);
    }

    #[test]
    fn unregister_stops_delivery() {
        let bus = LocalBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(&counter);

        bus.register("hello", Arc::clone(&listener), ListenerOptions::default());
        bus.unregister("hello", &listener, &ListenerOptions::default());

        let _ = bus.dispatch(&Signal::new("hello"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn once_listener_fires_exactly_once() {
        let bus = LocalBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.register("hello", counting_listener(&counter), ListenerOptions::once());

        let _ = bus.dispatch(&Signal::new("hello"));
        let _ = bus.dispatch(&Signal::new("hello"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count("hello"), 0);
    }

    #[test]
    fn cancel_reflects_in_dispatch_result() {
        let bus = LocalBus::new();
        bus.register(
            "submit",
            Arc::new(|event: &dyn Event| event.prevent_default()),
            ListenerOptions::default(),
        );

        assert!(!bus.dispatch(&Signal::cancelable("submit")));
        assert!(bus.dispatch(&Signal::new("submit")));
    }

    #[test]
    fn passive_listener_cannot_cancel() {
        let bus = LocalBus::new();
        bus.register(
            "scroll",
            Arc::new(|event: &dyn Event| event.prevent_default()),
            ListenerOptions::passive(),
        );

        let event = Signal::cancelable("scroll");
        assert!(bus.dispatch(&event));
        assert!(!event.default_prevented());
    }

    #[test]
    fn cancelled_signal_prunes_registration() {
        let bus = LocalBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();
        bus.register(
            "hello",
            counting_listener(&counter),
            ListenerOptions::with_signal(token.clone()),
        );

        token.cancel();
        let _ = bus.dispatch(&Signal::new("hello"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count("hello"), 0);
    }

    #[test]
    fn listeners_removed_mid_dispatch_no_longer_fire() {
        let bus = Arc::new(LocalBus::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let victim = counting_listener(&counter);

        let remover = {
            let bus = Arc::clone(&bus);
            let victim = Arc::clone(&victim);
            Arc::new(move |_: &dyn Event| {
                bus.unregister("hello", &victim, &ListenerOptions::default());
            })
        };
        bus.register("hello", remover, ListenerOptions::default());
        bus.register("hello", victim, ListenerOptions::default());

        let _ = bus.dispatch(&Signal::new("hello"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count("hello"), 1);
    }

    #[test]
    fn listeners_added_mid_dispatch_wait_for_next() {
        let bus = Arc::new(LocalBus::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let registrar = {
            let bus = Arc::clone(&bus);
            let counter = Arc::clone(&counter);
            Arc::new(move |_: &dyn Event| {
                bus.register("hello", counting_listener(&counter), ListenerOptions::default());
            })
        };
        bus.register("hello", registrar, ListenerOptions::once());

        let _ = bus.dispatch(&Signal::new("hello"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let _ = bus.dispatch(&Signal::new("hello"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
