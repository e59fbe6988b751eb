//! Listener fixtures and tracing helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use strobe_events::{Detail, Event, Listener};
use tracing_subscriber::EnvFilter;

/// Installs a process-wide tracing subscriber honouring `RUST_LOG`.
/// Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Listener that counts its invocations.
#[derive(Debug, Default)]
pub struct CountingListener {
    count: AtomicUsize,
}

impl CountingListener {
    /// Creates a listener with a zero count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invocations observed so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Listener for CountingListener {
    fn handle_event(&self, _event: &dyn Event) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Listener that collects the detail values of [`Detail`] events.
///
/// Events carrying a different payload type are counted but not collected.
#[derive(Debug, Default)]
pub struct CollectingListener<T> {
    values: Mutex<Vec<T>>,
    skipped: AtomicUsize,
}

impl<T> CollectingListener<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Mutex::new(Vec::new()),
            skipped: AtomicUsize::new(0),
        }
    }

    /// Detail values observed so far, in dispatch order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of observed events that carried a different payload type.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }
}

impl<T> Listener for CollectingListener<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn handle_event(&self, event: &dyn Event) {
        event.as_any().downcast_ref::<Detail<T>>().map_or_else(
            || {
                let _ = self.skipped.fetch_add(1, Ordering::SeqCst);
            },
            |payload| {
                self.values
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(payload.detail().clone());
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strobe_events::{EventTarget, ListenerOptions, LocalBus, Signal};

    #[test]
    fn counting_listener_counts_dispatches() {
        let bus = LocalBus::new();
        let counter = Arc::new(CountingListener::new());
        bus.register(
            "hello",
            Arc::clone(&counter) as Arc<dyn Listener>,
            ListenerOptions::default(),
        );

        let _ = bus.dispatch(&Signal::new("hello"));
        let _ = bus.dispatch(&Signal::new("hello"));
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn collecting_listener_keeps_details_in_order() {
        let bus = LocalBus::new();
        let collector = Arc::new(CollectingListener::<u64>::new());
        bus.register(
            "time",
            Arc::clone(&collector) as Arc<dyn Listener>,
            ListenerOptions::default(),
        );

        let _ = bus.dispatch(&Detail::new("time", 1_u64));
        let _ = bus.dispatch(&Detail::new("time", 2_u64));
        let _ = bus.dispatch(&Signal::new("time"));

        assert_eq!(collector.values(), vec![1, 2]);
        assert_eq!(collector.skipped(), 1);
    }
}
