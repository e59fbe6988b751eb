//! Typed registration and dispatch facade.

use std::marker::PhantomData;
use std::sync::Arc;

use strobe_events::{Event, EventKind, EventTarget, Listener, ListenerOptions, LocalBus};
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};
use crate::keys::{EventMap, HasEvent};
use crate::policy::DispatchPolicy;

/// Statically-typed view over an [`EventTarget`].
///
/// The map parameter `M` constrains which keys may be used for registration
/// and dispatch; it has no runtime representation. The facade forwards every
/// operation verbatim to the backing target and also implements
/// [`EventTarget`] itself, so code written against the untyped capability
/// keeps working unchanged.
pub struct TypedTarget<M: EventMap, T: EventTarget = LocalBus> {
    inner: T,
    policy: DispatchPolicy,
    _map: PhantomData<fn() -> M>,
}

impl<M: EventMap> TypedTarget<M, LocalBus> {
    /// Creates a facade over an owned [`LocalBus`] with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_target(LocalBus::new())
    }
}

impl<M: EventMap> Default for TypedTarget<M, LocalBus> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: EventMap, T: EventTarget> TypedTarget<M, T> {
    /// Wraps an existing backing target with the default policy.
    #[must_use]
    pub fn with_target(inner: T) -> Self {
        Self::with_policy(inner, DispatchPolicy::default())
    }

    /// Wraps an existing backing target with an explicit policy.
    #[must_use]
    pub fn with_policy(inner: T, policy: DispatchPolicy) -> Self {
        Self {
            inner,
            policy,
            _map: PhantomData,
        }
    }

    /// Active dispatch policy.
    #[must_use]
    pub const fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Borrows the backing target.
    #[must_use]
    pub const fn target(&self) -> &T {
        &self.inner
    }

    /// Consumes the facade, returning the backing target.
    #[must_use]
    pub fn into_target(self) -> T {
        self.inner
    }

    /// Registers a payload-typed callback under the key `K`. The returned
    /// handle is the registration's identity; keep it if the listener will
    /// ever be removed.
    #[must_use]
    pub fn add_listener<K>(
        &self,
        callback: impl Fn(&K::Payload) + Send + Sync + 'static,
    ) -> ListenerHandle<K>
    where
        K: EventKind,
        M: HasEvent<K>,
    {
        self.add_listener_with::<K>(callback, ListenerOptions::default())
    }

    /// Registers a payload-typed callback under the key `K` with explicit
    /// options.
    #[must_use]
    pub fn add_listener_with<K>(
        &self,
        callback: impl Fn(&K::Payload) + Send + Sync + 'static,
        options: ListenerOptions,
    ) -> ListenerHandle<K>
    where
        K: EventKind,
        M: HasEvent<K>,
    {
        let listener: Arc<dyn Listener> = Arc::new(TypedListener::<K::Payload, _> {
            callback,
            _payload: PhantomData,
        });
        self.add_raw_listener::<K>(listener, options)
    }

    /// Registers a base-event callback under the key `K`. The listener
    /// receives the erased event rather than the mapped payload type.
    #[must_use]
    pub fn add_raw_listener<K>(
        &self,
        listener: Arc<dyn Listener>,
        options: ListenerOptions,
    ) -> ListenerHandle<K>
    where
        K: EventKind,
        M: HasEvent<K>,
    {
        let capture = options.capture;
        self.inner.register(K::NAME, Arc::clone(&listener), options);
        ListenerHandle {
            listener,
            capture,
            _key: PhantomData,
        }
    }

    /// Removes a listener previously registered under the key `K`.
    pub fn remove_listener<K>(&self, handle: &ListenerHandle<K>)
    where
        K: EventKind,
        M: HasEvent<K>,
    {
        let options = ListenerOptions {
            capture: handle.capture,
            ..ListenerOptions::default()
        };
        self.inner.unregister(K::NAME, &handle.listener, &options);
    }

    /// Dispatches a payload under the key `K`, returning the backing
    /// target's verdict: `false` iff a listener cancelled the default
    /// action.
    ///
    /// By default the key/payload name agreement is trusted to the type
    /// system; with [`DispatchPolicy::strict`] it is re-checked here.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NameMismatch`] when strict mode is active
    /// and the payload's intrinsic name differs from `K::NAME`.
    pub fn dispatch_typed<K>(&self, event: &K::Payload) -> DispatchResult<bool>
    where
        K: EventKind,
        M: HasEvent<K>,
    {
        if self.policy.verify_names && event.name() != K::NAME {
            return Err(DispatchError::NameMismatch {
                expected: K::NAME,
                found: event.name().to_owned(),
            });
        }
        Ok(self.inner.dispatch(event))
    }
}

/// Pass-through impl keeping the facade a drop-in replacement for its
/// backing target. The untyped `dispatch` survives for compatibility;
/// prefer [`TypedTarget::dispatch_typed`].
impl<M: EventMap, T: EventTarget> EventTarget for TypedTarget<M, T> {
    fn register(&self, name: &str, listener: Arc<dyn Listener>, options: ListenerOptions) {
        self.inner.register(name, listener, options);
    }

    fn unregister(&self, name: &str, listener: &Arc<dyn Listener>, options: &ListenerOptions) {
        self.inner.unregister(name, listener, options);
    }

    fn dispatch(&self, event: &dyn Event) -> bool {
        self.inner.dispatch(event)
    }
}

/// Identity of one typed registration, used for removal.
///
/// The key parameter keeps removal as strictly typed as registration: a
/// handle for one key cannot remove a listener registered under another.
pub struct ListenerHandle<K: EventKind> {
    listener: Arc<dyn Listener>,
    capture: bool,
    _key: PhantomData<fn() -> K>,
}

impl<K: EventKind> Clone for ListenerHandle<K> {
    fn clone(&self) -> Self {
        Self {
            listener: Arc::clone(&self.listener),
            capture: self.capture,
            _key: PhantomData,
        }
    }
}

impl<K: EventKind> std::fmt::Debug for ListenerHandle<K> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ListenerHandle")
            .field("name", &K::NAME)
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

/// Adapter narrowing the erased event back to the mapped payload type.
struct TypedListener<P, F> {
    callback: F,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F> Listener for TypedListener<P, F>
where
    P: Event,
    F: Fn(&P) + Send + Sync + 'static,
{
    fn handle_event(&self, event: &dyn Event) {
        event.as_any().downcast_ref::<P>().map_or_else(
            || debug!(name = event.name(), "payload type did not match listener"),
            |payload| (self.callback)(payload),
        );
    }
}
