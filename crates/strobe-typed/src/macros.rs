//! Declarative event-map definition.

/// Declares an event map: a marker type, one zero-sized key type per entry,
/// and the membership impls tying them together.
///
/// ```
/// use strobe_typed::{event_map, Detail, Signal};
///
/// event_map! {
///     /// Events emitted by the wall clock.
///     pub map ClockEvents {
///         /// Periodic tick carrying epoch milliseconds.
///         "time" => Tick: Detail<u64>,
///         /// Signal-only greeting.
///         "hello" => Hello: Signal,
///     }
/// }
/// ```
#[macro_export]
macro_rules! event_map {
    (
        $(#[$map_meta:meta])*
        $vis:vis map $map:ident {
            $(
                $(#[$key_meta:meta])*
                $name:literal => $key:ident : $payload:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$map_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $map;

        impl $crate::EventMap for $map {}

        $(
            $(#[$key_meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            $vis struct $key;

            impl $crate::EventKind for $key {
                const NAME: &'static str = $name;
                type Payload = $payload;
            }

            impl $crate::HasEvent<$key> for $map {}
        )+
    };
}
