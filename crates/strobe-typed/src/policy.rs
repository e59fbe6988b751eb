//! Dispatch-time verification policy.

use serde::{Deserialize, Serialize};

/// Controls how much the facade re-checks at runtime.
///
/// The default trusts the type system and performs no dispatch-time
/// validation. Strict mode re-checks that the payload's intrinsic name
/// matches the dispatch key, covering payloads constructed dynamically with
/// a hand-written name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchPolicy {
    /// Verify the payload name against the dispatch key on every typed
    /// dispatch.
    pub verify_names: bool,
}

impl DispatchPolicy {
    /// Policy that trusts the type system (the default).
    #[must_use]
    pub const fn trusting() -> Self {
        Self {
            verify_names: false,
        }
    }

    /// Policy that re-checks payload names at dispatch time.
    #[must_use]
    pub const fn strict() -> Self {
        Self { verify_names: true }
    }
}
