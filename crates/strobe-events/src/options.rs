//! Listener registration options.

use tokio_util::sync::CancellationToken;

/// Options accepted when registering a listener.
///
/// The flags mirror the registration surface of conventional event targets.
/// `capture` participates in registration identity only; the local bus has a
/// single target and no phase tree.
#[derive(Debug, Clone, Default)]
pub struct ListenerOptions {
    /// Remove the listener after its first invocation.
    pub once: bool,
    /// Forbid the listener from cancelling the event's default action.
    pub passive: bool,
    /// Identity flag kept for parity with phase-aware targets.
    pub capture: bool,
    /// External token that de-registers the listener once cancelled.
    pub signal: Option<CancellationToken>,
}

impl ListenerOptions {
    /// Options requesting one-shot delivery.
    #[must_use]
    pub fn once() -> Self {
        Self {
            once: true,
            ..Self::default()
        }
    }

    /// Options marking the listener passive.
    #[must_use]
    pub fn passive() -> Self {
        Self {
            passive: true,
            ..Self::default()
        }
    }

    /// Options registering under the capture identity flag.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            capture: true,
            ..Self::default()
        }
    }

    /// Options tied to an external cancellation token.
    #[must_use]
    pub fn with_signal(signal: CancellationToken) -> Self {
        Self {
            signal: Some(signal),
            ..Self::default()
        }
    }
}
