//! Async observation of dispatch activity.
//!
//! A [`DispatchTap`] is an ordinary listener: attach it to a target under
//! the names of interest and it fans a [`DispatchRecord`] out to async
//! subscribers for every event it observes. A bounded replay ring lets
//! subscribers that reconnect with a last-seen sequence number catch up on
//! records they missed. The tap observes dispatches; it adds no delivery
//! semantics of its own.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::event::Event;
use crate::target::Listener;

/// Default capacity of the replay ring and broadcast channel.
pub const DEFAULT_TAP_CAPACITY: usize = 1_024;

/// One observed dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Sequence number, monotonically increasing from 1 per tap.
    pub seq: u64,
    /// Observation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Intrinsic name of the observed event.
    pub name: String,
}

/// Listener that records observed dispatches and fans them out to
/// subscribers.
pub struct DispatchTap {
    sender: broadcast::Sender<DispatchRecord>,
    replay: Mutex<VecDeque<DispatchRecord>>,
    capacity: usize,
    next_seq: AtomicU64,
}

impl DispatchTap {
    /// Creates a tap with a custom replay capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "tap capacity must be positive");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            replay: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Creates a tap with the default replay capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TAP_CAPACITY)
    }

    /// Subscribes to observed dispatches, replaying any buffered records
    /// with a sequence number greater than `since`.
    #[must_use]
    pub fn subscribe(&self, since: Option<u64>) -> TapStream {
        // Subscribe before snapshotting the ring so no record falls between
        // the two; overlap is filtered by sequence number.
        let receiver = self.sender.subscribe();
        let last_seen = since.unwrap_or(0);
        let backlog = since.map_or_else(VecDeque::new, |seq| {
            self.lock_replay()
                .iter()
                .filter(|record| record.seq > seq)
                .cloned()
                .collect()
        });
        TapStream {
            backlog,
            receiver,
            last_seen,
        }
    }

    /// Last sequence number observed, if any.
    #[must_use]
    pub fn last_seq(&self) -> Option<u64> {
        self.lock_replay().back().map(|record| record.seq)
    }

    /// Buffered records with a sequence number greater than `seq`.
    #[must_use]
    pub fn backlog_since(&self, seq: u64) -> Vec<DispatchRecord> {
        self.lock_replay()
            .iter()
            .filter(|record| record.seq > seq)
            .cloned()
            .collect()
    }

    fn lock_replay(&self) -> MutexGuard<'_, VecDeque<DispatchRecord>> {
        self.replay.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DispatchTap {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for DispatchTap {
    fn handle_event(&self, event: &dyn Event) {
        let record = DispatchRecord {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            name: event.name().to_owned(),
        };
        {
            let mut replay = self.lock_replay();
            if replay.len() == self.capacity {
                let _ = replay.pop_front();
            }
            replay.push_back(record.clone());
        }
        let _ = self.sender.send(record);
    }
}

/// Subscriber handle yielding records from the replay backlog first, then
/// from the live channel.
pub struct TapStream {
    backlog: VecDeque<DispatchRecord>,
    receiver: broadcast::Receiver<DispatchRecord>,
    last_seen: u64,
}

impl TapStream {
    /// Receives the next record, skipping any already seen.
    pub async fn next(&mut self) -> Option<DispatchRecord> {
        loop {
            if let Some(record) = self.backlog.pop_front() {
                if record.seq <= self.last_seen {
                    continue;
                }
                self.last_seen = record.seq;
                return Some(record);
            }
            match self.receiver.recv().await {
                Ok(record) => {
                    if record.seq <= self.last_seen {
                        continue;
                    }
                    self.last_seen = record.seq;
                    return Some(record);
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "tap subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Converts the handle into a [`Stream`] of records.
    #[must_use]
    pub fn into_stream(self) -> impl Stream<Item = DispatchRecord> + Send {
        let Self {
            backlog,
            receiver,
            mut last_seen,
        } = self;
        let live = BroadcastStream::new(receiver).filter_map(|item| item.ok());
        tokio_stream::iter(backlog)
            .chain(live)
            .filter_map(move |record| {
                if record.seq <= last_seen {
                    None
                } else {
                    last_seen = record.seq;
                    Some(record)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Signal;
    use crate::local::LocalBus;
    use crate::options::ListenerOptions;
    use crate::target::EventTarget;
    use std::sync::Arc;

    fn tapped_bus() -> (LocalBus, Arc<DispatchTap>) {
        let bus = LocalBus::new();
        let tap = Arc::new(DispatchTap::with_capacity(8));
        bus.register("time", Arc::clone(&tap) as Arc<dyn Listener>, ListenerOptions::default());
        bus.register("hello", Arc::clone(&tap) as Arc<dyn Listener>, ListenerOptions::default());
        (bus, tap)
    }

    #[tokio::test]
    async fn records_carry_sequence_and_name() {
        let (bus, tap) = tapped_bus();
        let mut stream = tap.subscribe(None);

        let _ = bus.dispatch(&Signal::new("time"));
        let _ = bus.dispatch(&Signal::new("hello"));

        let first = stream.next().await.expect("first record");
        assert_eq!((first.seq, first.name.as_str()), (1, "time"));
        let second = stream.next().await.expect("second record");
        assert_eq!((second.seq, second.name.as_str()), (2, "hello"));
        assert_eq!(tap.last_seq(), Some(2));
    }

    #[tokio::test]
    async fn subscribe_replays_backlog_after_sequence() {
        let (bus, tap) = tapped_bus();
        for _ in 0..3 {
            let _ = bus.dispatch(&Signal::new("time"));
        }

        let mut stream = tap.subscribe(Some(1));
        assert_eq!(stream.next().await.expect("record").seq, 2);
        assert_eq!(stream.next().await.expect("record").seq, 3);
        assert_eq!(tap.backlog_since(2).len(), 1);
    }

    #[tokio::test]
    async fn into_stream_yields_live_records() {
        let (bus, tap) = tapped_bus();
        let stream = tap.subscribe(None).into_stream();
        tokio::pin!(stream);

        let _ = bus.dispatch(&Signal::new("time"));
        let record = stream.next().await.expect("streamed record");
        assert_eq!(record.name, "time");
    }
}
