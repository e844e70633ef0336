//! Event sinks: bounded consumers of engine events
//!
//! The engine publishes trades and book updates synchronously inside its
//! critical section, so a sink must never block: bounded enqueue, shed on
//! overflow. The book itself stays the source of truth; delivery is
//! at-most-once from the engine's perspective.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;

use types::trade::Trade;

use crate::events::{BookUpdate, MarketEvent};

/// Consumer of the events one or more engines publish.
///
/// Implementations must return promptly; the engine calls these while
/// holding its write lock.
pub trait EventSink: Send + Sync {
    fn publish_trade(&self, trade: &Trade);
    fn publish_book_update(&self, update: &BookUpdate);
}

/// Sink that discards every event.
///
/// For embedders that only poll snapshots, and for benches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish_trade(&self, _trade: &Trade) {}
    fn publish_book_update(&self, _update: &BookUpdate) {}
}

/// Bounded channel sink.
///
/// Enqueues with `try_send` only. When the channel is full (a slow or
/// stalled consumer) the event is shed and counted; the engine never waits.
pub struct ChannelSink {
    tx: Sender<MarketEvent>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// Create a sink and the receiving half its consumer drains.
    pub fn bounded(capacity: usize) -> (Self, Receiver<MarketEvent>) {
        let (tx, rx) = bounded(capacity);
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Events shed because the channel was full or disconnected.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, event: MarketEvent) {
        if let Err(err) = self.tx.try_send(event) {
            let event = match err {
                TrySendError::Full(event) => event,
                TrySendError::Disconnected(event) => event,
            };
            let total_dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                symbol = %event.symbol(),
                sequence = event.sequence(),
                event_type = event.event_type_label(),
                total_dropped,
                "event channel saturated; shedding event"
            );
        }
    }
}

impl EventSink for ChannelSink {
    fn publish_trade(&self, trade: &Trade) {
        self.push(MarketEvent::Trade(trade.clone()));
    }

    fn publish_book_update(&self, update: &BookUpdate) {
        self.push(MarketEvent::BookUpdate(update.clone()));
    }
}

/// Fan-out sink: forwards every event to all subscribed sinks.
///
/// Subscribers attach at any time and receive every event published after
/// that point. Each subscriber is expected to be bounded and non-blocking,
/// like any other sink; a slow subscriber sheds its own events without
/// affecting the others.
#[derive(Default)]
pub struct BroadcastSink {
    subscribers: RwLock<Vec<Arc<dyn EventSink>>>,
}

impl BroadcastSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subscriber; it starts receiving events immediately.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.subscribers
            .write()
            .expect("broadcast sink poisoned")
            .push(sink);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("broadcast sink poisoned")
            .len()
    }
}

impl EventSink for BroadcastSink {
    fn publish_trade(&self, trade: &Trade) {
        for subscriber in self
            .subscribers
            .read()
            .expect("broadcast sink poisoned")
            .iter()
        {
            subscriber.publish_trade(trade);
        }
    }

    fn publish_book_update(&self, update: &BookUpdate) {
        for subscriber in self
            .subscribers
            .read()
            .expect("broadcast sink poisoned")
            .iter()
        {
            subscriber.publish_book_update(update);
        }
    }
}

/// Sink that appends every event to an in-memory log.
///
/// For tests and diagnostics; unbounded, so not for production fan-out.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MarketEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far, in publication order.
    pub fn events(&self) -> Vec<MarketEvent> {
        self.events.lock().expect("recording sink poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("recording sink poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, event: MarketEvent) {
        self.events
            .lock()
            .expect("recording sink poisoned")
            .push(event);
    }
}

impl EventSink for RecordingSink {
    fn publish_trade(&self, trade: &Trade) {
        self.push(MarketEvent::Trade(trade.clone()));
    }

    fn publish_book_update(&self, update: &BookUpdate) {
        self.push(MarketEvent::BookUpdate(update.clone()));
    }
}
