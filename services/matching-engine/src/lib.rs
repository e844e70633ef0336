//! Continuous double-auction matching core
//!
//! Per-symbol order books accepting limit and market orders, matched under
//! strict price-time priority, with trades and book deltas published to a
//! bounded event sink.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced; ties broken FIFO by arrival
//! - Execution price is always the maker's resting price
//! - Conservation of quantity: trades never exceed submitted quantity
//! - Event sequence numbers per engine are strictly increasing
//! - Market orders never rest; leftovers are reported, not kept

pub mod book;
pub mod engine;
pub mod events;
pub mod matching;
pub mod registry;
pub mod sink;

pub use engine::{BookSnapshot, DepthLevel, MatchingEngine, PlaceOutcome, PlaceStatus};
pub use events::{BookUpdate, MarketEvent};
pub use registry::ExchangeRegistry;
pub use sink::{BroadcastSink, ChannelSink, EventSink, NullSink, RecordingSink};
