//! Event structures published by the matching engine
//!
//! Every event carries the emitting engine's symbol and a strictly
//! increasing sequence number, which together define a total order on the
//! engine's observable actions.

use serde::{Deserialize, Serialize};

use types::ids::MarketId;
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

/// Delta announcing a change to the aggregate quantity at one (side, price).
///
/// `aggregate_quantity == 0` means the level was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub sequence: u64,
    pub symbol: MarketId,
    pub side: Side,
    pub price: Price,
    pub aggregate_quantity: Quantity,
}

impl BookUpdate {
    /// Whether this update announces the removal of the level.
    pub fn is_removal(&self) -> bool {
        self.aggregate_quantity.is_zero()
    }
}

/// Envelope over everything an engine publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MarketEvent {
    Trade(Trade),
    BookUpdate(BookUpdate),
}

impl MarketEvent {
    /// Engine-assigned sequence number.
    pub fn sequence(&self) -> u64 {
        match self {
            MarketEvent::Trade(trade) => trade.sequence,
            MarketEvent::BookUpdate(update) => update.sequence,
        }
    }

    /// Symbol of the emitting engine.
    pub fn symbol(&self) -> &MarketId {
        match self {
            MarketEvent::Trade(trade) => &trade.symbol,
            MarketEvent::BookUpdate(update) => &update.symbol,
        }
    }

    /// Event type as a string label for logging.
    pub fn event_type_label(&self) -> &'static str {
        match self {
            MarketEvent::Trade(_) => "Trade",
            MarketEvent::BookUpdate(_) => "BookUpdate",
        }
    }
}

/// Ordering by sequence number for deterministic downstream processing.
impl Ord for MarketEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sequence().cmp(&other.sequence())
    }
}

impl PartialOrd for MarketEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
