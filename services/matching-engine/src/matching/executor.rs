//! Trade and book-delta emission
//!
//! `MatchRecorder` stamps the engine's shared sequence counter onto every
//! event produced during one operation and hands each to the sink as it is
//! recorded, so consumers observe trades and book updates in exactly the
//! order the matching loop produced them.

use types::ids::{MarketId, OrderId, TradeId};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

use crate::events::BookUpdate;
use crate::sink::EventSink;

/// Per-operation event recorder.
///
/// Borrows the engine's sequence and trade-id counters for the duration of
/// one `place` or `cancel` call; trades are also accumulated for the
/// caller's response.
pub(crate) struct MatchRecorder<'a> {
    symbol: &'a MarketId,
    sequence: &'a mut u64,
    next_trade_id: &'a mut u64,
    sink: &'a dyn EventSink,
    trades: Vec<Trade>,
}

impl<'a> MatchRecorder<'a> {
    pub fn new(
        symbol: &'a MarketId,
        sequence: &'a mut u64,
        next_trade_id: &'a mut u64,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            symbol,
            sequence,
            next_trade_id,
            sink,
            trades: Vec::new(),
        }
    }

    fn next_sequence(&mut self) -> u64 {
        *self.sequence += 1;
        *self.sequence
    }

    /// Mint and publish a trade at the maker's resting price.
    pub fn record_trade(
        &mut self,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        taker_side: Side,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) {
        *self.next_trade_id += 1;
        let trade = Trade::new(
            TradeId::new(*self.next_trade_id),
            self.next_sequence(),
            self.symbol.clone(),
            maker_order_id,
            taker_order_id,
            taker_side,
            price,
            quantity,
            executed_at,
        );
        self.sink.publish_trade(&trade);
        self.trades.push(trade);
    }

    /// Publish the new aggregate quantity at a (side, price); zero announces
    /// the level's removal.
    pub fn record_book_update(&mut self, side: Side, price: Price, aggregate_quantity: Quantity) {
        let update = BookUpdate {
            sequence: self.next_sequence(),
            symbol: self.symbol.clone(),
            side,
            price,
            aggregate_quantity,
        };
        self.sink.publish_book_update(&update);
    }

    /// Finish the operation, yielding the accumulated trades.
    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }
}
