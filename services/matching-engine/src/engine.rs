//! Matching engine core
//!
//! One engine per symbol, run as a serialized state machine behind a
//! read-write lock: `place` and `cancel` take the write guard, `snapshot`
//! and `last_price` the read guard. Nothing suspends while the lock is
//! held; the only in-lock side effect is non-blocking sink publication.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use types::errors::EngineError;
use types::ids::{MarketId, OrderId, OwnerId};
use types::numeric::{Price, Quantity};
use types::order::{OrderKind, OrderRequest, Side};
use types::trade::Trade;

use crate::book::{AskBook, BidBook, OrderIndex, RestingOrder};
use crate::matching::crossing;
use crate::matching::executor::MatchRecorder;
use crate::sink::EventSink;

/// Where a submitted order ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlaceStatus {
    /// The full quantity traded.
    Filled,
    /// A limit residual is resting on the book.
    Resting,
    /// A market order ran out of liquidity; the leftover was discarded,
    /// never rested.
    Unfilled { leftover: Quantity },
}

/// Result of a successful `place` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOutcome {
    pub order_id: OrderId,
    /// Trades in the order the matching loop produced them.
    pub trades: Vec<Trade>,
    pub status: PlaceStatus,
}

/// One price level of a depth snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Depth-limited, point-in-time view of one symbol's book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: MarketId,
    /// Best (highest) bid first.
    pub bids: Vec<DepthLevel>,
    /// Best (lowest) ask first.
    pub asks: Vec<DepthLevel>,
    pub last_price: Option<Price>,
    /// Last stamped event sequence number.
    pub sequence: u64,
    /// Wall-clock milliseconds of the engine's last mutation.
    pub updated_at: i64,
}

/// A request that passed validation, numerics promoted to their newtypes.
struct AcceptedOrder {
    order_id: OrderId,
    owner_id: OwnerId,
    side: Side,
    kind: OrderKind,
    limit: Option<Price>,
    quantity: Quantity,
}

/// Mutable per-symbol state, guarded by the engine lock.
struct BookState {
    bids: BidBook,
    asks: AskBook,
    index: OrderIndex,
    /// Stamped onto every emitted event; strictly increasing.
    sequence: u64,
    next_trade_id: u64,
    last_price: Option<Price>,
    /// Unix nanos of the last mutation, forced monotonic.
    last_update: i64,
}

impl BookState {
    fn new() -> Self {
        Self {
            bids: BidBook::new(),
            asks: AskBook::new(),
            index: OrderIndex::new(),
            sequence: 0,
            next_trade_id: 0,
            last_price: None,
            last_update: 0,
        }
    }

    /// Engine clock: wall time, forced strictly monotonic per engine.
    fn stamp_now(&mut self) -> i64 {
        let now = now_nanos();
        self.last_update = now.max(self.last_update + 1);
        self.last_update
    }
}

fn now_nanos() -> i64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or(i64::MAX)
}

/// Per-symbol continuous double-auction matching engine.
///
/// Orders match against the opposite side under strict price-time priority;
/// the execution price is always the maker's resting price. All operations
/// are totally ordered per symbol and that order is observable through the
/// event sequence numbers.
pub struct MatchingEngine {
    symbol: MarketId,
    state: RwLock<BookState>,
    sink: Arc<dyn EventSink>,
}

impl MatchingEngine {
    pub fn new(symbol: MarketId, sink: Arc<dyn EventSink>) -> Self {
        Self {
            symbol,
            state: RwLock::new(BookState::new()),
            sink,
        }
    }

    pub fn symbol(&self) -> &MarketId {
        &self.symbol
    }

    /// Validate, match, and possibly rest a submitted order.
    ///
    /// Validation failures reject the request before any state change.
    pub fn place(&self, request: OrderRequest) -> Result<PlaceOutcome, EngineError> {
        let order = validate(request)?;

        let mut state = self.state.write().expect("engine lock poisoned");
        if state.index.contains(order.order_id) {
            return Err(EngineError::InvalidOrder(format!(
                "order id {} is already live",
                order.order_id
            )));
        }

        let accepted_at = state.stamp_now();

        // Split borrows: the books, the index, and the recorder each take
        // their own field of the guarded state.
        let BookState {
            bids,
            asks,
            index,
            sequence,
            next_trade_id,
            last_price,
            ..
        } = &mut *state;
        let mut recorder =
            MatchRecorder::new(&self.symbol, sequence, next_trade_id, self.sink.as_ref());

        let remaining = match order.side {
            Side::Buy => {
                Self::match_against_asks(asks, index, last_price, &mut recorder, &order, accepted_at)
            }
            Side::Sell => {
                Self::match_against_bids(bids, index, last_price, &mut recorder, &order, accepted_at)
            }
        };

        let status = if remaining.is_zero() {
            PlaceStatus::Filled
        } else {
            match order.kind {
                OrderKind::Limit => {
                    let price = order.limit.expect("validated limit order carries a price");
                    let entry = RestingOrder {
                        order_id: order.order_id,
                        owner_id: order.owner_id,
                        remaining_quantity: remaining,
                        accepted_at,
                    };
                    let aggregate = match order.side {
                        Side::Buy => {
                            bids.insert(price, entry);
                            bids.aggregate_at(price)
                        }
                        Side::Sell => {
                            asks.insert(price, entry);
                            asks.aggregate_at(price)
                        }
                    };
                    index.insert(order.order_id, order.side, price);
                    recorder.record_book_update(order.side, price, aggregate);
                    PlaceStatus::Resting
                }
                // Market leftovers are reported back, never rested.
                OrderKind::Market => PlaceStatus::Unfilled { leftover: remaining },
            }
        };

        let trades = recorder.into_trades();
        debug!(
            symbol = %self.symbol,
            order_id = %order.order_id,
            side = %order.side,
            kind = %order.kind,
            trades = trades.len(),
            status = ?status,
            "order processed"
        );

        Ok(PlaceOutcome {
            order_id: order.order_id,
            trades,
            status,
        })
    }

    /// Remove a resting order from the book.
    ///
    /// Emits a book update for the affected (side, price); never a trade.
    pub fn cancel(&self, order_id: OrderId) -> Result<(), EngineError> {
        let mut state = self.state.write().expect("engine lock poisoned");

        let Some(locator) = state.index.remove(order_id) else {
            return Err(EngineError::OrderNotFound(order_id));
        };

        state.stamp_now();

        let BookState {
            bids,
            asks,
            sequence,
            next_trade_id,
            ..
        } = &mut *state;

        let removed = match locator.side {
            Side::Buy => bids.remove_order(locator.price, order_id),
            Side::Sell => asks.remove_order(locator.price, order_id),
        };
        assert!(
            removed.is_some(),
            "index pointed at a resting order missing from the book"
        );

        let aggregate = match locator.side {
            Side::Buy => bids.aggregate_at(locator.price),
            Side::Sell => asks.aggregate_at(locator.price),
        };

        let mut recorder =
            MatchRecorder::new(&self.symbol, sequence, next_trade_id, self.sink.as_ref());
        recorder.record_book_update(locator.side, locator.price, aggregate);

        debug!(
            symbol = %self.symbol,
            order_id = %order_id,
            side = %locator.side,
            price = %locator.price,
            "order cancelled"
        );
        Ok(())
    }

    /// Depth-limited snapshot, consistent with one point in the engine's
    /// total order.
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        let state = self.state.read().expect("engine lock poisoned");
        BookSnapshot {
            symbol: self.symbol.clone(),
            bids: depth_view(state.bids.depth_levels(depth)),
            asks: depth_view(state.asks.depth_levels(depth)),
            last_price: state.last_price,
            sequence: state.sequence,
            updated_at: state.last_update / 1_000_000,
        }
    }

    /// Price of the most recent trade, if any.
    pub fn last_price(&self) -> Option<Price> {
        self.state.read().expect("engine lock poisoned").last_price
    }

    /// Last stamped event sequence number.
    pub fn sequence(&self) -> u64 {
        self.state.read().expect("engine lock poisoned").sequence
    }

    /// Number of live resting orders across both sides.
    pub fn resting_order_count(&self) -> usize {
        self.state.read().expect("engine lock poisoned").index.len()
    }

    /// Cross-check the index against the books and every level aggregate
    /// against the sum of its orders. For tests and diagnostics.
    pub fn check_invariants(&self) -> bool {
        let state = self.state.read().expect("engine lock poisoned");

        for (order_id, locator) in state.index.iter() {
            let resolved = match locator.side {
                Side::Buy => state
                    .bids
                    .iter_best_to_worst()
                    .find(|(price, _)| *price == locator.price)
                    .map(|(_, level)| level.iter().any(|o| o.order_id == order_id)),
                Side::Sell => state
                    .asks
                    .iter_best_to_worst()
                    .find(|(price, _)| *price == locator.price)
                    .map(|(_, level)| level.iter().any(|o| o.order_id == order_id)),
            };
            if resolved != Some(true) {
                return false;
            }
        }

        let mut live_orders = 0usize;
        let bid_levels = state
            .bids
            .iter_best_to_worst()
            .map(|(price, level)| (price, Side::Buy, level));
        let ask_levels = state
            .asks
            .iter_best_to_worst()
            .map(|(price, level)| (price, Side::Sell, level));
        for (price, side, level) in bid_levels.chain(ask_levels) {
            let mut sum = Quantity::zero();
            for order in level.iter() {
                live_orders += 1;
                sum = sum + order.remaining_quantity;
                if order.remaining_quantity.is_zero() {
                    return false;
                }
                match state.index.get(order.order_id) {
                    Some(loc) if loc.side == side && loc.price == price => {}
                    _ => return false,
                }
            }
            if sum != level.aggregate_quantity() {
                return false;
            }
        }

        live_orders == state.index.len()
    }

    fn match_against_asks(
        asks: &mut AskBook,
        index: &mut OrderIndex,
        last_price: &mut Option<Price>,
        recorder: &mut MatchRecorder<'_>,
        order: &AcceptedOrder,
        executed_at: i64,
    ) -> Quantity {
        let mut remaining = order.quantity;

        while !remaining.is_zero() {
            let (level_price, fill, head_fill, aggregate, level_empty) = {
                let Some((level_price, level)) = asks.best_level_mut() else {
                    break;
                };
                if !crossing::crosses(Side::Buy, order.limit, level_price) {
                    break;
                }

                let maker = level.peek_head().expect("book levels are never empty");
                let fill = remaining.min(maker.remaining_quantity);

                // Execution price is the maker's resting price.
                recorder.record_trade(
                    maker.order_id,
                    order.order_id,
                    Side::Buy,
                    level_price,
                    fill,
                    executed_at,
                );

                let head_fill = level.fill_head(fill);
                (
                    level_price,
                    fill,
                    head_fill,
                    level.aggregate_quantity(),
                    level.is_empty(),
                )
            };

            remaining = remaining
                .checked_sub(fill)
                .expect("fill exceeds taker remaining quantity");
            if head_fill.maker_exhausted {
                index.remove(head_fill.maker_order_id);
            }
            if level_empty {
                asks.remove_level(level_price);
            }
            *last_price = Some(level_price);
            recorder.record_book_update(Side::Sell, level_price, aggregate);
        }

        remaining
    }

    fn match_against_bids(
        bids: &mut BidBook,
        index: &mut OrderIndex,
        last_price: &mut Option<Price>,
        recorder: &mut MatchRecorder<'_>,
        order: &AcceptedOrder,
        executed_at: i64,
    ) -> Quantity {
        let mut remaining = order.quantity;

        while !remaining.is_zero() {
            let (level_price, fill, head_fill, aggregate, level_empty) = {
                let Some((level_price, level)) = bids.best_level_mut() else {
                    break;
                };
                if !crossing::crosses(Side::Sell, order.limit, level_price) {
                    break;
                }

                let maker = level.peek_head().expect("book levels are never empty");
                let fill = remaining.min(maker.remaining_quantity);

                // Execution price is the maker's resting price.
                recorder.record_trade(
                    maker.order_id,
                    order.order_id,
                    Side::Sell,
                    level_price,
                    fill,
                    executed_at,
                );

                let head_fill = level.fill_head(fill);
                (
                    level_price,
                    fill,
                    head_fill,
                    level.aggregate_quantity(),
                    level.is_empty(),
                )
            };

            remaining = remaining
                .checked_sub(fill)
                .expect("fill exceeds taker remaining quantity");
            if head_fill.maker_exhausted {
                index.remove(head_fill.maker_order_id);
            }
            if level_empty {
                bids.remove_level(level_price);
            }
            *last_price = Some(level_price);
            recorder.record_book_update(Side::Buy, level_price, aggregate);
        }

        remaining
    }
}

fn depth_view(levels: Vec<(Price, Quantity)>) -> Vec<DepthLevel> {
    levels
        .into_iter()
        .map(|(price, quantity)| DepthLevel { price, quantity })
        .collect()
}

/// Promote raw request decimals to validated newtypes.
///
/// Checked in the documented order so a request failing several checks
/// reports the quantity error first.
fn validate(request: OrderRequest) -> Result<AcceptedOrder, EngineError> {
    let quantity =
        Quantity::try_new(request.quantity).map_err(|_| EngineError::InvalidQuantity)?;
    if quantity.is_zero() {
        return Err(EngineError::InvalidQuantity);
    }

    let limit = match request.kind {
        OrderKind::Limit => {
            let raw = request.price.ok_or(EngineError::InvalidPrice)?;
            Some(Price::try_new(raw).map_err(|_| EngineError::InvalidPrice)?)
        }
        // A price on a market order is ignored, not rejected.
        OrderKind::Market => None,
    };

    Ok(AcceptedOrder {
        order_id: request.order_id,
        owner_id: request.owner_id,
        side: request.side,
        kind: request.kind,
        limit,
        quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{NullSink, RecordingSink};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn engine() -> MatchingEngine {
        MatchingEngine::new(MarketId::new("BTC/USDT"), Arc::new(NullSink))
    }

    fn limit(id: u64, side: Side, price: u64, qty: &str) -> OrderRequest {
        OrderRequest::limit(
            OrderId::new(id),
            OwnerId::new(1),
            side,
            Decimal::from(price),
            Decimal::from_str(qty).unwrap(),
        )
    }

    fn market(id: u64, side: Side, qty: &str) -> OrderRequest {
        OrderRequest::market(
            OrderId::new(id),
            OwnerId::new(1),
            side,
            Decimal::from_str(qty).unwrap(),
        )
    }

    #[test]
    fn test_resting_order() {
        let engine = engine();
        let outcome = engine.place(limit(1, Side::Buy, 50000, "1.0")).unwrap();

        assert_eq!(outcome.status, PlaceStatus::Resting);
        assert!(outcome.trades.is_empty());
        assert_eq!(engine.resting_order_count(), 1);
    }

    #[test]
    fn test_full_match() {
        let engine = engine();
        engine.place(limit(1, Side::Sell, 50000, "1.0")).unwrap();

        let outcome = engine.place(limit(2, Side::Buy, 50000, "1.0")).unwrap();
        assert_eq!(outcome.status, PlaceStatus::Filled);
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(
            outcome.trades[0].quantity,
            Quantity::from_str("1.0").unwrap()
        );
        assert_eq!(engine.resting_order_count(), 0);
        assert_eq!(engine.last_price(), Some(Price::from_u64(50000)));
    }

    #[test]
    fn test_partial_match_then_rest() {
        let engine = engine();
        engine.place(limit(1, Side::Sell, 50000, "0.5")).unwrap();

        let outcome = engine.place(limit(2, Side::Buy, 50000, "1.0")).unwrap();
        assert_eq!(outcome.status, PlaceStatus::Resting);
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(
            outcome.trades[0].quantity,
            Quantity::from_str("0.5").unwrap()
        );

        let snapshot = engine.snapshot(10);
        assert_eq!(snapshot.bids.len(), 1);
        assert_eq!(
            snapshot.bids[0].quantity,
            Quantity::from_str("0.5").unwrap()
        );
        assert!(snapshot.asks.is_empty());
    }

    #[test]
    fn test_no_cross_rests() {
        let engine = engine();
        engine.place(limit(1, Side::Sell, 51000, "1.0")).unwrap();

        let outcome = engine.place(limit(2, Side::Buy, 50000, "1.0")).unwrap();
        assert_eq!(outcome.status, PlaceStatus::Resting);
        assert!(outcome.trades.is_empty());
        assert_eq!(engine.resting_order_count(), 2);
        assert_eq!(engine.last_price(), None);
    }

    #[test]
    fn test_invalid_quantity_rejected() {
        let engine = engine();

        let zero = engine.place(limit(1, Side::Buy, 50000, "0"));
        assert_eq!(zero, Err(EngineError::InvalidQuantity));

        let mut negative = limit(1, Side::Buy, 50000, "1");
        negative.quantity = Decimal::from(-1);
        assert_eq!(engine.place(negative), Err(EngineError::InvalidQuantity));

        let mut over_precise = limit(1, Side::Buy, 50000, "1");
        over_precise.quantity = Decimal::from_str("0.123456789").unwrap();
        assert_eq!(
            engine.place(over_precise),
            Err(EngineError::InvalidQuantity)
        );

        // Nothing changed, nothing stamped
        assert_eq!(engine.sequence(), 0);
        assert_eq!(engine.resting_order_count(), 0);
    }

    #[test]
    fn test_invalid_price_rejected() {
        let engine = engine();

        let mut no_price = limit(1, Side::Buy, 50000, "1");
        no_price.price = None;
        assert_eq!(engine.place(no_price), Err(EngineError::InvalidPrice));

        let mut negative = limit(1, Side::Buy, 50000, "1");
        negative.price = Some(Decimal::from(-5));
        assert_eq!(engine.place(negative), Err(EngineError::InvalidPrice));

        let mut zero = limit(1, Side::Buy, 50000, "1");
        zero.price = Some(Decimal::ZERO);
        assert_eq!(engine.place(zero), Err(EngineError::InvalidPrice));
    }

    #[test]
    fn test_duplicate_live_id_rejected() {
        let engine = engine();
        engine.place(limit(1, Side::Buy, 50000, "1.0")).unwrap();

        let duplicate = engine.place(limit(1, Side::Buy, 49000, "1.0"));
        assert!(matches!(duplicate, Err(EngineError::InvalidOrder(_))));
        assert_eq!(engine.resting_order_count(), 1);
    }

    #[test]
    fn test_id_reusable_after_leaving_the_book() {
        let engine = engine();
        engine.place(limit(1, Side::Sell, 50000, "1.0")).unwrap();
        engine.place(limit(2, Side::Buy, 50000, "1.0")).unwrap();

        // id 1 was fully filled and is no longer live
        let outcome = engine.place(limit(1, Side::Buy, 49000, "1.0")).unwrap();
        assert_eq!(outcome.status, PlaceStatus::Resting);
    }

    #[test]
    fn test_market_order_against_empty_book() {
        let engine = engine();
        let outcome = engine.place(market(1, Side::Buy, "3.0")).unwrap();

        assert!(outcome.trades.is_empty());
        assert_eq!(
            outcome.status,
            PlaceStatus::Unfilled {
                leftover: Quantity::from_str("3.0").unwrap()
            }
        );
        assert_eq!(engine.resting_order_count(), 0);
    }

    #[test]
    fn test_market_price_is_ignored() {
        let engine = engine();
        engine.place(limit(1, Side::Sell, 100, "1.0")).unwrap();

        let mut request = market(2, Side::Buy, "1.0");
        request.price = Some(Decimal::from(-42)); // ignored for market orders
        let outcome = engine.place(request).unwrap();
        assert_eq!(outcome.status, PlaceStatus::Filled);
    }

    #[test]
    fn test_cancel_then_cancel_again() {
        let engine = engine();
        engine.place(limit(1, Side::Buy, 50000, "1.0")).unwrap();

        assert_eq!(engine.cancel(OrderId::new(1)), Ok(()));
        assert_eq!(
            engine.cancel(OrderId::new(1)),
            Err(EngineError::OrderNotFound(OrderId::new(1)))
        );
        assert_eq!(engine.resting_order_count(), 0);
    }

    #[test]
    fn test_cancel_emits_book_update_not_trade() {
        let sink = Arc::new(RecordingSink::new());
        let engine = MatchingEngine::new(MarketId::new("BTC/USDT"), sink.clone());
        engine.place(limit(1, Side::Buy, 50000, "1.0")).unwrap();
        let before = sink.len();

        engine.cancel(OrderId::new(1)).unwrap();

        let events = sink.events();
        assert_eq!(events.len(), before + 1);
        match events.last().unwrap() {
            crate::events::MarketEvent::BookUpdate(update) => {
                assert_eq!(update.side, Side::Buy);
                assert_eq!(update.price, Price::from_u64(50000));
                assert!(update.is_removal());
            }
            other => panic!("expected a book update, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_depth_and_metadata() {
        let engine = engine();
        engine.place(limit(1, Side::Buy, 50000, "1.0")).unwrap();
        engine.place(limit(2, Side::Buy, 49000, "2.0")).unwrap();
        engine.place(limit(3, Side::Buy, 48000, "3.0")).unwrap();
        engine.place(limit(4, Side::Sell, 51000, "1.5")).unwrap();

        let snapshot = engine.snapshot(2);
        assert_eq!(snapshot.bids.len(), 2);
        assert_eq!(snapshot.bids[0].price, Price::from_u64(50000));
        assert_eq!(snapshot.bids[1].price, Price::from_u64(49000));
        assert_eq!(snapshot.asks.len(), 1);
        assert_eq!(snapshot.last_price, None);
        assert_eq!(snapshot.sequence, engine.sequence());
        assert!(snapshot.updated_at > 0);
    }

    #[test]
    fn test_snapshot_unchanged_by_reads() {
        let engine = engine();
        engine.place(limit(1, Side::Buy, 50000, "1.0")).unwrap();

        let first = engine.snapshot(10);
        let second = engine.snapshot(10);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invariants_hold_after_mixed_operations() {
        let engine = engine();
        engine.place(limit(1, Side::Sell, 101, "5")).unwrap();
        engine.place(limit(2, Side::Sell, 102, "3")).unwrap();
        engine.place(limit(3, Side::Buy, 99, "4")).unwrap();
        engine.place(limit(4, Side::Buy, 101, "2")).unwrap();
        engine.cancel(OrderId::new(3)).unwrap();
        engine.place(market(5, Side::Buy, "10")).unwrap();

        assert!(engine.check_invariants());
    }
}
