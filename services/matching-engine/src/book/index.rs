//! Order id index for resting orders
//!
//! Maps an order id to the (side, price) locator of the level holding it.
//! Maintained in lockstep with every book mutation: an id is present here
//! if and only if a resting order with that id is live on a side book.
//! Powers cancels without a book scan and duplicate-live-id rejection.

use std::collections::HashMap;

use types::ids::OrderId;
use types::numeric::Price;
use types::order::Side;

/// Locator of a resting order: which side book and which price level.
///
/// The position within the level is not tracked; removal within a level is
/// by id, which is linear in the level's queue length only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLocator {
    pub side: Side,
    pub price: Price,
}

/// Index of all live resting orders for one engine.
#[derive(Debug, Clone, Default)]
pub struct OrderIndex {
    entries: HashMap<OrderId, OrderLocator>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record a newly rested order.
    ///
    /// # Panics
    /// Panics if the id is already indexed: duplicates must be rejected
    /// before the book is mutated, so a collision here is corruption.
    pub fn insert(&mut self, order_id: OrderId, side: Side, price: Price) {
        let previous = self.entries.insert(order_id, OrderLocator { side, price });
        assert!(
            previous.is_none(),
            "order id {order_id} indexed twice; book and index diverged"
        );
    }

    /// Look up the locator for a live resting order.
    pub fn get(&self, order_id: OrderId) -> Option<OrderLocator> {
        self.entries.get(&order_id).copied()
    }

    /// Whether the id refers to a live resting order.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.entries.contains_key(&order_id)
    }

    /// Drop an order that left the book (filled or cancelled).
    pub fn remove(&mut self, order_id: OrderId) -> Option<OrderLocator> {
        self.entries.remove(&order_id)
    }

    /// Number of live resting orders.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate all indexed orders (test and invariant checking).
    pub fn iter(&self) -> impl Iterator<Item = (OrderId, OrderLocator)> + '_ {
        self.entries.iter().map(|(id, loc)| (*id, *loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = OrderIndex::new();
        index.insert(OrderId::new(1), Side::Buy, Price::from_u64(50000));

        let locator = index.get(OrderId::new(1)).unwrap();
        assert_eq!(locator.side, Side::Buy);
        assert_eq!(locator.price, Price::from_u64(50000));
        assert!(index.contains(OrderId::new(1)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut index = OrderIndex::new();
        index.insert(OrderId::new(1), Side::Sell, Price::from_u64(100));

        assert!(index.remove(OrderId::new(1)).is_some());
        assert!(!index.contains(OrderId::new(1)));
        assert!(index.remove(OrderId::new(1)).is_none());
        assert!(index.is_empty());
    }

    #[test]
    #[should_panic(expected = "indexed twice")]
    fn test_duplicate_insert_is_fatal() {
        let mut index = OrderIndex::new();
        index.insert(OrderId::new(1), Side::Buy, Price::from_u64(50000));
        index.insert(OrderId::new(1), Side::Buy, Price::from_u64(50000));
    }
}
