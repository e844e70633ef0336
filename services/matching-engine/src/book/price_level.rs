//! Price level implementation with FIFO queue
//!
//! A price level contains all orders resting at a specific price point.
//! Orders are maintained in FIFO (First-In-First-Out) order to enforce
//! time priority.

use std::collections::VecDeque;

use types::ids::{OrderId, OwnerId};
use types::numeric::Quantity;

/// An order resting on the book.
///
/// Owned by exactly one price level; the order index refers to it only by
/// id and locator.
#[derive(Debug, Clone)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub owner_id: OwnerId,
    pub remaining_quantity: Quantity,
    /// Engine-assigned monotonic nano stamp, fixing arrival order.
    pub accepted_at: i64,
}

/// Outcome of filling against the head order of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadFill {
    pub maker_order_id: OrderId,
    /// The head was fully consumed and popped from the queue.
    pub maker_exhausted: bool,
}

/// A price level containing orders at a specific price
///
/// Maintains strict FIFO ordering for time-priority matching, with an
/// incrementally maintained aggregate of remaining quantities.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Queue of orders at this price level (FIFO order)
    orders: VecDeque<RestingOrder>,
    /// Total remaining quantity across the level
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Append an order at the tail of the queue (time priority)
    pub fn append(&mut self, order: RestingOrder) {
        self.total_quantity = self.total_quantity + order.remaining_quantity;
        self.orders.push_back(order);
        self.debug_check();
    }

    /// Peek at the oldest resting order without removing it
    pub fn peek_head(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    /// Fill `quantity` against the head order.
    ///
    /// Decrements the head's remaining quantity and the level aggregate; pops
    /// the head when it reaches exactly zero.
    ///
    /// # Panics
    /// Panics if the level is empty or the fill exceeds the head's remaining
    /// quantity. Either means the book is corrupted and must not serve
    /// further traffic.
    pub fn fill_head(&mut self, quantity: Quantity) -> HeadFill {
        let head = self.orders.front_mut().expect("fill_head on empty level");
        let maker_order_id = head.order_id;

        head.remaining_quantity = head
            .remaining_quantity
            .checked_sub(quantity)
            .expect("fill exceeds maker remaining quantity");
        self.total_quantity = self
            .total_quantity
            .checked_sub(quantity)
            .expect("level aggregate underflow");

        let maker_exhausted = head.remaining_quantity.is_zero();
        if maker_exhausted {
            self.orders.pop_front();
        }

        self.debug_check();
        HeadFill {
            maker_order_id,
            maker_exhausted,
        }
    }

    /// Remove an order from the queue by id.
    ///
    /// Returns the removed order, or None if not found. O(n) in the number
    /// of orders at this level.
    pub fn remove(&mut self, order_id: OrderId) -> Option<RestingOrder> {
        let position = self.orders.iter().position(|o| o.order_id == order_id)?;
        let order = self.orders.remove(position)?;

        self.total_quantity = self
            .total_quantity
            .checked_sub(order.remaining_quantity)
            .expect("level aggregate underflow");

        self.debug_check();
        Some(order)
    }

    /// Total remaining quantity at this price level
    pub fn aggregate_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Whether the level holds no orders
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Iterate resting orders in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &RestingOrder> {
        self.orders.iter()
    }

    // Invariant: aggregate == sum of remaining quantities.
    fn debug_check(&self) {
        debug_assert_eq!(
            self.total_quantity,
            self.orders
                .iter()
                .fold(Quantity::zero(), |acc, o| acc + o.remaining_quantity),
            "level aggregate diverged from the sum of resting quantities"
        );
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
