//! Order intent types
//!
//! An `OrderRequest` is the submitted unit of intent. Raw decimals on the
//! request are validated into `Price`/`Quantity` by the engine before any
//! state change, so a rejected request leaves no trace.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{OrderId, OwnerId};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Lowercase label for logging and wire views.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order kind: priced or take-whatever-is-there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Rest at a limit price if not immediately matched.
    Limit,
    /// Match against the opposite book; any leftover is discarded.
    Market,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Limit => "limit",
            OrderKind::Market => "market",
        }
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted order, before validation.
///
/// `price` is required and strictly positive for limit orders, and ignored
/// for market orders. `order_id` must be unique among the engine's live
/// resting orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: OrderId,
    pub owner_id: OwnerId,
    pub side: Side,
    pub kind: OrderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub quantity: Decimal,
}

impl OrderRequest {
    /// Build a limit order request.
    pub fn limit(
        order_id: OrderId,
        owner_id: OwnerId,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            order_id,
            owner_id,
            side,
            kind: OrderKind::Limit,
            price: Some(price),
            quantity,
        }
    }

    /// Build a market order request.
    pub fn market(order_id: OrderId, owner_id: OwnerId, side: Side, quantity: Decimal) -> Self {
        Self {
            order_id,
            owner_id,
            side,
            kind: OrderKind::Market,
            price: None,
            quantity,
        }
    }
}
