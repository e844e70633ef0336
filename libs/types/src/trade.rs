//! Trade execution types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{MarketId, OrderId, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;

/// An atomic exchange between a resting maker and an incoming taker.
///
/// Immutable once emitted. The execution price is always the maker's resting
/// price, never the taker's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    /// Engine-assigned sequence number, shared with book updates.
    pub sequence: u64,
    pub symbol: MarketId,

    // Order references
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,

    /// Side from the taker (aggressor) perspective.
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,

    /// Unix nanoseconds, engine clock.
    pub executed_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: TradeId,
        sequence: u64,
        symbol: MarketId,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id,
            sequence,
            symbol,
            maker_order_id,
            taker_order_id,
            side,
            price,
            quantity,
            executed_at,
        }
    }

    /// Notional value (price × quantity).
    pub fn trade_value(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_trade() -> Trade {
        Trade::new(
            TradeId::new(1),
            42,
            MarketId::new("BTC/USDT"),
            OrderId::new(10),
            OrderId::new(11),
            Side::Buy,
            Price::from_u64(50000),
            Quantity::from_str("0.5").unwrap(),
            1708123456789000000,
        )
    }

    #[test]
    fn test_trade_value() {
        assert_eq!(sample_trade().trade_value(), Decimal::from(25000));
    }

    #[test]
    fn test_trade_serialization_round_trip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();

        // Decimals cross the boundary as canonical strings
        assert!(json.contains("\"price\":\"50000\""));
        assert!(json.contains("\"quantity\":\"0.5\""));
        assert!(json.contains("\"side\":\"buy\""));

        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trade);
    }
}
