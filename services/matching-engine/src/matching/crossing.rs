//! Crossing detection logic
//!
//! Determines when an incoming order can trade against the best level of
//! the opposite book.

use types::numeric::Price;
use types::order::Side;

/// Check whether a taker can match the resting level at `maker_price`.
///
/// A market order (no limit) always crosses. A limit buy crosses while the
/// ask is at or below its limit; a limit sell while the bid is at or above.
pub fn crosses(taker_side: Side, taker_limit: Option<Price>, maker_price: Price) -> bool {
    match (taker_side, taker_limit) {
        (_, None) => true,
        (Side::Buy, Some(limit)) => maker_price <= limit,
        (Side::Sell, Some(limit)) => maker_price >= limit,
    }
}
