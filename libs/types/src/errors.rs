//! Error taxonomy for the matching core
//!
//! Errors are values, local to the failed operation: every variant leaves
//! engine state unchanged and emits no events.

use thiserror::Error;

use crate::ids::OrderId;

/// Errors returned by engine and registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Submitted quantity was zero, negative, or over-precise.
    #[error("invalid quantity")]
    InvalidQuantity,

    /// Limit order with a missing, non-positive, or over-precise price.
    #[error("invalid price")]
    InvalidPrice,

    /// Structurally invalid order, e.g. an order id already live on the book.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Cancel target is not resting on the book.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// No engine exists for the symbol.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}
