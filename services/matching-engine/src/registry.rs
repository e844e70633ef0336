//! Symbol → engine registry
//!
//! Owns every per-symbol engine for the process lifetime and routes
//! operations to them. Explicitly constructed — nothing here is global — so
//! tests build isolated registries. Engines for different symbols are
//! independent and their operations run in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use types::errors::EngineError;
use types::ids::{MarketId, OrderId};
use types::order::OrderRequest;

use crate::engine::{BookSnapshot, MatchingEngine, PlaceOutcome};
use crate::sink::EventSink;

/// Registry of per-symbol matching engines sharing one event sink.
pub struct ExchangeRegistry {
    engines: DashMap<String, Arc<MatchingEngine>>,
    sink: Arc<dyn EventSink>,
}

impl ExchangeRegistry {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            engines: DashMap::new(),
            sink,
        }
    }

    /// Get the engine for `symbol`, creating it on first use.
    ///
    /// Idempotent and thread-safe: concurrent callers for the same symbol
    /// all receive the same stable engine reference.
    pub fn get_or_create(&self, symbol: &MarketId) -> Arc<MatchingEngine> {
        self.engines
            .entry(symbol.as_str().to_string())
            .or_insert_with(|| {
                info!(symbol = %symbol, "created matching engine");
                Arc::new(MatchingEngine::new(symbol.clone(), Arc::clone(&self.sink)))
            })
            .clone()
    }

    /// Strict lookup: routing never creates markets implicitly.
    pub fn get(&self, symbol: &str) -> Result<Arc<MatchingEngine>, EngineError> {
        self.engines
            .get(symbol)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }

    /// Submit an order to the engine for `symbol`.
    pub fn place(&self, symbol: &str, request: OrderRequest) -> Result<PlaceOutcome, EngineError> {
        self.get(symbol)?.place(request)
    }

    /// Cancel a resting order on the engine for `symbol`.
    pub fn cancel(&self, symbol: &str, order_id: OrderId) -> Result<(), EngineError> {
        self.get(symbol)?.cancel(order_id)
    }

    /// Depth-limited book snapshot for `symbol`.
    pub fn snapshot(&self, symbol: &str, depth: usize) -> Result<BookSnapshot, EngineError> {
        Ok(self.get(symbol)?.snapshot(depth))
    }

    /// Registered symbols, sorted for deterministic listings.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .engines
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        symbols.sort();
        symbols
    }

    /// Number of registered markets.
    pub fn market_count(&self) -> usize {
        self.engines.len()
    }
}
