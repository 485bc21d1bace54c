//! Domain models for mandi price data

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Default state for queries that do not specify one
pub const DEFAULT_STATE: &str = "Maharashtra";

/// Upper sanity bound for a per-kg price in rupees
pub const MAX_SANE_PRICE_PER_KG: f64 = 10_000.0;

/// Maximum market rows carried on a record
pub const MAX_MARKETS: usize = 5;

/// Number of points in a historical price series
pub const HISTORY_LEN: usize = 8;

/// A price lookup request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuery {
    pub crop: String,
    pub state: String,
}

impl PriceQuery {
    pub fn new(crop: &str) -> Self {
        Self {
            crop: crop.to_string(),
            state: DEFAULT_STATE.to_string(),
        }
    }

    pub fn with_state(crop: &str, state: &str) -> Self {
        Self {
            crop: crop.to_string(),
            state: state.to_string(),
        }
    }
}

/// A single market's per-kg price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub name: String,
    pub price_per_kg: f64,
}

/// A market comparison row for chart display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketComparison {
    pub market: String,
    pub price_per_kg: f64,
    /// Signed percentage string, e.g. "+10.0%"
    pub change: String,
}

/// Ephemeral output of a single source adapter, before the aggregator
/// annotates provenance and chart data. This is also what each adapter caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceQuote {
    pub price_per_kg: f64,
    /// Representative market name
    pub market: String,
    pub state: String,
    /// 0-100, fixed per source tier
    pub confidence: u8,
    /// RFC 3339
    pub timestamp: String,
    /// Per-market rows when the source has them (government API case).
    /// Deduplicated by name, at most [`MAX_MARKETS`] entries.
    pub markets: Vec<MarketQuote>,
}

/// The normalized price record served to callers
///
/// Invariants: `0 < price_per_kg < 10000`, `unit == "kg"`,
/// `historical_prices.len() == 8` with the last entry equal to
/// `price_per_kg`, and `markets` contains no duplicate names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub crop: String,
    pub price_per_kg: f64,
    pub unit: String,
    pub market: String,
    pub state: String,
    pub source_name: String,
    pub source_priority: u8,
    pub confidence: u8,
    pub is_fallback: bool,
    pub timestamp: String,
    pub markets: Vec<MarketQuote>,
    /// Oldest to newest, exactly [`HISTORY_LEN`] points
    pub historical_prices: Vec<f64>,
    pub market_comparison: Vec<MarketComparison>,
}

/// Check a per-kg price against the plausible range
pub fn is_sane_price(price_per_kg: f64) -> bool {
    price_per_kg > 0.0 && price_per_kg < MAX_SANE_PRICE_PER_KG
}

/// Current time as an RFC 3339 string
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
