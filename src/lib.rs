//! Mandi Price Core
//!
//! Multi-source aggregation of agricultural commodity prices for Maharashtra
//! markets. Sources are tried in priority order and the first usable quote
//! wins; a static fallback guarantees every query resolves to a record.
//!
//! Data sources:
//! - data.gov.in open-data API (daily mandi prices, highest priority)
//! - MandiPrices portal HTML scrape
//! - MSP / market-estimate static tables (always succeeds)
//!
//! Entry point is [`PriceAggregator::get_price`], which never fails —
//! degraded data is signalled through `is_fallback` and `confidence` on the
//! returned [`PriceRecord`].

pub mod aggregator;
pub mod cache;
pub mod errors;
pub mod models;
pub mod sources;
pub mod synth;
pub mod transport;
pub mod units;

pub use aggregator::PriceAggregator;
pub use cache::SourceCache;
pub use errors::MandiError;
pub use models::{
    MarketComparison, MarketQuote, PriceQuery, PriceRecord, SourceQuote, DEFAULT_STATE,
};
pub use sources::{DataGovSource, MandiScrapeSource, PriceSource, StaticFallbackSource};
pub use synth::Synthesizer;
pub use transport::{HttpTransport, ReqwestTransport};
