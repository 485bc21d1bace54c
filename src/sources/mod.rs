//! Price source adapters
//!
//! Defines the [`PriceSource`] trait and one implementation per upstream:
//! - data.gov.in open-data API (highest priority)
//! - mandi price portal HTML scrape
//! - static MSP/estimate fallback tables (always succeeds)

pub mod datagov;
pub mod fallback;
pub mod scrape;

use async_trait::async_trait;

use crate::errors::MandiError;
use crate::models::SourceQuote;

/// Priority assigned to the static fallback source
pub const FALLBACK_PRIORITY: u8 = 99;

/// Abstraction over a single price data source
///
/// Each implementation owns a fixed priority (lower is tried first), a
/// per-source cache with its own TTL, and its own response parsing. A return
/// of `Ok(None)` means the source had no usable data; errors are treated
/// identically by the aggregator.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Human-readable source name, carried on returned records
    fn name(&self) -> &str;

    /// Chain position, lower tried first
    fn priority(&self) -> u8;

    /// Fetch a normalized per-kg quote for a crop in a state
    ///
    /// Implementations check their own cache before any I/O and write
    /// through on success.
    async fn fetch_price(&self, crop: &str, state: &str)
        -> Result<Option<SourceQuote>, MandiError>;
}

pub use datagov::DataGovSource;
pub use fallback::StaticFallbackSource;
pub use scrape::MandiScrapeSource;
