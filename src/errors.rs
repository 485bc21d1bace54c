//! Price source error types

use thiserror::Error;

/// Errors that can occur when fetching mandi price data
///
/// All of these are recovered inside the aggregation chain; callers of
/// [`crate::aggregator::PriceAggregator::get_price`] never observe them.
#[derive(Error, Debug)]
pub enum MandiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Upstream returned a non-success status
    #[error("API error: {0}")]
    ApiError(String),

    /// Failed to parse an upstream response
    #[error("Parse error: {0}")]
    ParseError(String),
}
