//! Static MSP/estimate fallback source
//!
//! Last link in the chain and the reason the aggregator can promise a record
//! for every query. Staple crops use the government Minimum Support Price,
//! perishables use hand-maintained market estimates, and anything unknown
//! gets a generic default. Never returns absent.

use async_trait::async_trait;
use std::time::Duration;

use crate::cache::SourceCache;
use crate::errors::MandiError;
use crate::models::{now_rfc3339, SourceQuote};
use crate::sources::{PriceSource, FALLBACK_PRIORITY};

const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Generic price when a crop appears in neither table, Rs/kg
pub const GENERIC_DEFAULT_PRICE: f64 = 25.0;

const MSP_CONFIDENCE: u8 = 60;
const ESTIMATE_CONFIDENCE: u8 = 40;
const GENERIC_CONFIDENCE: u8 = 20;

/// MSP rates 2025-26, Rs/kg (declared per quintal, stored converted)
const MSP_RATES: &[(&str, f64)] = &[
    ("wheat", 24.25),
    ("rice", 23.20),
    ("maize", 21.75),
    ("bajra", 23.50),
    ("cotton", 75.21),
    ("sugarcane", 3.15),
    ("soybean", 48.41),
    ("tur", 72.00),
    ("moong", 84.45),
    ("urad", 69.50),
    ("chana", 54.41),
    ("groundnut", 63.13),
    ("sunflower", 65.00),
    ("mustard", 56.00),
];

/// Market estimates for fruit and vegetables without an MSP, Rs/kg
const MARKET_ESTIMATES: &[(&str, f64)] = &[
    ("tomato", 35.0),
    ("onion", 22.0),
    ("potato", 18.0),
    ("cabbage", 15.0),
    ("cauliflower", 20.0),
    ("brinjal", 25.0),
    ("okra", 30.0),
    ("mango", 80.0),
    ("banana", 40.0),
    ("apple", 120.0),
    ("pomegranate", 90.0),
    ("grapes", 70.0),
    ("orange", 50.0),
];

fn table_lookup(table: &[(&str, f64)], crop: &str) -> Option<f64> {
    table
        .iter()
        .find(|(name, _)| *name == crop)
        .map(|(_, price)| *price)
}

/// Pure-lookup fallback source
pub struct StaticFallbackSource {
    cache: SourceCache,
}

impl StaticFallbackSource {
    pub fn new() -> Self {
        Self {
            cache: SourceCache::new(CACHE_TTL),
        }
    }

    fn lookup(crop: &str) -> (f64, u8, &'static str) {
        let crop_lower = crop.to_lowercase();
        if let Some(price) = table_lookup(MSP_RATES, &crop_lower) {
            (price, MSP_CONFIDENCE, "MSP Rate")
        } else if let Some(price) = table_lookup(MARKET_ESTIMATES, &crop_lower) {
            (price, ESTIMATE_CONFIDENCE, "Market Estimate")
        } else {
            (GENERIC_DEFAULT_PRICE, GENERIC_CONFIDENCE, "Generic Estimate")
        }
    }
}

impl Default for StaticFallbackSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for StaticFallbackSource {
    fn name(&self) -> &str {
        "MSP Fallback"
    }

    fn priority(&self) -> u8 {
        FALLBACK_PRIORITY
    }

    async fn fetch_price(
        &self,
        crop: &str,
        state: &str,
    ) -> Result<Option<SourceQuote>, MandiError> {
        if let Some(cached) = self.cache.get(crop, state) {
            return Ok(Some(cached));
        }

        let (price, confidence, kind) = Self::lookup(crop);
        log::info!("using {} Rs {}/kg for {}", kind, price, crop);

        let quote = SourceQuote {
            price_per_kg: price,
            market: "MSP/Estimate".to_string(),
            state: state.to_string(),
            confidence,
            timestamp: now_rfc3339(),
            markets: vec![],
        };

        self.cache.put(crop, state, quote.clone());
        Ok(Some(quote))
    }
}
