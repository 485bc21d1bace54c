//! Priority-ordered multi-source price aggregation
//!
//! The aggregator owns the source chain, tries each source in fixed priority
//! order and returns the first usable quote, decorated with chart data and
//! provenance. `get_price` never fails: the static fallback source always
//! succeeds, and a hard backstop covers even a violation of that contract.
//! Callers detect degraded data through `is_fallback` and `confidence`, not
//! through errors.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{
    now_rfc3339, MarketQuote, PriceQuery, PriceRecord, SourceQuote, DEFAULT_STATE,
};
use crate::sources::fallback::GENERIC_DEFAULT_PRICE;
use crate::sources::{
    DataGovSource, MandiScrapeSource, PriceSource, StaticFallbackSource, FALLBACK_PRIORITY,
};
use crate::synth::Synthesizer;
use crate::transport::ReqwestTransport;

/// Chain-of-responsibility aggregator over the configured price sources
pub struct PriceAggregator {
    /// Sorted by ascending priority at construction, stable order
    sources: Vec<Box<dyn PriceSource>>,
    synth: Synthesizer,
}

impl PriceAggregator {
    /// Build the default chain: government API, portal scrape, static fallback
    pub fn new() -> Self {
        let transport = Arc::new(ReqwestTransport::new());
        Self::with_sources(
            vec![
                Box::new(DataGovSource::new(transport.clone())),
                Box::new(MandiScrapeSource::new(transport)),
                Box::new(StaticFallbackSource::new()),
            ],
            Synthesizer::new(),
        )
    }

    /// Build from an explicit source list, sorted here by priority
    pub fn with_sources(mut sources: Vec<Box<dyn PriceSource>>, synth: Synthesizer) -> Self {
        sources.sort_by_key(|s| s.priority());
        log::info!("price aggregator initialized with {} sources", sources.len());
        Self { sources, synth }
    }

    /// Resolve a price for a crop. Always returns a record.
    pub async fn get_price(&self, crop: &str, state: &str) -> PriceRecord {
        for source in &self.sources {
            log::debug!(
                "trying source {} (priority {}) for {}",
                source.name(),
                source.priority(),
                crop
            );

            // An error inside one source is handled exactly like absence.
            match source.fetch_price(crop, state).await {
                Ok(Some(quote)) => {
                    log::info!(
                        "got Rs {}/kg for {} from {}",
                        quote.price_per_kg,
                        crop,
                        source.name()
                    );
                    return self.decorate(crop, quote, source.name(), source.priority());
                }
                Ok(None) => {
                    log::debug!("{} had no data for {}", source.name(), crop);
                }
                Err(e) => {
                    log::warn!("{} failed for {}: {}", source.name(), crop, e);
                }
            }
        }

        // Only reachable if the fallback source itself misbehaves.
        log::error!("every source failed for {}, using generic backstop", crop);
        self.backstop_record(crop, state)
    }

    /// `get_price` against the default state
    pub async fn get_price_default(&self, crop: &str) -> PriceRecord {
        self.get_price(crop, DEFAULT_STATE).await
    }

    /// Resolve a structured query
    pub async fn resolve(&self, query: &PriceQuery) -> PriceRecord {
        self.get_price(&query.crop, &query.state).await
    }

    /// Resolve prices for several crops sequentially
    pub async fn get_bulk_prices(
        &self,
        crops: &[&str],
        state: &str,
    ) -> HashMap<String, PriceRecord> {
        let mut results = HashMap::with_capacity(crops.len());
        for crop in crops {
            let record = self.get_price(crop, state).await;
            results.insert(crop.to_string(), record);
        }
        results
    }

    /// Per-market rows from the highest-priority source, empty on failure
    pub async fn get_markets_for_crop(&self, crop: &str, state: &str) -> Vec<MarketQuote> {
        let Some(source) = self.sources.first() else {
            return Vec::new();
        };

        match source.fetch_price(crop, state).await {
            Ok(Some(quote)) => quote.markets,
            _ => Vec::new(),
        }
    }

    /// Fill chart data and annotate provenance on a chosen quote
    fn decorate(
        &self,
        crop: &str,
        quote: SourceQuote,
        source_name: &str,
        source_priority: u8,
    ) -> PriceRecord {
        let historical_prices = self.synth.historical(quote.price_per_kg, crop);

        let market_comparison = if quote.markets.is_empty() {
            self.synth.comparison(quote.price_per_kg)
        } else {
            self.synth
                .format_comparison(&quote.markets, quote.price_per_kg)
        };

        PriceRecord {
            crop: crop.to_string(),
            price_per_kg: quote.price_per_kg,
            unit: "kg".to_string(),
            market: quote.market,
            state: quote.state,
            source_name: source_name.to_string(),
            source_priority,
            confidence: quote.confidence,
            is_fallback: source_priority == FALLBACK_PRIORITY,
            timestamp: quote.timestamp,
            markets: quote.markets,
            historical_prices,
            market_comparison,
        }
    }

    /// Minimal generic-default record, the never-fails backstop
    fn backstop_record(&self, crop: &str, state: &str) -> PriceRecord {
        let quote = SourceQuote {
            price_per_kg: GENERIC_DEFAULT_PRICE,
            market: "MSP/Estimate".to_string(),
            state: state.to_string(),
            confidence: 20,
            timestamp: now_rfc3339(),
            markets: vec![],
        };
        self.decorate(crop, quote, "Generic Default", FALLBACK_PRIORITY)
    }
}

impl Default for PriceAggregator {
    fn default() -> Self {
        Self::new()
    }
}
