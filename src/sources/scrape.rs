//! Mandi price portal HTML-scrape adapter
//!
//! Second-tier source. Scrapes the crop's price page on a mandi price portal
//! and accepts the first in-range currency-prefixed number found near a
//! price-labelled element. Anything that goes wrong here — network, markup
//! drift, no matching text — reads as absence, never as an error.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::SourceCache;
use crate::errors::MandiError;
use crate::models::{is_sane_price, now_rfc3339, SourceQuote};
use crate::sources::PriceSource;
use crate::transport::HttpTransport;
use crate::units::round2;

const DEFAULT_BASE_URL: &str = "https://www.mandiprices.com";
const CONFIDENCE: u8 = 70;
const CACHE_TTL: Duration = Duration::from_secs(30 * 60);

lazy_static! {
    /// Rupee-prefixed number, comma groups allowed: "₹2,500.50", "Rs. 35"
    static ref PRICE_PATTERN: Regex =
        Regex::new(r"(?:₹|Rs\.?)\s*(\d+(?:,\d+)*(?:\.\d+)?)").unwrap();
}

/// Adapter scraping per-kg prices from a mandi price portal
pub struct MandiScrapeSource {
    transport: Arc<dyn HttpTransport>,
    cache: SourceCache,
    base_url: String,
}

impl MandiScrapeSource {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            cache: SourceCache::new(CACHE_TTL),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn page_url(&self, crop: &str, state: &str) -> String {
        let crop_slug = crop.to_lowercase().replace(' ', "-");
        let state_slug = state.to_lowercase().replace(' ', "-");
        format!(
            "{}/mandi-price-of-{}-in-{}",
            self.base_url, crop_slug, state_slug
        )
    }
}

/// Pull the first plausible per-kg price out of a document
fn extract_price(html: &str) -> Option<f64> {
    let document = Html::parse_document(html);
    // Elements whose class mentions "price" carry the quotes on the portal.
    let selector = Selector::parse(r#"[class*="price"]"#).ok()?;

    for element in document.select(&selector) {
        let text: String = element.text().collect::<Vec<_>>().join(" ");
        if let Some(captures) = PRICE_PATTERN.captures(&text) {
            let cleaned = captures[1].replace(',', "");
            if let Ok(value) = cleaned.parse::<f64>() {
                let price = round2(value);
                if is_sane_price(price) {
                    return Some(price);
                }
            }
        }
    }

    None
}

#[async_trait]
impl PriceSource for MandiScrapeSource {
    fn name(&self) -> &str {
        "MandiPrices.com"
    }

    fn priority(&self) -> u8 {
        2
    }

    async fn fetch_price(
        &self,
        crop: &str,
        state: &str,
    ) -> Result<Option<SourceQuote>, MandiError> {
        if let Some(cached) = self.cache.get(crop, state) {
            log::debug!("scrape cache hit for {} in {}", crop, state);
            return Ok(Some(cached));
        }

        let url = self.page_url(crop, state);
        let body = match self.transport.get(&url).await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("scrape fetch failed for {}: {}", crop, e);
                return Ok(None);
            }
        };

        let Some(price_per_kg) = extract_price(&body) else {
            log::debug!("no price found in scraped page for {}", crop);
            return Ok(None);
        };

        log::info!("scraped price Rs {}/kg for {}", price_per_kg, crop);

        let quote = SourceQuote {
            price_per_kg,
            market: "MandiPrices Average".to_string(),
            state: state.to_string(),
            confidence: CONFIDENCE,
            timestamp: now_rfc3339(),
            markets: vec![],
        };

        self.cache.put(crop, state, quote.clone());
        Ok(Some(quote))
    }
}
