//! data.gov.in commodity price API adapter
//!
//! Highest-priority source. The government dataset reports daily modal, min
//! and max prices per market; commodity names in the dataset vary (e.g.
//! "Wheat" vs "Wheat (Dara)"), so each crop maps to a list of known aliases
//! that are tried in order until one returns records.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::SourceCache;
use crate::errors::MandiError;
use crate::models::{
    is_sane_price, now_rfc3339, MarketQuote, SourceQuote, MAX_MARKETS,
};
use crate::sources::PriceSource;
use crate::transport::HttpTransport;
use crate::units::{round2, to_per_kg};

/// Agri market prices dataset on data.gov.in
const DEFAULT_BASE_URL: &str =
    "https://api.data.gov.in/resource/9ef84268-d588-465a-a308-a864a43d0070";

/// Public demo key, rate limited. Override via `DATA_GOV_IN_API_KEY`.
const DEFAULT_API_KEY: &str =
    "579b464db66ec23bdd000001cdd3946e44ce4aad7209ff7b23ac571b";

const RECORD_LIMIT: u32 = 30;
/// Records averaged into the final price
const TOP_RECORDS: usize = 5;
const CONFIDENCE: u8 = 95;
const CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Commodity name aliases as they appear in the upstream dataset
fn commodity_aliases(crop: &str) -> Vec<String> {
    let known: &[&str] = match crop.to_lowercase().as_str() {
        "wheat" => &["Wheat", "Wheat (Dara)"],
        "rice" => &["Rice", "Paddy(Dhan)(Common)", "Paddy"],
        "cotton" => &["Cotton", "Kapas"],
        "tomato" => &["Tomato", "Tomato Hybrid"],
        "onion" => &["Onion", "Onion Red"],
        "potato" => &["Potato", "Potato Red"],
        "soybean" => &["Soyabean", "Soybean"],
        "maize" => &["Maize", "Corn"],
        "jowar" => &["Jowar(Sorghum)", "Jowar"],
        "bajra" => &["Bajra(Pearl Millet)", "Bajra"],
        "groundnut" => &["Groundnut", "Peanut"],
        "tur" => &["Arhar (Tur/Red Gram)(Whole)", "Tur"],
        "sugarcane" => &["Sugarcane"],
        "chilli" => &["Chillies (Green)", "Chilli Red"],
        "turmeric" => &["Turmeric"],
        "garlic" => &["Garlic"],
        "ginger" => &["Ginger(Green)", "Ginger"],
        "banana" => &["Banana"],
        "mango" => &["Mango"],
        "grapes" => &["Grapes"],
        "orange" => &["Orange", "Santra"],
        "pomegranate" => &["Pomegranate"],
        "apple" => &["Apple"],
        "cabbage" => &["Cabbage"],
        "cauliflower" => &["Cauliflower"],
        "brinjal" => &["Brinjal", "Eggplant"],
        "okra" => &["Bhindi(Ladies Finger)", "Okra"],
        _ => &[],
    };

    if known.is_empty() {
        vec![capitalize(crop)]
    } else {
        known.iter().map(|s| s.to_string()).collect()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    records: Vec<ApiRecord>,
}

/// Raw dataset row. Numeric fields arrive as strings or numbers depending on
/// the row, so everything is taken as a JSON value and parsed leniently.
#[derive(Debug, Deserialize)]
struct ApiRecord {
    #[serde(default)]
    modal_price: serde_json::Value,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    market: Option<String>,
}

impl ApiRecord {
    fn modal_price_value(&self) -> Option<f64> {
        parse_lenient_f64(&self.modal_price)
    }
}

fn parse_lenient_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Adapter for the data.gov.in commodity price API
pub struct DataGovSource {
    transport: Arc<dyn HttpTransport>,
    cache: SourceCache,
    api_key: String,
    base_url: String,
}

impl DataGovSource {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let api_key = std::env::var("DATA_GOV_IN_API_KEY")
            .unwrap_or_else(|_| DEFAULT_API_KEY.to_string());
        Self::with_api_key(transport, &api_key)
    }

    pub fn with_api_key(transport: Arc<dyn HttpTransport>, api_key: &str) -> Self {
        Self {
            transport,
            cache: SourceCache::new(CACHE_TTL),
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = SourceCache::new(ttl);
        self
    }

    fn build_url(&self, commodity: &str, state: &str) -> String {
        format!(
            "{}?api-key={}&format=json&limit={}&filters[commodity]={}&filters[state]={}",
            self.base_url,
            self.api_key,
            RECORD_LIMIT,
            urlencoding::encode(commodity),
            urlencoding::encode(state),
        )
    }

    /// Fetch one commodity alias and reduce its rows to a quote
    async fn fetch_alias(
        &self,
        commodity: &str,
        state: &str,
    ) -> Result<Option<SourceQuote>, MandiError> {
        let url = self.build_url(commodity, state);
        let body = self.transport.get(&url).await?;

        let response: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| MandiError::ParseError(e.to_string()))?;

        if response.records.is_empty() {
            return Ok(None);
        }

        log::debug!(
            "data.gov.in returned {} records for {}",
            response.records.len(),
            commodity
        );

        Ok(reduce_records(&response.records, state))
    }
}

/// Normalize raw rows to per-kg, drop the implausible ones and average the
/// first five. Market rows keep arrival order, deduplicated by name.
fn reduce_records(records: &[ApiRecord], state: &str) -> Option<SourceQuote> {
    let mut prices = Vec::new();
    let mut markets: Vec<MarketQuote> = Vec::new();

    for record in records {
        let modal = match record.modal_price_value() {
            Some(v) if v > 0.0 => v,
            _ => continue,
        };

        let unit = record.unit.as_deref().unwrap_or("");
        let price_per_kg = to_per_kg(modal, unit);

        if !is_sane_price(price_per_kg) {
            continue;
        }

        prices.push(price_per_kg);

        let name = record
            .market
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown")
            .to_string();
        if markets.len() < MAX_MARKETS && !markets.iter().any(|m| m.name == name) {
            markets.push(MarketQuote {
                name,
                price_per_kg,
            });
        }
    }

    if prices.is_empty() {
        return None;
    }

    let top = &prices[..prices.len().min(TOP_RECORDS)];
    let avg = round2(top.iter().sum::<f64>() / top.len() as f64);

    let market = markets
        .first()
        .map(|m| m.name.clone())
        .unwrap_or_else(|| "Multiple Markets".to_string());

    Some(SourceQuote {
        price_per_kg: avg,
        market,
        state: state.to_string(),
        confidence: CONFIDENCE,
        timestamp: now_rfc3339(),
        markets,
    })
}

#[async_trait]
impl PriceSource for DataGovSource {
    fn name(&self) -> &str {
        "data.gov.in API"
    }

    fn priority(&self) -> u8 {
        1
    }

    async fn fetch_price(
        &self,
        crop: &str,
        state: &str,
    ) -> Result<Option<SourceQuote>, MandiError> {
        if let Some(cached) = self.cache.get(crop, state) {
            log::debug!("data.gov.in cache hit for {} in {}", crop, state);
            return Ok(Some(cached));
        }

        // A failure on one alias must not abort the rest of the list.
        for commodity in commodity_aliases(crop) {
            match self.fetch_alias(&commodity, state).await {
                Ok(Some(quote)) => {
                    self.cache.put(crop, state, quote.clone());
                    return Ok(Some(quote));
                }
                Ok(None) => {
                    log::debug!("no data.gov.in records for {}", commodity);
                }
                Err(e) => {
                    log::warn!("data.gov.in fetch failed for {}: {}", commodity, e);
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport stub that serves canned bodies by URL substring and counts
    /// every call.
    struct StubTransport {
        routes: Vec<(&'static str, String)>,
        calls: AtomicUsize,
    }

    impl StubTransport {
        fn new(routes: Vec<(&'static str, String)>) -> Self {
            Self {
                routes,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for StubTransport {
        async fn get(&self, url: &str) -> Result<String, MandiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for (fragment, body) in &self.routes {
                if url.contains(fragment) {
                    return Ok(body.clone());
                }
            }
            Err(MandiError::ApiError(format!("no route for {}", url)))
        }
    }

    fn wheat_body() -> String {
        serde_json::json!({
            "records": [
                {"commodity": "Wheat", "market": "Pune", "district": "Pune",
                 "modal_price": "2500", "unit": "Quintal", "arrival_date": "22/08/2026"},
                {"commodity": "Wheat", "market": "Nashik", "district": "Nashik",
                 "modal_price": "2600", "unit": "Quintal", "arrival_date": "22/08/2026"},
                {"commodity": "Wheat", "market": "Nagpur", "district": "Nagpur",
                 "modal_price": "2550", "unit": "Quintal", "arrival_date": "22/08/2026"}
            ]
        })
        .to_string()
    }

    fn source_with(routes: Vec<(&'static str, String)>) -> (Arc<StubTransport>, DataGovSource) {
        let transport = Arc::new(StubTransport::new(routes));
        let source = DataGovSource::with_api_key(transport.clone(), "test-key");
        (transport, source)
    }

    #[tokio::test]
    async fn test_wheat_quintal_average() {
        let (_, source) = source_with(vec![("commodity]=Wheat&", wheat_body())]);

        let quote = source
            .fetch_price("wheat", "Maharashtra")
            .await
            .unwrap()
            .unwrap();

        // round(mean(25.00, 26.00, 25.50), 2)
        assert_eq!(quote.price_per_kg, 25.5);
        assert_eq!(quote.confidence, 95);
        assert_eq!(quote.markets.len(), 3);
        assert_eq!(quote.market, "Pune");
    }

    #[tokio::test]
    async fn test_cache_prevents_second_call_within_ttl() {
        let (transport, source) = source_with(vec![("commodity]=Wheat&", wheat_body())]);

        source.fetch_price("wheat", "Maharashtra").await.unwrap();
        let first_calls = transport.call_count();
        source.fetch_price("wheat", "Maharashtra").await.unwrap();

        assert_eq!(transport.call_count(), first_calls);
        assert_eq!(first_calls, 1);
    }

    #[tokio::test]
    async fn test_expired_cache_triggers_refetch() {
        let transport = Arc::new(StubTransport::new(vec![(
            "commodity]=Wheat&",
            wheat_body(),
        )]));
        let source = DataGovSource::with_api_key(transport.clone(), "test-key")
            .with_cache_ttl(Duration::from_millis(10));

        source.fetch_price("wheat", "Maharashtra").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        source.fetch_price("wheat", "Maharashtra").await.unwrap();

        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_alias_fallthrough_after_empty_result() {
        // First alias returns no records, second succeeds.
        let empty = serde_json::json!({"records": []}).to_string();
        let (transport, source) = source_with(vec![
            ("commodity]=Wheat&", empty),
            ("Wheat%20%28Dara%29", wheat_body()),
        ]);

        let quote = source
            .fetch_price("wheat", "Maharashtra")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quote.price_per_kg, 25.5);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_alias_fallthrough_after_network_error() {
        // No route for the first alias at all; the second still gets tried.
        let (_, source) = source_with(vec![("Wheat%20%28Dara%29", wheat_body())]);

        let quote = source.fetch_price("wheat", "Maharashtra").await.unwrap();
        assert!(quote.is_some());
    }

    #[tokio::test]
    async fn test_all_aliases_exhausted_is_absent() {
        let empty = serde_json::json!({"records": []}).to_string();
        let (_, source) = source_with(vec![("filters", empty)]);

        let quote = source.fetch_price("wheat", "Maharashtra").await.unwrap();
        assert!(quote.is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_rows_dropped() {
        let body = serde_json::json!({
            "records": [
                {"market": "Pune", "modal_price": "0", "unit": "Quintal"},
                {"market": "Mumbai", "modal_price": "5000000", "unit": "Quintal"},
                {"market": "Nashik", "modal_price": "2400", "unit": "Quintal"}
            ]
        })
        .to_string();
        let (_, source) = source_with(vec![("commodity]=Wheat&", body)]);

        let quote = source
            .fetch_price("wheat", "Maharashtra")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quote.price_per_kg, 24.0);
        assert_eq!(quote.markets.len(), 1);
        assert_eq!(quote.markets[0].name, "Nashik");
    }

    #[tokio::test]
    async fn test_markets_deduplicated_and_capped() {
        let records: Vec<serde_json::Value> = (0..10)
            .map(|i| {
                serde_json::json!({
                    // Repeats every 4 names; only 4 unique markets exist.
                    "market": format!("Market {}", i % 4),
                    "modal_price": "2500",
                    "unit": "Quintal"
                })
            })
            .collect();
        let body = serde_json::json!({ "records": records }).to_string();
        let (_, source) = source_with(vec![("commodity]=Wheat&", body)]);

        let quote = source
            .fetch_price("wheat", "Maharashtra")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quote.markets.len(), 4);
        let mut names: Vec<_> = quote.markets.iter().map(|m| m.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_absent_not_error() {
        let (_, source) = source_with(vec![("filters", "<html>not json</html>".to_string())]);

        let quote = source.fetch_price("wheat", "Maharashtra").await.unwrap();
        assert!(quote.is_none());
    }

    #[test]
    fn test_unknown_crop_alias_is_capitalized() {
        assert_eq!(commodity_aliases("dragonfruit"), vec!["Dragonfruit"]);
    }
}
