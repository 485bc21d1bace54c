//! Historical trend and market comparison synthesis
//!
//! Chart filler, not forecasting. Live sources rarely provide a usable
//! price history, so the chart gets a procedurally generated series anchored
//! on the current price, shaped by per-crop volatility and trend
//! coefficients. The RNG is seedable so tests are deterministic.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::sync::Mutex;

use crate::models::{MarketComparison, MarketQuote, HISTORY_LEN, MAX_MARKETS};
use crate::units::round2;

/// Fallback coefficients for crops not in the tables
const DEFAULT_VOLATILITY: f64 = 0.12;
const DEFAULT_TREND: f64 = 0.0;

/// Regional markets and their static price multipliers, used when a source
/// brings no per-market rows
const COMPARISON_MARKETS: &[(&str, f64)] = &[
    ("Mumbai APMC", 1.10),
    ("Pune APMC", 1.00),
    ("Nashik APMC", 0.95),
    ("Nagpur APMC", 1.05),
    ("Aurangabad APMC", 1.08),
];

/// How much a crop's price fluctuates week to week
fn volatility(crop: &str) -> f64 {
    match crop.to_lowercase().as_str() {
        "tomato" => 0.25,
        "onion" => 0.20,
        "potato" => 0.15,
        "rice" => 0.10,
        "wheat" => 0.08,
        "cotton" => 0.12,
        "sugarcane" => 0.06,
        "mango" => 0.18,
        "banana" => 0.12,
        "apple" => 0.14,
        _ => DEFAULT_VOLATILITY,
    }
}

/// Seasonal drift per week, positive means prices have been rising
fn trend(crop: &str) -> f64 {
    match crop.to_lowercase().as_str() {
        "tomato" => 0.05,
        "onion" => -0.03,
        "potato" => 0.02,
        "rice" => 0.04,
        "wheat" => 0.06,
        "cotton" => -0.02,
        "sugarcane" => 0.03,
        "mango" => 0.08,
        "banana" => 0.01,
        "apple" => 0.025,
        _ => DEFAULT_TREND,
    }
}

fn format_change(pct: f64) -> String {
    format!("{}{:.1}%", if pct >= 0.0 { "+" } else { "" }, pct)
}

/// Generates illustrative historical series and market comparisons
pub struct Synthesizer {
    rng: Mutex<StdRng>,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fixed-seed constructor for deterministic output
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Synthesize an 8-point weekly series, oldest first, anchored so the
    /// final point equals `current_price` exactly. Points are bounded to
    /// [0.5, 1.5] times the current price.
    pub fn historical(&self, current_price: f64, crop: &str) -> Vec<f64> {
        let vol = volatility(crop);
        let drift = trend(crop);
        let mut rng = self.rng.lock().expect("rng lock poisoned");

        let noise = Normal::new(0.0, (vol * current_price).max(f64::MIN_POSITIVE))
            .expect("valid normal distribution");

        let mut prices = Vec::with_capacity(HISTORY_LEN);
        for i in (0..HISTORY_LEN).rev() {
            if i == 0 {
                prices.push(current_price);
                continue;
            }

            let weeks_back = i as f64;
            let trend_effect = drift * weeks_back * current_price;
            let noise_effect = noise.sample(&mut *rng);
            let seasonal_effect =
                (weeks_back * 0.5).sin() * vol * 0.5 * current_price;

            let value = current_price - trend_effect + noise_effect + seasonal_effect;
            let bounded = value.clamp(current_price * 0.5, current_price * 1.5);
            prices.push(round2(bounded));
        }

        prices
    }

    /// Synthetic comparison across the fixed regional market list
    pub fn comparison(&self, base_price: f64) -> Vec<MarketComparison> {
        COMPARISON_MARKETS
            .iter()
            .map(|(market, multiplier)| MarketComparison {
                market: market.to_string(),
                price_per_kg: round2(base_price * multiplier),
                change: format_change((multiplier - 1.0) * 100.0),
            })
            .collect()
    }

    /// Format real per-market rows for display, change relative to the
    /// aggregate price
    pub fn format_comparison(
        &self,
        markets: &[MarketQuote],
        base_price: f64,
    ) -> Vec<MarketComparison> {
        markets
            .iter()
            .take(MAX_MARKETS)
            .map(|m| {
                let pct = if base_price > 0.0 {
                    (m.price_per_kg - base_price) / base_price * 100.0
                } else {
                    0.0
                };
                MarketComparison {
                    market: m.name.clone(),
                    price_per_kg: m.price_per_kg,
                    change: format_change(pct),
                }
            })
            .collect()
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}
