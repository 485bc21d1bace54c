//! Price unit normalization
//!
//! Upstream datasets quote prices per quintal, per tonne or per kg depending
//! on the market. Everything downstream works in rupees per kilogram.

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a raw price to a per-kilogram basis
///
/// Unit strings containing "quintal" are divided by 100, "ton"/"tonne" by
/// 1000, anything else is assumed to already be per kg. Matching is
/// case-insensitive. Callers must reject non-numeric values before calling.
pub fn to_per_kg(value: f64, unit: &str) -> f64 {
    let unit_lower = unit.to_lowercase();
    if unit_lower.contains("quintal") {
        round2(value / 100.0)
    } else if unit_lower.contains("ton") {
        round2(value / 1000.0)
    } else {
        round2(value)
    }
}
