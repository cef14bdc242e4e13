//! Normalized quote payloads and the per-provider normalizers.

pub mod chart;
pub mod spot;

use crate::cache::CachedFields;

/// A market timestamp within this window of "now" still counts as live.
pub const LIVE_WINDOW_SECS: i64 = 180;

/// Whether a quote may be presented with a live indicator or only with an
/// as-of label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live,
    Stale,
}

/// Normalized numeric snapshot for one traded symbol. Every numeric field
/// is finite or absent; NaN and infinities never leave the normalizers.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotePayload {
    pub price: f64,
    pub previous_close: Option<f64>,
    pub change_percent: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    /// Unix seconds of the provider's market timestamp.
    pub market_time: Option<i64>,
    pub liveness: Liveness,
    pub market_cap: Option<f64>,
    pub volume: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
}

impl QuotePayload {
    /// Subset of fields worth remembering between sessions.
    pub fn cache_fields(&self) -> CachedFields {
        CachedFields {
            price: Some(self.price),
            change_percent: self.change_percent,
            day_high: self.day_high,
            day_low: self.day_low,
            market_cap: self.market_cap,
            volume: self.volume,
            trailing_pe: self.trailing_pe,
            fifty_two_week_high: self.fifty_two_week_high,
        }
    }
}

/// Drop NaN and infinities before they reach payloads or the cache.
pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
