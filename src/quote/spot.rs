//! Spot-price provider: batched simple-price quotes keyed by asset id.

use reqwest::Url;
use serde_json::Value;

use super::{finite, Liveness, QuotePayload};
use crate::error::{FetchError, Result};

const SPOT_PRICE_ENDPOINT: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Cache-key namespace for spot quotes.
pub const SPOT_PROVIDER: &str = "coingecko";

/// Build the batched simple-price target URL for a set of asset ids.
pub fn spot_price_url(ids: &[&str]) -> String {
    let mut url = Url::parse(SPOT_PRICE_ENDPOINT).expect("valid url");
    url.query_pairs_mut()
        .append_pair("ids", &ids.join(","))
        .append_pair("vs_currencies", "usd")
        .append_pair("include_24hr_change", "true")
        .append_pair("include_market_cap", "true")
        .append_pair("include_24hr_vol", "true");
    url.to_string()
}

/// Extract the quote for one asset id from a batched simple-price payload.
///
/// The `usd` price is required; change, market cap, and volume ride along
/// when present and finite. Spot prices are current by construction, so the
/// result is always live.
pub fn normalize_spot(payload: &Value, id: &str) -> Result<QuotePayload> {
    let record = payload
        .get(id)
        .ok_or_else(|| FetchError::NoData(id.to_string()))?;
    let price = finite(record.get("usd").and_then(Value::as_f64))
        .ok_or_else(|| FetchError::NoData(id.to_string()))?;

    Ok(QuotePayload {
        price,
        previous_close: None,
        change_percent: finite(record.get("usd_24h_change").and_then(Value::as_f64)),
        day_high: None,
        day_low: None,
        market_time: None,
        liveness: Liveness::Live,
        market_cap: finite(record.get("usd_market_cap").and_then(Value::as_f64)),
        volume: finite(record.get("usd_24h_vol").and_then(Value::as_f64)),
        trailing_pe: None,
        fifty_two_week_high: None,
    })
}
