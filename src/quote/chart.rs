//! Chart-style provider: per-symbol daily chart with meta fields and
//! optional parallel time series.

use serde::Deserialize;
use serde_json::Value;

use super::{finite, Liveness, QuotePayload, LIVE_WINDOW_SECS};
use crate::error::{FetchError, Result};
use crate::utils::serialization::de_opt_f64;

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Cache-key namespace for chart quotes.
pub const CHART_PROVIDER: &str = "yahoo";

/// Market-state marker of the regular trading session.
const REGULAR_SESSION: &str = "REGULAR";

/// Build the daily chart target URL for one symbol.
pub fn chart_url(symbol: &str) -> String {
    format!("{CHART_ENDPOINT}/{symbol}?interval=1d&range=1d")
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartNode,
}

#[derive(Debug, Deserialize)]
struct ChartNode {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

// Numeric meta fields go through the flexible deserializer: bodies that
// crossed a text-wrapping relay occasionally re-encode numbers as strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice", deserialize_with = "de_opt_f64")]
    regular_market_price: Option<f64>,
    #[serde(rename = "chartPreviousClose", deserialize_with = "de_opt_f64")]
    chart_previous_close: Option<f64>,
    #[serde(rename = "previousClose", deserialize_with = "de_opt_f64")]
    previous_close: Option<f64>,
    #[serde(rename = "regularMarketDayHigh", deserialize_with = "de_opt_f64")]
    regular_market_day_high: Option<f64>,
    #[serde(rename = "regularMarketDayLow", deserialize_with = "de_opt_f64")]
    regular_market_day_low: Option<f64>,
    #[serde(rename = "regularMarketTime")]
    regular_market_time: Option<i64>,
    #[serde(rename = "marketState")]
    market_state: Option<String>,
    #[serde(rename = "marketCap", deserialize_with = "de_opt_f64")]
    market_cap: Option<f64>,
    #[serde(rename = "regularMarketVolume", deserialize_with = "de_opt_f64")]
    regular_market_volume: Option<f64>,
    #[serde(rename = "trailingPE", deserialize_with = "de_opt_f64")]
    trailing_pe: Option<f64>,
    #[serde(rename = "fiftyTwoWeekHigh", deserialize_with = "de_opt_f64")]
    fifty_two_week_high: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Indicators {
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteSeries {
    close: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
}

fn last_finite(series: &[Option<f64>]) -> Option<f64> {
    series
        .iter()
        .rev()
        .flatten()
        .copied()
        .find(|v| v.is_finite())
}

/// Normalize a chart payload for `symbol`.
///
/// Price comes from `regularMarketPrice`, falling back to the last finite
/// close in the parallel series; anything non-finite or not above zero is
/// rejected as no-data. Percent change is computed against the previous
/// close (0 when there is none). The quote counts as live when the market
/// state is the regular session or the market timestamp is within
/// [`LIVE_WINDOW_SECS`] of `now_unix`.
pub fn normalize_chart(payload: &Value, symbol: &str, now_unix: i64) -> Result<QuotePayload> {
    let envelope = ChartEnvelope::deserialize(payload)
        .map_err(|e| FetchError::Parse(format!("{symbol}: unexpected chart shape: {e}")))?;
    let result = envelope
        .chart
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.remove(0))
            }
        })
        .ok_or_else(|| FetchError::NoData(symbol.to_string()))?;

    let meta = result.meta;
    let series = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .unwrap_or_default();

    let price = finite(meta.regular_market_price)
        .or_else(|| last_finite(&series.close))
        .filter(|p| *p > 0.0)
        .ok_or_else(|| FetchError::NoData(symbol.to_string()))?;

    let previous_close = finite(meta.chart_previous_close).or(finite(meta.previous_close));
    let change_percent = match previous_close {
        Some(prev) if prev != 0.0 => (price - prev) / prev * 100.0,
        _ => 0.0,
    };

    let market_time = meta.regular_market_time;
    let in_window = market_time
        .map(|t| (now_unix - t).abs() <= LIVE_WINDOW_SECS)
        .unwrap_or(false);
    let liveness = if meta.market_state.as_deref() == Some(REGULAR_SESSION) || in_window {
        Liveness::Live
    } else {
        Liveness::Stale
    };

    Ok(QuotePayload {
        price,
        previous_close,
        change_percent: Some(change_percent),
        day_high: finite(meta.regular_market_day_high).or_else(|| last_finite(&series.high)),
        day_low: finite(meta.regular_market_day_low).or_else(|| last_finite(&series.low)),
        market_time,
        liveness,
        market_cap: finite(meta.market_cap),
        volume: finite(meta.regular_market_volume),
        trailing_pe: finite(meta.trailing_pe),
        fifty_two_week_high: finite(meta.fifty_two_week_high),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn chart(meta: Value) -> Value {
        json!({"chart": {"result": [{"meta": meta}]}})
    }

    #[test]
    fn url_targets_the_daily_chart() {
        assert_eq!(
            chart_url("AAPL"),
            "https://query1.finance.yahoo.com/v8/finance/chart/AAPL?interval=1d&range=1d"
        );
        assert!(chart_url("^GSPC").contains("/chart/^GSPC?"));
    }

    #[test]
    fn meta_price_and_previous_close_give_exact_change_percent() {
        let payload = chart(json!({
            "regularMarketPrice": 150.23,
            "chartPreviousClose": 148.00,
        }));
        let quote = normalize_chart(&payload, "AAPL", NOW).unwrap();
        assert_eq!(quote.price, 150.23);
        assert_eq!(quote.previous_close, Some(148.0));
        let expected = (150.23 - 148.0) / 148.0 * 100.0;
        assert!((quote.change_percent.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn change_percent_is_zero_without_a_previous_close() {
        let payload = chart(json!({"regularMarketPrice": 99.0}));
        let quote = normalize_chart(&payload, "X", NOW).unwrap();
        assert_eq!(quote.change_percent, Some(0.0));

        let payload = chart(json!({"regularMarketPrice": 99.0, "chartPreviousClose": 0.0}));
        let quote = normalize_chart(&payload, "X", NOW).unwrap();
        assert_eq!(quote.change_percent, Some(0.0));
    }

    #[test]
    fn price_falls_back_to_the_last_finite_close() {
        let payload = json!({"chart": {"result": [{
            "meta": {"chartPreviousClose": 100.0},
            "indicators": {"quote": [{"close": [101.0, 102.5, null]}]},
        }]}});
        let quote = normalize_chart(&payload, "GC=F", NOW).unwrap();
        assert_eq!(quote.price, 102.5);
    }

    #[test]
    fn missing_or_non_positive_prices_are_no_data() {
        for meta in [json!({}), json!({"regularMarketPrice": 0.0}), json!({"regularMarketPrice": -4.0})] {
            assert!(matches!(
                normalize_chart(&chart(meta), "X", NOW),
                Err(FetchError::NoData(_))
            ));
        }
    }

    #[test]
    fn day_range_prefers_meta_and_falls_back_to_series() {
        let payload = json!({"chart": {"result": [{
            "meta": {"regularMarketPrice": 10.0, "regularMarketDayHigh": 11.0},
            "indicators": {"quote": [{"high": [10.8, null], "low": [9.5, 9.4]}]},
        }]}});
        let quote = normalize_chart(&payload, "X", NOW).unwrap();
        assert_eq!(quote.day_high, Some(11.0));
        assert_eq!(quote.day_low, Some(9.4));
    }

    #[test]
    fn regular_session_or_fresh_timestamp_counts_as_live() {
        let payload = chart(json!({
            "regularMarketPrice": 10.0,
            "marketState": "REGULAR",
            "regularMarketTime": NOW - 7200,
        }));
        let quote = normalize_chart(&payload, "X", NOW).unwrap();
        assert_eq!(quote.liveness, Liveness::Live);

        let payload = chart(json!({
            "regularMarketPrice": 10.0,
            "marketState": "CLOSED",
            "regularMarketTime": NOW - 60,
        }));
        let quote = normalize_chart(&payload, "X", NOW).unwrap();
        assert_eq!(quote.liveness, Liveness::Live);

        let payload = chart(json!({
            "regularMarketPrice": 10.0,
            "marketState": "CLOSED",
            "regularMarketTime": NOW - 7200,
        }));
        let quote = normalize_chart(&payload, "X", NOW).unwrap();
        assert_eq!(quote.liveness, Liveness::Stale);
    }

    #[test]
    fn string_encoded_numbers_still_normalize() {
        let payload = chart(json!({
            "regularMarketPrice": "150.23",
            "chartPreviousClose": "148.00",
            "marketCap": "2400000000000",
        }));
        let quote = normalize_chart(&payload, "AAPL", NOW).unwrap();
        assert_eq!(quote.price, 150.23);
        assert_eq!(quote.market_cap, Some(2.4e12));
    }

    #[test]
    fn malformed_and_empty_envelopes_fail_cleanly() {
        let err = normalize_chart(&json!({"unexpected": true}), "X", NOW).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));

        let err = normalize_chart(&json!({"chart": {"result": null}}), "X", NOW).unwrap_err();
        assert!(matches!(err, FetchError::NoData(_)));

        let err = normalize_chart(&json!({"chart": {"result": []}}), "X", NOW).unwrap_err();
        assert!(matches!(err, FetchError::NoData(_)));
    }
}
