//! Display formatting for quote values.
//!
//! Pure functions turning finite numbers into the strings widgets show:
//! prices with apostrophe thousands grouping, signed percent badges,
//! magnitude-suffixed market caps and volumes, and short as-of labels.
//! Non-finite input always degrades to the neutral glyph, never to a
//! fabricated value.

use chrono::{DateTime, TimeZone, Utc};

/// Neutral glyph shown while a widget has no real data.
pub const PLACEHOLDER_GLYPH: &str = "—";
/// Status label while the first fetch is still pending.
pub const LOADING_LABEL: &str = "Lädt…";
/// Status label for a quote inside the live window.
pub const LIVE_LABEL: &str = "Live";
/// Prefix for as-of status labels ("Stand 14:05").
pub const ASOF_PREFIX: &str = "Stand";

/// Visual tone of a change badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Flat,
}

impl Tone {
    /// CSS-facing class value for the badge element.
    pub fn as_class(&self) -> &'static str {
        match self {
            Tone::Positive => "positive",
            Tone::Negative => "negative",
            Tone::Flat => "flat",
        }
    }
}

/// Format a number with two decimals and apostrophe thousands separators,
/// e.g. `67'000.00`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER_GLYPH.to_string();
    }
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(int_part), frac_part)
}

/// `format_amount` with a dollar prefix, e.g. `$67'000.00`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER_GLYPH.to_string();
    }
    format!("${}", format_amount(value))
}

/// Format a percentage change as a signed badge string with its tone.
pub fn format_percent(value: f64) -> (String, Tone) {
    if !value.is_finite() {
        return (PLACEHOLDER_GLYPH.to_string(), Tone::Flat);
    }
    if value > 0.0 {
        (format!("+{:.2}%", value), Tone::Positive)
    } else if value < 0.0 {
        (format!("{:.2}%", value), Tone::Negative)
    } else {
        ("0.00%".to_string(), Tone::Flat)
    }
}

/// Compress a large quantity into a magnitude-suffixed string
/// (`1.23 T`, `456.78 B`, `12.34 M`); smaller values fall back to
/// [`format_amount`].
pub fn format_magnitude(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER_GLYPH.to_string();
    }
    let abs = value.abs();
    if abs >= 1e12 {
        format!("{:.2} T", value / 1e12)
    } else if abs >= 1e9 {
        format!("{:.2} B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2} M", value / 1e6)
    } else {
        format_amount(value)
    }
}

/// Short `HH:MM` label for a capture or market timestamp.
pub fn format_asof(ts: DateTime<Utc>) -> String {
    ts.format("%H:%M").to_string()
}

/// [`format_asof`] from a unix-milliseconds stamp.
pub fn asof_from_ms(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(ts) => format_asof(ts),
        None => PLACEHOLDER_GLYPH.to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push('\'');
        }
        out.push(*b as char);
    }
    out
}
