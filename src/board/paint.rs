//! Pure computation of display patches for a page's widgets.
//!
//! Three passes over the same targets: placeholder seeding, cache paint,
//! and live paint. None of them fabricates a value: a field that is absent
//! simply produces no patch, leaving the placeholder glyph in place.

use chrono::Utc;

use crate::board::universe::{
    provider_for, stats_for, uses_usd_prices, widgets_for, Page, Widget,
};
use crate::cache::{cache_key, CacheEntry, CacheStore};
use crate::format::{
    asof_from_ms, format_amount, format_magnitude, format_percent, format_usd, ASOF_PREFIX,
    LIVE_LABEL, LOADING_LABEL, PLACEHOLDER_GLYPH,
};
use crate::quote::{Liveness, QuotePayload};
use crate::render::{DisplayPatch, PatchField, Readiness, BODY_SELECTOR};

/// Body-class patch for the page readiness signal.
pub fn readiness_patch(readiness: Readiness) -> DisplayPatch {
    DisplayPatch::new(BODY_SELECTOR, PatchField::BodyClass, readiness.class())
}

/// Seed every widget of `page` with the neutral glyph. The sink captures
/// each element's original text on the first pass.
pub fn prepare_placeholders(page: Page) -> Vec<DisplayPatch> {
    let mut patches = Vec::new();
    for widget in widgets_for(page) {
        patches.push(DisplayPatch::new(
            widget.value_selector(),
            PatchField::Placeholder,
            PLACEHOLDER_GLYPH,
        ));
        patches.push(DisplayPatch::new(
            widget.badge_selector(),
            PatchField::Placeholder,
            PLACEHOLDER_GLYPH,
        ));
        for stat in stats_for(page) {
            patches.push(DisplayPatch::new(
                widget.stat_selector(*stat),
                PatchField::Placeholder,
                PLACEHOLDER_GLYPH,
            ));
        }
    }
    patches
}

/// Paint every widget of `page` from the cache. Widgets without a (fresh)
/// entry get a loading status and keep their placeholders; cached values
/// are written with a cache-sourced as-of status, never a live one.
pub fn paint_from_cache(page: Page, cache: &CacheStore) -> Vec<DisplayPatch> {
    let provider = provider_for(page);
    let mut patches = Vec::new();
    for widget in widgets_for(page) {
        match cache.get_entry(&cache_key(provider, widget.symbol)) {
            None => {
                patches.push(DisplayPatch::new(
                    widget.status_selector(),
                    PatchField::StatusText,
                    LOADING_LABEL,
                ));
                patches.push(DisplayPatch::new(
                    widget.status_selector(),
                    PatchField::StatusTone,
                    "loading",
                ));
            }
            Some(entry) => patches.extend(cache_patches(page, widget, &entry)),
        }
    }
    patches
}

fn cache_patches(page: Page, widget: &Widget, entry: &CacheEntry) -> Vec<DisplayPatch> {
    let mut patches = Vec::new();
    if let Some(price) = entry.fields.price {
        patches.push(DisplayPatch::new(
            widget.value_selector(),
            PatchField::Text,
            price_text(page, price),
        ));
    }
    if let Some(change) = entry.fields.change_percent {
        let (text, tone) = format_percent(change);
        patches.push(DisplayPatch::new(
            widget.badge_selector(),
            PatchField::BadgeText,
            text,
        ));
        patches.push(DisplayPatch::new(
            widget.badge_selector(),
            PatchField::BadgeTone,
            tone.as_class(),
        ));
    }
    for stat in stats_for(page) {
        let value = if stat.wants_magnitude() {
            stat.value_of_cached(&entry.fields).map(format_magnitude)
        } else {
            stat.value_of_cached(&entry.fields).map(format_amount)
        };
        if let Some(text) = value {
            patches.push(DisplayPatch::new(
                widget.stat_selector(*stat),
                PatchField::Text,
                text,
            ));
        }
    }
    patches.push(DisplayPatch::new(
        widget.status_selector(),
        PatchField::StatusText,
        format!("{ASOF_PREFIX} {}", asof_from_ms(entry.captured_at_ms)),
    ));
    patches.push(DisplayPatch::new(
        widget.status_selector(),
        PatchField::StatusTone,
        "cache",
    ));
    patches.push(DisplayPatch::new(
        widget.card_selector(),
        PatchField::UpdateSource,
        "cache",
    ));
    patches
}

/// Paint one widget from a live quote.
pub fn paint_quote(page: Page, widget: &Widget, quote: &QuotePayload) -> Vec<DisplayPatch> {
    let mut patches = vec![DisplayPatch::new(
        widget.value_selector(),
        PatchField::Text,
        price_text(page, quote.price),
    )];

    if let Some(change) = quote.change_percent {
        let (text, tone) = format_percent(change);
        patches.push(DisplayPatch::new(
            widget.badge_selector(),
            PatchField::BadgeText,
            text,
        ));
        patches.push(DisplayPatch::new(
            widget.badge_selector(),
            PatchField::BadgeTone,
            tone.as_class(),
        ));
    }

    for stat in stats_for(page) {
        if let Some(value) = stat.value_of(quote) {
            let text = if stat.wants_magnitude() {
                format_magnitude(value)
            } else {
                format_amount(value)
            };
            patches.push(DisplayPatch::new(
                widget.stat_selector(*stat),
                PatchField::Text,
                text,
            ));
        }
    }

    let (status_text, status_tone) = match quote.liveness {
        Liveness::Live => (LIVE_LABEL.to_string(), "live"),
        Liveness::Stale => {
            let asof = quote
                .market_time
                .map(|t| asof_from_ms(t * 1000))
                .unwrap_or_else(|| asof_from_ms(Utc::now().timestamp_millis()));
            (format!("{ASOF_PREFIX} {asof}"), "stale")
        }
    };
    patches.push(DisplayPatch::new(
        widget.status_selector(),
        PatchField::StatusText,
        status_text,
    ));
    patches.push(DisplayPatch::new(
        widget.status_selector(),
        PatchField::StatusTone,
        status_tone,
    ));
    patches.push(DisplayPatch::new(
        widget.card_selector(),
        PatchField::UpdateSource,
        "live",
    ));
    patches
}

fn price_text(page: Page, price: f64) -> String {
    if uses_usd_prices(page) {
        format_usd(price)
    } else {
        format_amount(price)
    }
}
