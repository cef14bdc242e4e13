//! Per-page refresh orchestration.
//!
//! One controller drives one page through the refresh lifecycle:
//! placeholders, cache-first paint, live refresh, then recurring re-refresh.
//! Placeholders and the cache paint happen exactly once per page load; every
//! timer tick afterwards re-enters at the live-refresh step.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::board::paint::{paint_from_cache, paint_quote, prepare_placeholders, readiness_patch};
use crate::board::universe::{widgets_for, Page};
use crate::cache::{cache_key, CacheStore};
use crate::fetch::FetchClient;
use crate::mapper::{map_bounded, CHART_FANOUT_LIMIT};
use crate::quote::chart::{chart_url, normalize_chart, CHART_PROVIDER};
use crate::quote::spot::{normalize_spot, spot_price_url, SPOT_PROVIDER};
use crate::render::{PatchSink, Readiness};

/// Seconds between recurring refreshes.
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// Refresh lifecycle of a page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    PlaceholdersSet,
    CachePainted,
    LiveRefreshing,
    Idle,
}

/// Drives exactly one page's widgets.
pub struct PageController {
    page: Page,
    fetch: FetchClient,
    cache: CacheStore,
    phase: Phase,
}

impl PageController {
    pub fn new(page: Page, fetch: FetchClient, cache: CacheStore) -> Self {
        Self {
            page,
            fetch,
            cache,
            phase: Phase::Init,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run one refresh cycle.
    ///
    /// The first cycle walks `Init → PlaceholdersSet → CachePainted` before
    /// refreshing; later cycles re-enter at `LiveRefreshing` without
    /// re-running the placeholder or cache steps. The landing page skips
    /// the ceremony entirely and fires best-effort crypto and index
    /// previews.
    pub async fn run_cycle(&mut self, sink: &mut dyn PatchSink) {
        if self.page == Page::Landing {
            self.phase = Phase::LiveRefreshing;
            let painted =
                self.refresh_spot(sink).await + self.refresh_charts(Page::Indices, sink).await;
            self.finish_cycle(sink, painted);
            return;
        }

        if self.phase == Phase::Init {
            sink.apply(readiness_patch(Readiness::Loading));
            sink.apply_all(prepare_placeholders(self.page));
            self.phase = Phase::PlaceholdersSet;
            sink.apply_all(paint_from_cache(self.page, &self.cache));
            self.phase = Phase::CachePainted;
        }

        self.phase = Phase::LiveRefreshing;
        let painted = match self.page {
            Page::Crypto => self.refresh_spot(sink).await,
            page => self.refresh_charts(page, sink).await,
        };
        self.finish_cycle(sink, painted);
    }

    fn finish_cycle(&mut self, sink: &mut dyn PatchSink, painted: usize) {
        let readiness = if painted > 0 {
            Readiness::Ready
        } else {
            Readiness::Failed
        };
        sink.apply(readiness_patch(readiness));
        info!(
            page = self.page.slug(),
            painted,
            readiness = readiness.class(),
            "refresh cycle finished"
        );
        self.phase = Phase::Idle;
    }

    /// One batched spot-price call covering every crypto widget. A failure
    /// of the whole call leaves the section unrefreshed for this cycle.
    async fn refresh_spot(&self, sink: &mut dyn PatchSink) -> usize {
        let widgets = widgets_for(Page::Crypto);
        let mut ids: Vec<&str> = Vec::new();
        for widget in widgets {
            if !ids.contains(&widget.symbol) {
                ids.push(widget.symbol);
            }
        }

        let payload = match self.fetch.fetch_json(&spot_price_url(&ids)).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "spot refresh failed, section left unrefreshed");
                return 0;
            }
        };

        let mut painted = 0;
        for widget in widgets {
            match normalize_spot(&payload, widget.symbol) {
                Ok(quote) => {
                    sink.apply_all(paint_quote(Page::Crypto, widget, &quote));
                    self.cache.set_entry(
                        &cache_key(SPOT_PROVIDER, widget.symbol),
                        &quote.cache_fields(),
                    );
                    painted += 1;
                }
                Err(err) => debug!(symbol = widget.symbol, %err, "spot symbol skipped"),
            }
        }
        painted
    }

    /// Bounded fan-out of one chart call per widget; a symbol's failure
    /// never disturbs its siblings.
    async fn refresh_charts(&self, page: Page, sink: &mut dyn PatchSink) -> usize {
        let widgets = widgets_for(page);
        let now = Utc::now().timestamp();

        let quotes = map_bounded(widgets, CHART_FANOUT_LIMIT, |widget, _| {
            let fetch = &self.fetch;
            async move {
                let payload = fetch.fetch_json(&chart_url(widget.symbol)).await?;
                normalize_chart(&payload, widget.symbol, now)
            }
        })
        .await;

        let mut painted = 0;
        for (widget, quote) in widgets.iter().zip(quotes) {
            if let Some(quote) = quote {
                sink.apply_all(paint_quote(page, widget, &quote));
                self.cache.set_entry(
                    &cache_key(CHART_PROVIDER, widget.symbol),
                    &quote.cache_fields(),
                );
                painted += 1;
            }
        }
        painted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryStore};
    use crate::relay::{RelayDescriptor, RelayKind};
    use crate::render::{MemorySink, PatchField};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn relay_serving(body: serde_json::Value) -> (MockServer, FetchClient) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let relay = RelayDescriptor::new(
            "mock",
            RelayKind::RawQueryParam,
            &server.uri(),
            Some("url"),
        );
        let client = FetchClient::with_relays(vec![relay], Duration::from_secs(2));
        (server, client)
    }

    fn controller(page: Page, fetch: FetchClient) -> PageController {
        PageController::new(page, fetch, CacheStore::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn first_cycle_walks_all_phases_and_paints_live_values() {
        let (_server, fetch) = relay_serving(json!({
            "bitcoin": {"usd": 67000.0, "usd_24h_change": -2.3},
            "ethereum": {"usd": 3500.0, "usd_24h_change": 1.2},
        }))
        .await;
        let mut ctl = controller(Page::Crypto, fetch);
        assert_eq!(ctl.phase(), Phase::Init);

        let mut sink = MemorySink::new();
        ctl.run_cycle(&mut sink).await;

        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(sink.body_class(), Some("live-ready"));

        let bitcoin = widgets_for(Page::Crypto)
            .iter()
            .find(|w| w.symbol == "bitcoin")
            .unwrap();
        assert_eq!(sink.text(&bitcoin.value_selector()), Some("$67'000.00"));
        assert_eq!(
            sink.value(&bitcoin.card_selector(), PatchField::UpdateSource),
            Some("live")
        );

        // Symbols missing from the batch keep their placeholder.
        let solana = widgets_for(Page::Crypto)
            .iter()
            .find(|w| w.symbol == "solana")
            .unwrap();
        assert_eq!(sink.text(&solana.value_selector()), Some("—"));
    }

    #[tokio::test]
    async fn later_cycles_skip_the_placeholder_step() {
        let (_server, fetch) = relay_serving(json!({
            "bitcoin": {"usd": 67000.0},
        }))
        .await;
        let mut ctl = controller(Page::Crypto, fetch);
        let mut sink = MemorySink::new();
        ctl.run_cycle(&mut sink).await;

        // Scribble over an unpainted widget; a repeated placeholder pass
        // would reset it to the glyph.
        let solana = widgets_for(Page::Crypto)
            .iter()
            .find(|w| w.symbol == "solana")
            .unwrap();
        sink.apply(crate::render::DisplayPatch::new(
            solana.value_selector(),
            PatchField::Text,
            "scribble",
        ));

        ctl.run_cycle(&mut sink).await;
        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(sink.text(&solana.value_selector()), Some("scribble"));
    }

    #[tokio::test]
    async fn refresh_writes_live_quotes_into_the_cache() {
        let (_server, fetch) = relay_serving(json!({"chart": {"result": [{"meta": {
            "regularMarketPrice": 150.23,
            "chartPreviousClose": 148.00,
            "marketState": "REGULAR",
        }}]}}))
        .await;
        let mut ctl = controller(Page::Equities, fetch);
        let mut sink = MemorySink::new();
        ctl.run_cycle(&mut sink).await;

        assert_eq!(sink.body_class(), Some("live-ready"));
        let entry = ctl.cache.get_entry("yahoo:AAPL").unwrap();
        assert_eq!(entry.fields.price, Some(150.23));
        assert!(entry.captured_at_ms > 0);
    }

    #[tokio::test]
    async fn a_dead_section_signals_failed_and_keeps_placeholders() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let relay = RelayDescriptor::new(
            "mock",
            RelayKind::RawQueryParam,
            &server.uri(),
            Some("url"),
        );
        let fetch = FetchClient::with_relays(vec![relay], Duration::from_secs(2));

        let mut ctl = controller(Page::Indices, fetch);
        let mut sink = MemorySink::new();
        ctl.run_cycle(&mut sink).await;

        assert_eq!(sink.body_class(), Some("live-failed"));
        let spx = &widgets_for(Page::Indices)[0];
        assert_eq!(sink.text(&spx.value_selector()), Some("—"));
        assert_eq!(
            sink.value(&spx.status_selector(), PatchField::StatusText),
            Some("Lädt…")
        );
    }

    #[tokio::test]
    async fn landing_previews_without_placeholder_ceremony() {
        let (_server, fetch) = relay_serving(json!({
            "bitcoin": {"usd": 67000.0},
        }))
        .await;
        let mut ctl = controller(Page::Landing, fetch);
        let mut sink = MemorySink::new();
        ctl.run_cycle(&mut sink).await;

        assert_eq!(ctl.phase(), Phase::Idle);
        // The spot preview painted, so the page counts as ready even though
        // the index preview got an unusable payload.
        assert_eq!(sink.body_class(), Some("live-ready"));
        let bitcoin = widgets_for(Page::Crypto)
            .iter()
            .find(|w| w.symbol == "bitcoin")
            .unwrap();
        assert_eq!(sink.text(&bitcoin.value_selector()), Some("$67'000.00"));
        // No placeholder pass ran for the index widgets.
        let spx = &widgets_for(Page::Indices)[0];
        assert_eq!(sink.text(&spx.value_selector()), None);
    }
}
