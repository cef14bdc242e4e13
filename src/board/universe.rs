//! Page identity, widget registries, and the fixed DOM selector contract.

use crate::cache::CachedFields;
use crate::quote::chart::CHART_PROVIDER;
use crate::quote::spot::SPOT_PROVIDER;
use crate::quote::QuotePayload;

/// Which page of the site is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    Crypto,
    Equities,
    Indices,
    Commodities,
}

impl Page {
    /// Derive the page from a location path; only the last segment counts.
    /// Unknown segments fall back to the landing page.
    pub fn from_path(path: &str) -> Page {
        let segment = path
            .split(['?', '#'])
            .next()
            .unwrap_or("")
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        let name = segment.strip_suffix(".html").unwrap_or(&segment);
        match name {
            "krypto" | "crypto" => Page::Crypto,
            "aktien" | "stocks" => Page::Equities,
            "indizes" | "indices" => Page::Indices,
            "rohstoffe" | "commodities" => Page::Commodities,
            _ => Page::Landing,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Page::Landing => "landing",
            Page::Crypto => "krypto",
            Page::Equities => "aktien",
            Page::Indices => "indizes",
            Page::Commodities => "rohstoffe",
        }
    }
}

/// Secondary stat slot shown beneath a widget's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatSlot {
    MarketCap,
    Volume,
    TrailingPe,
    DayHigh,
    DayLow,
    FiftyTwoWeekHigh,
}

impl StatSlot {
    /// Value of the `data-stat` attribute identifying the slot.
    pub fn data_name(&self) -> &'static str {
        match self {
            StatSlot::MarketCap => "market-cap",
            StatSlot::Volume => "volume",
            StatSlot::TrailingPe => "trailing-pe",
            StatSlot::DayHigh => "day-high",
            StatSlot::DayLow => "day-low",
            StatSlot::FiftyTwoWeekHigh => "52w-high",
        }
    }

    /// Pull the slot's value out of a normalized quote.
    pub fn value_of(&self, quote: &QuotePayload) -> Option<f64> {
        match self {
            StatSlot::MarketCap => quote.market_cap,
            StatSlot::Volume => quote.volume,
            StatSlot::TrailingPe => quote.trailing_pe,
            StatSlot::DayHigh => quote.day_high,
            StatSlot::DayLow => quote.day_low,
            StatSlot::FiftyTwoWeekHigh => quote.fifty_two_week_high,
        }
    }

    /// Same lookup against cached fields.
    pub fn value_of_cached(&self, fields: &CachedFields) -> Option<f64> {
        match self {
            StatSlot::MarketCap => fields.market_cap,
            StatSlot::Volume => fields.volume,
            StatSlot::TrailingPe => fields.trailing_pe,
            StatSlot::DayHigh => fields.day_high,
            StatSlot::DayLow => fields.day_low,
            StatSlot::FiftyTwoWeekHigh => fields.fifty_two_week_high,
        }
    }

    /// Magnitude-style slots compress to suffixed strings; the rest are
    /// plain amounts.
    pub fn wants_magnitude(&self) -> bool {
        matches!(self, StatSlot::MarketCap | StatSlot::Volume)
    }
}

/// One on-page widget: a provider symbol bound to a card subtree.
#[derive(Debug, Clone, Copy)]
pub struct Widget {
    /// Provider-side symbol ("bitcoin", "AAPL", "^GSPC", "GC=F").
    pub symbol: &'static str,
    /// Short on-page ticker label.
    pub ticker: &'static str,
    card_class: &'static str,
    value_class: &'static str,
}

impl Widget {
    const fn new(
        symbol: &'static str,
        ticker: &'static str,
        card_class: &'static str,
        value_class: &'static str,
    ) -> Self {
        Self {
            symbol,
            ticker,
            card_class,
            value_class,
        }
    }

    pub fn card_selector(&self) -> String {
        format!(".{}[data-symbol=\"{}\"]", self.card_class, self.symbol)
    }

    pub fn value_selector(&self) -> String {
        format!("{} .{}", self.card_selector(), self.value_class)
    }

    pub fn badge_selector(&self) -> String {
        format!("{} .badge", self.card_selector())
    }

    /// Status element; the document adapter creates it on demand.
    pub fn status_selector(&self) -> String {
        format!("{} .live-status", self.card_selector())
    }

    pub fn stat_selector(&self, stat: StatSlot) -> String {
        format!(
            "{} .stat-value[data-stat=\"{}\"]",
            self.card_selector(),
            stat.data_name()
        )
    }
}

const CRYPTO_WIDGETS: &[Widget] = &[
    Widget::new("bitcoin", "BTC", "crypto-card", "crypto-price"),
    Widget::new("ethereum", "ETH", "crypto-card", "crypto-price"),
    Widget::new("solana", "SOL", "crypto-card", "crypto-price"),
    Widget::new("binancecoin", "BNB", "crypto-card", "crypto-price"),
    Widget::new("ripple", "XRP", "crypto-card", "crypto-price"),
    Widget::new("cardano", "ADA", "crypto-card", "crypto-price"),
];

const EQUITY_WIDGETS: &[Widget] = &[
    Widget::new("AAPL", "Apple", "stock-card", "stock-price"),
    Widget::new("MSFT", "Microsoft", "stock-card", "stock-price"),
    Widget::new("NVDA", "Nvidia", "stock-card", "stock-price"),
    Widget::new("AMZN", "Amazon", "stock-card", "stock-price"),
    Widget::new("GOOGL", "Alphabet", "stock-card", "stock-price"),
    Widget::new("META", "Meta", "stock-card", "stock-price"),
    Widget::new("TSLA", "Tesla", "stock-card", "stock-price"),
    Widget::new("SAP", "SAP", "stock-card", "stock-price"),
];

const INDEX_WIDGETS: &[Widget] = &[
    Widget::new("^GSPC", "S&P 500", "index-card", "index-value"),
    Widget::new("^DJI", "Dow Jones", "index-card", "index-value"),
    Widget::new("^IXIC", "Nasdaq", "index-card", "index-value"),
    Widget::new("^GDAXI", "DAX", "index-card", "index-value"),
    Widget::new("^FTSE", "FTSE 100", "index-card", "index-value"),
    Widget::new("^N225", "Nikkei 225", "index-card", "index-value"),
];

const COMMODITY_WIDGETS: &[Widget] = &[
    Widget::new("GC=F", "Gold", "futures-card", "futures-price"),
    Widget::new("SI=F", "Silber", "futures-card", "futures-price"),
    Widget::new("CL=F", "WTI Öl", "futures-card", "futures-price"),
    Widget::new("BZ=F", "Brent Öl", "futures-card", "futures-price"),
    Widget::new("NG=F", "Erdgas", "futures-card", "futures-price"),
    Widget::new("HG=F", "Kupfer", "futures-card", "futures-price"),
];

/// Widgets bound on a page. The landing page owns no widgets of its own;
/// it previews the crypto and index pipelines instead.
pub fn widgets_for(page: Page) -> &'static [Widget] {
    match page {
        Page::Landing => &[],
        Page::Crypto => CRYPTO_WIDGETS,
        Page::Equities => EQUITY_WIDGETS,
        Page::Indices => INDEX_WIDGETS,
        Page::Commodities => COMMODITY_WIDGETS,
    }
}

/// Stat slots rendered for widgets of a page.
pub fn stats_for(page: Page) -> &'static [StatSlot] {
    match page {
        Page::Landing => &[],
        Page::Crypto => &[StatSlot::MarketCap, StatSlot::Volume],
        Page::Equities => &[StatSlot::MarketCap, StatSlot::TrailingPe],
        Page::Indices => &[StatSlot::DayHigh, StatSlot::DayLow],
        Page::Commodities => &[StatSlot::DayHigh, StatSlot::DayLow, StatSlot::FiftyTwoWeekHigh],
    }
}

/// Cache-key namespace of the provider serving a page.
pub fn provider_for(page: Page) -> &'static str {
    match page {
        Page::Crypto => SPOT_PROVIDER,
        _ => CHART_PROVIDER,
    }
}

/// Crypto prices carry a dollar prefix; chart values render plain.
pub fn uses_usd_prices(page: Page) -> bool {
    page == Page::Crypto
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_identity_comes_from_the_last_path_segment() {
        assert_eq!(Page::from_path("/site/krypto.html"), Page::Crypto);
        assert_eq!(Page::from_path("aktien.html?ref=nav"), Page::Equities);
        assert_eq!(Page::from_path("/indizes.html#dax"), Page::Indices);
        assert_eq!(Page::from_path("/de/rohstoffe"), Page::Commodities);
        assert_eq!(Page::from_path("/index.html"), Page::Landing);
        assert_eq!(Page::from_path(""), Page::Landing);
        assert_eq!(Page::from_path("/kontakt.html"), Page::Landing);
    }

    #[test]
    fn selectors_follow_the_dom_contract() {
        let bitcoin = &widgets_for(Page::Crypto)[0];
        assert_eq!(
            bitcoin.card_selector(),
            ".crypto-card[data-symbol=\"bitcoin\"]"
        );
        assert_eq!(
            bitcoin.value_selector(),
            ".crypto-card[data-symbol=\"bitcoin\"] .crypto-price"
        );
        assert_eq!(
            bitcoin.badge_selector(),
            ".crypto-card[data-symbol=\"bitcoin\"] .badge"
        );
        assert_eq!(
            bitcoin.stat_selector(StatSlot::MarketCap),
            ".crypto-card[data-symbol=\"bitcoin\"] .stat-value[data-stat=\"market-cap\"]"
        );

        let gold = &widgets_for(Page::Commodities)[0];
        assert_eq!(gold.card_selector(), ".futures-card[data-symbol=\"GC=F\"]");
        let spx = &widgets_for(Page::Indices)[0];
        assert_eq!(
            spx.value_selector(),
            ".index-card[data-symbol=\"^GSPC\"] .index-value"
        );
    }

    #[test]
    fn providers_split_spot_from_chart_pages() {
        assert_eq!(provider_for(Page::Crypto), "coingecko");
        assert_eq!(provider_for(Page::Equities), "yahoo");
        assert_eq!(provider_for(Page::Indices), "yahoo");
        assert!(uses_usd_prices(Page::Crypto));
        assert!(!uses_usd_prices(Page::Commodities));
    }
}
