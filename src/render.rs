//! Display patches and the sinks that consume them.
//!
//! The painting code never touches a document directly: it computes
//! `{selector, field, value}` triples and hands them to a [`PatchSink`].
//! The in-memory sink doubles as the test double and as the backing state
//! for the console board renderer.

use std::collections::HashMap;

use tracing::debug;

use crate::board::universe::{widgets_for, Page};

/// Selector for page-level readiness classes.
pub const BODY_SELECTOR: &str = "body";

/// Which aspect of the bound element a patch writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchField {
    /// Visible text of a value element.
    Text,
    /// Change badge text.
    BadgeText,
    /// Change badge tone class (positive/negative/flat).
    BadgeTone,
    /// Status indicator text (Live / Lädt… / Stand HH:MM).
    StatusText,
    /// Status indicator tone class (live/cache/stale/loading).
    StatusTone,
    /// Last-update-source marker: none, cache, or live.
    UpdateSource,
    /// Seed the neutral glyph, capturing the original text exactly once.
    Placeholder,
    /// Page readiness class on the body element.
    BodyClass,
}

/// One display mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPatch {
    pub selector: String,
    pub field: PatchField,
    pub value: String,
}

impl DisplayPatch {
    pub fn new(selector: impl Into<String>, field: PatchField, value: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            field,
            value: value.into(),
        }
    }
}

/// Overall page readiness signaled on the body element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
    Failed,
}

impl Readiness {
    pub fn class(&self) -> &'static str {
        match self {
            Readiness::Loading => "live-loading",
            Readiness::Ready => "live-ready",
            Readiness::Failed => "live-failed",
        }
    }
}

/// Consumer of display patches.
pub trait PatchSink {
    fn apply(&mut self, patch: DisplayPatch);

    fn apply_all(&mut self, patches: Vec<DisplayPatch>) {
        for patch in patches {
            self.apply(patch);
        }
    }
}

/// Recording sink holding the latest value per (selector, field).
#[derive(Debug, Default)]
pub struct MemorySink {
    state: HashMap<(String, PatchField), String>,
    originals: HashMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, selector: &str, field: PatchField) -> Option<&str> {
        self.state
            .get(&(selector.to_string(), field))
            .map(String::as_str)
    }

    pub fn text(&self, selector: &str) -> Option<&str> {
        self.value(selector, PatchField::Text)
    }

    /// Original text captured before the first placeholder overwrite.
    pub fn original(&self, selector: &str) -> Option<&str> {
        self.originals.get(selector).map(String::as_str)
    }

    pub fn body_class(&self) -> Option<&str> {
        self.value(BODY_SELECTOR, PatchField::BodyClass)
    }
}

impl PatchSink for MemorySink {
    fn apply(&mut self, patch: DisplayPatch) {
        match patch.field {
            PatchField::Placeholder => {
                let text_key = (patch.selector.clone(), PatchField::Text);
                let current = self.state.get(&text_key).cloned().unwrap_or_default();
                self.originals.entry(patch.selector.clone()).or_insert(current);
                self.state.insert(text_key, patch.value);
                self.state.insert(
                    (patch.selector, PatchField::UpdateSource),
                    "none".to_string(),
                );
            }
            field => {
                self.state.insert((patch.selector, field), patch.value);
            }
        }
    }
}

/// Sink for the binary: records state like [`MemorySink`], logs every patch,
/// and renders the current board as an aligned text table.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    inner: MemorySink,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MemorySink {
        &self.inner
    }

    /// Draw the widgets of `page` from the recorded state.
    pub fn render_board(&self, page: Page) -> String {
        let mut lines = Vec::new();
        lines.push("┌────────────┬────────────────┬───────────┬──────────────┐".to_string());
        lines.push("│   Symbol   │     Price      │  Change   │    Status    │".to_string());
        lines.push("├────────────┼────────────────┼───────────┼──────────────┤".to_string());

        for widget in widgets_for(page) {
            let price = self.inner.text(&widget.value_selector()).unwrap_or("—");
            let change = self
                .inner
                .value(&widget.badge_selector(), PatchField::BadgeText)
                .unwrap_or("—");
            let status = self
                .inner
                .value(&widget.status_selector(), PatchField::StatusText)
                .unwrap_or("");
            lines.push(format!(
                "│ {:>10} │ {:>14} │ {:>9} │ {:>12} │",
                widget.ticker, price, change, status
            ));
        }

        lines.push("└────────────┴────────────────┴───────────┴──────────────┘".to_string());
        lines.join("\n")
    }
}

impl PatchSink for ConsoleSink {
    fn apply(&mut self, patch: DisplayPatch) {
        debug!(
            selector = %patch.selector,
            field = ?patch.field,
            value = %patch.value,
            "display patch"
        );
        self.inner.apply(patch);
    }
}
