pub mod controller;
pub mod extract;
pub mod pager;
pub mod wait;

#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ScrapeResult;

/// One control in the pager widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagerItem {
    /// Visible text, e.g. "3" or "…".
    pub text: String,
    /// Accessible label, e.g. "Page 3".
    pub aria_label: Option<String>,
    /// Whether the control marks the page currently shown.
    pub active: bool,
}

/// Snapshot of a `<button>` used to find the next-page control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonInfo {
    pub text: String,
    #[serde(default)]
    pub aria_label: Option<String>,
    /// Contains an `svg[aria-label="next"]` icon.
    #[serde(default)]
    pub next_icon: bool,
    #[serde(default)]
    pub disabled: bool,
}

/// Read-and-click access to a rendered page. The pagination core only talks
/// to the browser through this trait, so it runs against a fake in tests.
#[async_trait]
pub trait PageReader: Send + Sync {
    /// Whether `selector` currently matches anything.
    async fn exists(&self, selector: &str) -> ScrapeResult<bool>;

    /// Trimmed text of every `cell_selector` inside every `row_selector`.
    async fn cell_rows(&self, row_selector: &str, cell_selector: &str)
        -> ScrapeResult<Vec<Vec<String>>>;

    /// Cells of the first `row_selector` match, `None` while no row exists.
    async fn first_row(&self, row_selector: &str, cell_selector: &str)
        -> ScrapeResult<Option<Vec<String>>>;

    /// Controls of the pager widget, in document order.
    async fn pager_items(&self) -> ScrapeResult<Vec<PagerItem>>;

    /// Click the pager control at `index` in `pager_items()` order.
    async fn click_pager_item(&self, index: usize) -> ScrapeResult<()>;

    /// Every button on the page, in document order.
    async fn buttons(&self) -> ScrapeResult<Vec<ButtonInfo>>;

    /// Click the button at `index` in `buttons()` order.
    async fn click_button(&self, index: usize) -> ScrapeResult<()>;

    async fn pause(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}
