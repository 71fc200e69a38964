use tracing::{debug, info, warn};

use super::extract::{CELL_SELECTOR, ROW_SELECTOR};
use super::wait::settle;
use super::{ButtonInfo, PageReader, PagerItem};
use crate::config::Timings;
use crate::error::{ScrapeError, ScrapeResult};

/// Text or aria-label values that mark a next-page button.
const NEXT_LABELS: &[&str] = &["次へ", "Next"];

/// Discovers the page count and moves the shared page between pages.
pub struct Navigator<'a, P: PageReader + ?Sized> {
    page: &'a P,
    timings: Timings,
}

impl<'a, P: PageReader + ?Sized> Navigator<'a, P> {
    pub fn new(page: &'a P, timings: Timings) -> Self {
        Navigator { page, timings }
    }

    /// Largest numeric pager label, or 1 when there is none or the pager
    /// cannot be read. Never fails.
    pub async fn discover_total_pages(&self) -> u32 {
        match self.try_discover().await {
            Ok(total) => {
                info!("Detected {} pages", total);
                total
            }
            Err(e) => {
                warn!("{}; treating listing as a single page", e);
                1
            }
        }
    }

    async fn try_discover(&self) -> ScrapeResult<u32> {
        let items = self
            .page
            .pager_items()
            .await
            .map_err(|e| ScrapeError::DiscoveryFailure(e.to_string()))?;
        items
            .iter()
            .filter_map(|item| parse_page_label(&item.text))
            .max()
            .ok_or_else(|| {
                ScrapeError::DiscoveryFailure(format!(
                    "no numeric pager control among {} items",
                    items.len()
                ))
            })
    }

    /// Click the control labelled "Page {n}" and let the table re-render.
    /// The page counts as settled once the control is active and the first
    /// row differs from the one shown before the click.
    /// A missing control or failed click is a `NavigationFailure`.
    pub async fn goto_page(&self, n: u32) -> ScrapeResult<()> {
        let label = format!("Page {}", n);
        let fail = |reason: String| ScrapeError::NavigationFailure { page: n, reason };

        let items = self.page.pager_items().await.map_err(|e| fail(e.to_string()))?;
        let index = items
            .iter()
            .position(|item| item.aria_label.as_deref() == Some(label.as_str()))
            .ok_or_else(|| fail(format!("no pager control labelled '{}'", label)))?;

        let before = self.first_row().await;
        self.page
            .click_pager_item(index)
            .await
            .map_err(|e| fail(e.to_string()))?;

        let page = self.page;
        let label = label.as_str();
        let before = before.as_ref();
        let confirmed = settle(page, &self.timings, move || async move {
            let active = page
                .pager_items()
                .await
                .map(|items| active_label(&items) == Some(label))
                .unwrap_or(false);
            active && rows_replaced(page, before).await
        })
        .await;
        if !confirmed {
            debug!("Page {} not confirmed active after {:?}", n, self.timings.settle);
        }
        Ok(())
    }

    /// Whether an enabled next-page button is present.
    pub async fn has_next(&self) -> bool {
        match self.page.buttons().await {
            Ok(buttons) => buttons.iter().any(|b| is_next_button(b) && !b.disabled),
            Err(e) => {
                debug!("Could not read buttons: {}", e);
                false
            }
        }
    }

    /// Click the first enabled next-page button and let the table re-render.
    pub async fn click_next(&self) -> ScrapeResult<()> {
        let fail = |reason: String| ScrapeError::NavigationFailure { page: 0, reason };

        let buttons = self.page.buttons().await.map_err(|e| fail(e.to_string()))?;
        let index = buttons
            .iter()
            .position(|b| is_next_button(b) && !b.disabled)
            .ok_or_else(|| fail("no enabled next button".to_string()))?;

        let before_label = self
            .page
            .pager_items()
            .await
            .ok()
            .and_then(|items| active_label(&items).map(str::to_string));
        let before_row = self.first_row().await;

        self.page
            .click_button(index)
            .await
            .map_err(|e| fail(e.to_string()))?;

        let page = self.page;
        let before_label = before_label.as_deref();
        let before_row = before_row.as_ref();
        settle(page, &self.timings, move || async move {
            let moved = match before_label {
                Some(label) => page
                    .pager_items()
                    .await
                    .map(|items| active_label(&items) != Some(label))
                    .unwrap_or(false),
                None => true,
            };
            moved && rows_replaced(page, before_row).await
        })
        .await;
        Ok(())
    }

    async fn first_row(&self) -> Option<Vec<String>> {
        self.page
            .first_row(ROW_SELECTOR, CELL_SELECTOR)
            .await
            .ok()
            .flatten()
    }
}

/// Whether a row is rendered and it is not `before`. An empty destination
/// page never satisfies this, so settling runs to its budget there.
async fn rows_replaced<P>(page: &P, before: Option<&Vec<String>>) -> bool
where
    P: PageReader + ?Sized,
{
    match page.first_row(ROW_SELECTOR, CELL_SELECTOR).await {
        Ok(Some(row)) => before != Some(&row),
        _ => false,
    }
}

/// Leading integer of a pager label, parsed the way a browser's `parseInt`
/// reads it. Non-numeric and non-positive labels yield `None`.
pub fn parse_page_label(text: &str) -> Option<u32> {
    let t = text.trim_start();
    let t = t.strip_prefix('+').unwrap_or(t);
    let digits: String = t.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

pub fn is_next_button(b: &ButtonInfo) -> bool {
    NEXT_LABELS.contains(&b.text.trim())
        || b.aria_label
            .as_deref()
            .is_some_and(|l| NEXT_LABELS.contains(&l))
        || b.next_icon
}

fn active_label(items: &[PagerItem]) -> Option<&str> {
    items
        .iter()
        .find(|i| i.active)
        .and_then(|i| i.aria_label.as_deref())
}
