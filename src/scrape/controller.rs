use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::extract::{extract_page, ROW_SELECTOR};
use super::pager::Navigator;
use super::wait::settle;
use super::PageReader;
use crate::config::{PagerMode, Timings};
use crate::error::ScrapeResult;
use crate::record::RawRecord;

/// Where the controller is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovering,
    Paginating { page: u32, total: u32 },
    Done,
}

/// Records gathered by one run plus how the run went.
#[derive(Debug, Default)]
pub struct Harvest {
    /// Page order, then row order.
    pub records: Vec<RawRecord>,
    pub total_pages: u32,
    pub pages_read: u32,
    /// Pages that yielded no records (timeout or empty table).
    pub empty_pages: Vec<u32>,
    /// Page whose navigation failed and ended the run early.
    pub stopped_at: Option<u32>,
}

/// Drives the navigator and extractor across every page of the listing.
/// Per-page failures shrink the result; none of them aborts the run.
pub struct Controller<'a, P: PageReader + ?Sized> {
    page: &'a P,
    navigator: Navigator<'a, P>,
    timings: Timings,
    mode: PagerMode,
    navigation_retries: u32,
    max_pages: u32,
    phase: Phase,
}

impl<'a, P: PageReader + ?Sized> Controller<'a, P> {
    pub fn new(page: &'a P, timings: Timings) -> Self {
        Controller {
            page,
            navigator: Navigator::new(page, timings),
            timings,
            mode: PagerMode::Index,
            navigation_retries: 0,
            max_pages: 500,
            phase: Phase::Discovering,
        }
    }

    pub fn with_mode(mut self, mode: PagerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Extra attempts for a failed page jump before pagination stops.
    pub fn with_navigation_retries(mut self, retries: u32) -> Self {
        self.navigation_retries = retries;
        self
    }

    /// Upper bound on pages walked in next-button mode.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub async fn run(&mut self) -> Harvest {
        self.phase = Phase::Discovering;
        let total = self.navigator.discover_total_pages().await;

        let pb = progress_bar(total);
        let mut harvest = Harvest {
            total_pages: total,
            ..Default::default()
        };
        match self.mode {
            PagerMode::Index => self.paginate_by_index(total, &mut harvest, &pb).await,
            PagerMode::Next => self.paginate_by_next(total, &mut harvest, &pb).await,
        }
        pb.finish_and_clear();

        self.phase = Phase::Done;
        info!(
            "Collected {} records from {}/{} pages",
            harvest.records.len(),
            harvest.pages_read,
            total
        );
        harvest
    }

    async fn paginate_by_index(&mut self, total: u32, harvest: &mut Harvest, pb: &ProgressBar) {
        for p in 1..=total {
            self.phase = Phase::Paginating { page: p, total };
            info!("Processing page {}/{}", p, total);

            if p > 1 {
                if let Err(e) = self.navigate(p).await {
                    warn!(
                        "{}; stopping pagination, keeping {} records",
                        e,
                        harvest.records.len()
                    );
                    harvest.stopped_at = Some(p);
                    break;
                }
            }

            self.read_page(p, harvest).await;
            pb.inc(1);
        }
    }

    async fn paginate_by_next(&mut self, total: u32, harvest: &mut Harvest, pb: &ProgressBar) {
        let mut p = 1;
        loop {
            self.phase = Phase::Paginating {
                page: p,
                total: total.max(p),
            };
            info!("Processing page {}", p);
            self.read_page(p, harvest).await;
            pb.inc(1);

            if p >= self.max_pages {
                info!("Reached page limit {}", self.max_pages);
                break;
            }
            if !self.navigator.has_next().await {
                break;
            }
            if let Err(e) = self.navigator.click_next().await {
                warn!(
                    "{}; stopping pagination, keeping {} records",
                    e,
                    harvest.records.len()
                );
                harvest.stopped_at = Some(p + 1);
                break;
            }
            p += 1;
        }
    }

    async fn navigate(&self, p: u32) -> ScrapeResult<()> {
        let mut attempt = 0;
        loop {
            match self.navigator.goto_page(p).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.navigation_retries => {
                    attempt += 1;
                    warn!(
                        "{} (retry {}/{})",
                        e, attempt, self.navigation_retries
                    );
                    self.page.pause(self.timings.settle).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn read_page(&self, p: u32, harvest: &mut Harvest) {
        let page = self.page;
        settle(page, &self.timings, move || async move {
            page.exists(ROW_SELECTOR).await.unwrap_or(false)
        })
        .await;

        harvest.pages_read += 1;
        match extract_page(page, &self.timings).await {
            Ok(records) if records.is_empty() => {
                warn!("Page {}: no creator records", p);
                harvest.empty_pages.push(p);
            }
            Ok(records) => {
                info!("Page {}: {} creator records", p, records.len());
                harvest.records.extend(records);
            }
            Err(e) => {
                warn!("Page {}: {}", p, e);
                harvest.empty_pages.push(p);
            }
        }
    }
}

fn progress_bar(total: u32) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} page {pos}/{len}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}
