use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::browser::{BrowserSession, ChromePage};
use crate::config::Settings;
use crate::normalize::normalize_all;
use crate::output;
use crate::record::RawRecord;
use crate::scrape::controller::{Controller, Harvest};
use crate::session;
use crate::sheets;

pub struct RunSummary {
    pub records: usize,
    pub total_pages: u32,
    pub empty_pages: Vec<u32>,
    pub stopped_at: Option<u32>,
    pub output_path: PathBuf,
    pub synced: bool,
}

/// Full pipeline: login, walk the listing, normalize, save, then sync.
pub async fn execute(settings: &Settings, sync: bool) -> Result<RunSummary> {
    settings.credentials()?;

    let browser = BrowserSession::launch(settings.headless).await?;
    let harvested = harvest(&browser, settings).await;
    browser.close().await;
    let harvest = harvested?;

    let normalized = normalize_all(&harvest.records);
    let output_path = output::save_run(&settings.output_dir, &normalized)?;
    info!("Saved {} records to {}", normalized.len(), output_path.display());

    let synced = if sync {
        sheets::sync_records(settings, &normalized).await
    } else {
        info!("Google Sheets sync skipped (--no-sheets)");
        false
    };

    Ok(RunSummary {
        records: normalized.len(),
        total_pages: harvest.total_pages,
        empty_pages: harvest.empty_pages,
        stopped_at: harvest.stopped_at,
        output_path,
        synced,
    })
}

async fn harvest(browser: &BrowserSession, settings: &Settings) -> Result<Harvest> {
    let page = browser.new_page().await?;
    session::login(&page, settings).await?;
    session::open_listing(&page, settings).await?;

    let reader = ChromePage::new(page);
    let mut controller = Controller::new(&reader, settings.timings())
        .with_mode(settings.pager_mode)
        .with_navigation_retries(settings.navigation_retries)
        .with_max_pages(settings.max_pages);
    let harvest = controller.run().await;
    debug!("Controller finished in phase {:?}", controller.phase());

    if let Some(page) = harvest.stopped_at {
        warn!("Pagination stopped early at page {}", page);
    }
    Ok(harvest)
}

/// Re-normalize a saved run and write the result as a new run file.
pub fn renormalize(settings: &Settings, input: &std::path::Path) -> Result<(usize, PathBuf)> {
    let saved = output::load_records(input)?;
    let raw: Vec<RawRecord> = saved.into_iter().map(RawRecord::from).collect();
    let normalized = normalize_all(&raw);
    let path = output::save_run(&settings.output_dir, &normalized)?;
    Ok((normalized.len(), path))
}
