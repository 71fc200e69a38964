use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::{ScrapeError, ScrapeResult};
use crate::scrape::{ButtonInfo, PageReader, PagerItem};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const PAGER_ITEM_SELECTOR: &str = ".semi-page-item";
const PAGER_ACTIVE_CLASS: &str = "semi-page-item-active";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const BROWSER_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-extensions",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--disable-popup-blocking",
    "--disable-translate",
    "--no-first-run",
    "--no-default-browser-check",
    "--password-store=basic",
    "--use-mock-keychain",
    "--lang=ja-JP",
];

/// A launched browser plus the task pumping its CDP events.
pub struct BrowserSession {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(headless: bool) -> Result<Self> {
        let chrome_path = find_chrome()
            .context("Chrome/Chromium not found. Install Chrome or Chromium to scrape.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1920, 1080)
            .request_timeout(REQUEST_TIMEOUT);
        for arg in BROWSER_ARGS {
            builder = builder.arg(*arg);
        }
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        Ok(BrowserSession {
            browser,
            handler_task,
        })
    }

    /// A blank tab with the desktop user agent applied.
    pub async fn new_page(&self) -> Result<Page> {
        let page = self.browser.new_page("about:blank").await?;
        page.execute(SetUserAgentOverrideParams::new(USER_AGENT))
            .await
            .context("Failed to set user agent")?;
        Ok(page)
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process did not exit cleanly: {}", e);
        }
        self.handler_task.abort();
    }
}

/// Find a Chrome/Chromium executable, honouring `CHROME_PATH` first.
fn find_chrome() -> Option<String> {
    if let Ok(p) = std::env::var("CHROME_PATH") {
        if !p.is_empty() {
            return Some(p);
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }
    }

    [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    ]
    .iter()
    .find(|p| std::path::Path::new(p).exists())
    .map(|p| p.to_string())
}

/// `PageReader` over a live chromiumoxide tab.
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        ChromePage { page }
    }

    async fn nth(&self, selector: &str, index: usize) -> ScrapeResult<Element> {
        self.page
            .find_elements(selector)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| ScrapeError::Browser(format!("{} #{} is gone", selector, index)))
    }
}

fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[async_trait]
impl PageReader for ChromePage {
    async fn exists(&self, selector: &str) -> ScrapeResult<bool> {
        let js = format!("document.querySelector({}) !== null", js_str(selector));
        Ok(self.page.evaluate(js).await?.into_value::<bool>()?)
    }

    async fn cell_rows(&self, row_selector: &str, cell_selector: &str)
        -> ScrapeResult<Vec<Vec<String>>>
    {
        let js = format!(
            r#"Array.from(document.querySelectorAll({rows})).map(row =>
                Array.from(row.querySelectorAll({cells})).map(c => (c.textContent || '').trim()))"#,
            rows = js_str(row_selector),
            cells = js_str(cell_selector),
        );
        Ok(self.page.evaluate(js).await?.into_value()?)
    }

    async fn first_row(&self, row_selector: &str, cell_selector: &str)
        -> ScrapeResult<Option<Vec<String>>>
    {
        let js = format!(
            r#"(() => {{
                const row = document.querySelector({rows});
                return row ? Array.from(row.querySelectorAll({cells})).map(c => (c.textContent || '').trim()) : null;
            }})()"#,
            rows = js_str(row_selector),
            cells = js_str(cell_selector),
        );
        Ok(self.page.evaluate(js).await?.into_value()?)
    }

    async fn pager_items(&self) -> ScrapeResult<Vec<PagerItem>> {
        let elements = self.page.find_elements(PAGER_ITEM_SELECTOR).await?;
        let mut items = Vec::with_capacity(elements.len());
        for el in &elements {
            let class = el.attribute("class").await?.unwrap_or_default();
            items.push(PagerItem {
                text: el.inner_text().await?.unwrap_or_default().trim().to_string(),
                aria_label: el.attribute("aria-label").await?,
                active: class.split_whitespace().any(|c| c == PAGER_ACTIVE_CLASS)
                    || el.attribute("aria-current").await?.as_deref() == Some("page"),
            });
        }
        debug!("Pager has {} controls", items.len());
        Ok(items)
    }

    async fn click_pager_item(&self, index: usize) -> ScrapeResult<()> {
        self.nth(PAGER_ITEM_SELECTOR, index).await?.click().await?;
        Ok(())
    }

    async fn buttons(&self) -> ScrapeResult<Vec<ButtonInfo>> {
        let js = r#"Array.from(document.querySelectorAll('button')).map(b => ({
            text: (b.textContent || '').trim(),
            ariaLabel: b.getAttribute('aria-label'),
            nextIcon: b.querySelector('svg[aria-label="next"]') !== null,
            disabled: b.disabled || b.getAttribute('aria-disabled') === 'true'
        }))"#;
        Ok(self.page.evaluate(js).await?.into_value()?)
    }

    async fn click_button(&self, index: usize) -> ScrapeResult<()> {
        self.nth("button", index).await?.click().await?;
        Ok(())
    }
}
