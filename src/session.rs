use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::{Element, Page};
use tracing::{info, warn};

use crate::config::Settings;
use crate::scrape::wait::wait_until;

const EMAIL_SELECTORS: &[&str] = &[
    r#"input[name="email"]"#,
    r#"input[type="text"]"#,
    r#"input[placeholder*="mail"]"#,
];
const PASSWORD_SELECTORS: &[&str] = &[r#"input[name="password"]"#, r#"input[type="password"]"#];
const LOGIN_BUTTON: &str = "button.semi-button-block";
const POPUP_CLOSE: &str = "button.semi-modal-close";

const FORM_TIMEOUT: Duration = Duration::from_secs(10);
const LOGIN_BUTTON_TIMEOUT: Duration = Duration::from_secs(30);
const POPUP_TIMEOUT: Duration = Duration::from_secs(5);
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);
const POLL: Duration = Duration::from_millis(250);

async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> bool {
    wait_until(timeout, POLL, move || async move {
        page.find_element(selector).await.is_ok()
    })
    .await
}

async fn first_match(page: &Page, selectors: &[&str]) -> Option<Element> {
    for sel in selectors {
        if let Ok(el) = page.find_element(*sel).await {
            return Some(el);
        }
    }
    None
}

/// Navigate to `url`, retrying once if the first attempt fails.
async fn open_with_retry(page: &Page, url: &str) -> Result<()> {
    if let Err(e) = page.goto(url).await {
        warn!("First load of {} failed ({}), retrying", url, e);
        page.goto(url)
            .await
            .with_context(|| format!("Failed to load {}", url))?;
    }
    info!("Loaded {}", url);
    Ok(())
}

/// Fill and submit the portal's login form.
pub async fn login(page: &Page, settings: &Settings) -> Result<()> {
    let (email, password) = settings.credentials()?;

    open_with_retry(page, &settings.login_url).await?;
    tokio::time::sleep(Duration::from_secs(5)).await;

    info!("Waiting for login form");
    if !wait_for_selector(page, "form", FORM_TIMEOUT).await {
        anyhow::bail!("Login form did not appear within {:?}", FORM_TIMEOUT);
    }

    let (Some(email_input), Some(password_input)) = (
        first_match(page, EMAIL_SELECTORS).await,
        first_match(page, PASSWORD_SELECTORS).await,
    ) else {
        anyhow::bail!("Login form inputs not found");
    };

    info!("Entering credentials");
    email_input.click().await?.type_str(email).await?;
    password_input.click().await?.type_str(password).await?;

    if !wait_for_selector(page, LOGIN_BUTTON, LOGIN_BUTTON_TIMEOUT).await {
        anyhow::bail!("Login button '{}' not found", LOGIN_BUTTON);
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
    page.find_element(LOGIN_BUTTON).await?.click().await?;

    info!("Waiting for login to complete");
    match tokio::time::timeout(NAVIGATION_TIMEOUT, page.wait_for_navigation()).await {
        Ok(Ok(_)) => info!("Logged in"),
        Ok(Err(e)) => warn!("Navigation after login failed ({}), continuing", e),
        Err(_) => {
            let url = page.url().await.ok().flatten().unwrap_or_default();
            warn!("Navigation after login timed out, continuing on {}", url);
        }
    }
    Ok(())
}

/// Go to the creator listing and dismiss the policy popup if one shows.
pub async fn open_listing(page: &Page, settings: &Settings) -> Result<()> {
    info!("Opening creator listing");
    page.goto(&settings.listing_url)
        .await
        .with_context(|| format!("Failed to load {}", settings.listing_url))?;
    dismiss_popup(page).await;
    Ok(())
}

async fn dismiss_popup(page: &Page) {
    if !wait_for_selector(page, POPUP_CLOSE, POPUP_TIMEOUT).await {
        info!("No policy popup");
        return;
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
    match page.find_element(POPUP_CLOSE).await {
        Ok(el) => match el.click().await {
            Ok(_) => info!("Closed policy popup"),
            Err(e) => warn!("Could not close policy popup: {}", e),
        },
        Err(e) => warn!("Policy popup vanished: {}", e),
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
}
