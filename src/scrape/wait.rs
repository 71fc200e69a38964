use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{SettleMode, Timings};
use crate::scrape::PageReader;

/// Poll `probe` every `interval` until it returns true or `timeout` elapses.
/// Returns whether the condition was met. The probe runs at least once.
pub async fn wait_until<F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if probe().await {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

/// Wait for the page to settle after an action. In `Fixed` mode this is a
/// plain sleep of the whole budget; in `Poll` mode it returns as soon as
/// `ready` holds. Either way the worst case is `timings.settle`.
pub async fn settle<P, F, Fut>(page: &P, timings: &Timings, ready: F) -> bool
where
    P: PageReader + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    match timings.settle_mode {
        SettleMode::Fixed => {
            page.pause(timings.settle).await;
            true
        }
        SettleMode::Poll => wait_until(timings.settle, timings.poll_interval, ready).await,
    }
}
