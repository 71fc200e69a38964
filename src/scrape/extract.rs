use tracing::debug;

use super::wait::wait_until;
use super::PageReader;
use crate::config::Timings;
use crate::error::{ScrapeError, ScrapeResult};
use crate::record::RawRecord;

pub const TABLE_SELECTOR: &str = "table";
pub const ROW_SELECTOR: &str = "table tbody tr";
pub const CELL_SELECTOR: &str = "td";

/// Wait (bounded by `timings.table_timeout`) for the table, then read every
/// body row as a `RawRecord`. No retries: the controller owns that policy.
pub async fn extract_page<P>(page: &P, timings: &Timings) -> ScrapeResult<Vec<RawRecord>>
where
    P: PageReader + ?Sized,
{
    let appeared = wait_until(timings.table_timeout, timings.poll_interval, move || async move {
        page.exists(TABLE_SELECTOR).await.unwrap_or(false)
    })
    .await;

    if !appeared {
        return Err(ScrapeError::ExtractionTimeout {
            selector: TABLE_SELECTOR.to_string(),
            waited: timings.table_timeout,
        });
    }

    let rows = page.cell_rows(ROW_SELECTOR, CELL_SELECTOR).await?;
    debug!("Read {} table rows", rows.len());
    Ok(rows.iter().map(|cells| RawRecord::from_cells(cells)).collect())
}
