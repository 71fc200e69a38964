pub mod date;
pub mod status;

use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::record::{NormalizedRecord, RawRecord};

/// Rewrite status and date to canonical form. Pure and infallible: anything
/// unrecognized passes through unchanged.
pub fn normalize(raw: &RawRecord) -> NormalizedRecord {
    NormalizedRecord {
        name: raw.name.clone(),
        id: raw.id.clone(),
        status: normalize_status(&raw.status),
        date: normalize_date(&raw.date),
    }
}

pub fn normalize_all<'a, I>(records: I) -> Vec<NormalizedRecord>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    records.into_iter().map(normalize).collect()
}

pub fn normalize_status(status: &str) -> String {
    match status::canonical_status(status) {
        Some(s) => s,
        None => {
            if !status.is_empty() {
                let anomaly = ScrapeError::NormalizationAnomaly {
                    field: "status",
                    value: status.to_string(),
                    reason: "no mapping".to_string(),
                };
                debug!("{}", anomaly);
            }
            status.to_string()
        }
    }
}

pub fn normalize_date(raw: &str) -> String {
    match date::to_target_zone(raw) {
        Ok(Some(converted)) => converted,
        Ok(None) => raw.to_string(),
        Err(e) => {
            warn!("{}; keeping it as is", e);
            raw.to_string()
        }
    }
}
