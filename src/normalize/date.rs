use std::sync::LazyLock;

use chrono::{Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;

use crate::error::{ScrapeError, ScrapeResult};

/// `MM/DD/YYYY HH:mm:ss`, 24-hour, implicitly UTC.
static SOURCE_DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4}) ([0-9]{2}):([0-9]{2}):([0-9]{2})$").unwrap()
});

/// `%Y` signs years past this, which breaks the four-digit layout.
const MAX_TARGET_YEAR: i32 = 9999;

/// UTC+9 (JST).
const TARGET_OFFSET_SECS: i32 = 9 * 3600;
const TARGET_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Shift a source timestamp to JST and render it as `YYYY/MM/DD HH:mm:ss`.
/// `Ok(None)` means the input is not in the source pattern at all.
pub fn to_target_zone(raw: &str) -> ScrapeResult<Option<String>> {
    let Some(caps) = SOURCE_DATETIME_RE.captures(raw) else {
        return Ok(None);
    };
    let anomaly = |reason: &str| ScrapeError::NormalizationAnomaly {
        field: "date",
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let field = |i: usize| -> ScrapeResult<u32> {
        caps[i].parse().map_err(|_| anomaly("non-numeric field"))
    };

    let (month, day, year) = (field(1)?, field(2)?, field(3)?);
    let (hour, minute, second) = (field(4)?, field(5)?, field(6)?);

    let naive = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| anomaly("not a valid calendar date and time"))?;
    let target = FixedOffset::east_opt(TARGET_OFFSET_SECS).ok_or_else(|| anomaly("bad offset"))?;

    let shifted = Utc.from_utc_datetime(&naive).with_timezone(&target);
    if shifted.year() > MAX_TARGET_YEAR {
        return Err(anomaly("shifted year has more than four digits"));
    }
    Ok(Some(shifted.format(TARGET_FORMAT).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(raw: &str) -> Option<String> {
        to_target_zone(raw).unwrap()
    }

    #[test]
    fn adds_nine_hours() {
        assert_eq!(shift("03/15/2024 01:02:03").as_deref(), Some("2024/03/15 10:02:03"));
        assert_eq!(shift("07/04/2023 14:59:59").as_deref(), Some("2023/07/04 23:59:59"));
    }

    #[test]
    fn rolls_over_day_month_year() {
        assert_eq!(shift("12/31/2024 23:30:00").as_deref(), Some("2025/01/01 08:30:00"));
        assert_eq!(shift("01/31/2024 15:00:00").as_deref(), Some("2024/02/01 00:00:00"));
        assert_eq!(shift("02/28/2024 20:00:00").as_deref(), Some("2024/02/29 05:00:00"));
        assert_eq!(shift("02/28/2023 20:00:00").as_deref(), Some("2023/03/01 05:00:00"));
    }

    #[test]
    fn other_shapes_do_not_match() {
        assert_eq!(shift(""), None);
        assert_eq!(shift("2024/03/15 10:02:03"), None);
        assert_eq!(shift("3/15/2024 01:02:03"), None);
        assert_eq!(shift("03/15/2024 01:02"), None);
        assert_eq!(shift(" 03/15/2024 01:02:03"), None);
        assert_eq!(shift("03/15/2024 01:02:03 UTC"), None);
    }

    #[test]
    fn impossible_values_are_anomalies() {
        for raw in ["13/01/2024 00:00:00", "02/30/2024 00:00:00", "01/01/2024 24:00:00"] {
            let err = to_target_zone(raw).unwrap_err();
            assert!(matches!(err, ScrapeError::NormalizationAnomaly { field: "date", .. }));
        }
    }

    #[test]
    fn year_past_9999_is_an_anomaly() {
        assert_eq!(shift("12/31/9999 14:59:59").as_deref(), Some("9999/12/31 23:59:59"));
        let err = to_target_zone("12/31/9999 23:00:00").unwrap_err();
        assert!(matches!(err, ScrapeError::NormalizationAnomaly { field: "date", .. }));
    }
}
