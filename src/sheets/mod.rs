pub mod auth;

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::Settings;
use crate::record::NormalizedRecord;
use auth::ServiceAccount;

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const HEADER_RANGE: &str = "Sheet1!A1:D1";

#[derive(Debug, Deserialize)]
pub struct SpreadsheetMeta {
    pub properties: SpreadsheetProperties,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
pub struct SpreadsheetProperties {
    pub title: String,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Sheet {
    pub properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
pub struct SheetProperties {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: AppendUpdates,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_rows: usize,
}

/// Authenticated client for one spreadsheet.
pub struct SheetsClient {
    http: reqwest::Client,
    token: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub async fn connect(account: &ServiceAccount, spreadsheet_id: &str) -> Result<Self> {
        let http = reqwest::Client::new();
        let token = auth::fetch_token(&http, account).await?;
        Ok(SheetsClient {
            http,
            token,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }

    pub async fn metadata(&self) -> Result<SpreadsheetMeta> {
        let url = sheets_url(&self.spreadsheet_id, &[])?;
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()
            .context("Spreadsheet is not accessible")?
            .json()
            .await
            .context("Unexpected spreadsheet metadata")
    }

    pub async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = sheets_url(&self.spreadsheet_id, &["values", range])?;
        let vr: ValueRange = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("Could not read {}", range))?
            .json()
            .await?;
        Ok(vr.values)
    }

    /// Append rows below the table at `range`. Returns the rows written.
    pub async fn append_rows(&self, range: &str, rows: &[Vec<String>]) -> Result<usize> {
        let mut url = sheets_url(&self.spreadsheet_id, &["values", &format!("{}:append", range)])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let resp: AppendResponse = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": rows }))
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("Could not append to {}", range))?
            .json()
            .await?;
        Ok(resp.updates.updated_rows)
    }
}

fn sheets_url(spreadsheet_id: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(API_BASE)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Sheets API base URL cannot take a path"))?
        .push(spreadsheet_id)
        .extend(segments);
    Ok(url)
}

/// Push records to the configured sheet. Returns whether the sync happened;
/// every failure is logged and swallowed, since the JSON file already holds
/// the run.
pub async fn sync_records(settings: &Settings, records: &[NormalizedRecord]) -> bool {
    if settings.disable_google_sheets {
        info!("Google Sheets sync disabled (DISABLE_GOOGLE_SHEETS=true)");
        return false;
    }
    let Some(spreadsheet_id) = settings.spreadsheet_id.as_deref().filter(|s| !s.is_empty()) else {
        info!("SPREADSHEET_ID not set, skipping Google Sheets sync");
        return false;
    };
    let account = match ServiceAccount::from_settings(settings) {
        Ok(Some(a)) => a,
        Ok(None) => {
            info!("No Google credentials configured, skipping Google Sheets sync");
            return false;
        }
        Err(e) => {
            warn!("Skipping Google Sheets sync: {:#}", e);
            return false;
        }
    };

    match push(&account, spreadsheet_id, &settings.sheet_range, records).await {
        Ok(rows) => {
            info!("Appended {} rows to Google Sheets", rows);
            true
        }
        Err(e) => {
            warn!("Google Sheets sync failed: {:#}", e);
            info!("Records are still saved in the JSON output");
            false
        }
    }
}

async fn push(
    account: &ServiceAccount,
    spreadsheet_id: &str,
    range: &str,
    records: &[NormalizedRecord],
) -> Result<usize> {
    let client = SheetsClient::connect(account, spreadsheet_id).await?;
    let meta = client.metadata().await?;
    info!("Syncing to spreadsheet '{}'", meta.properties.title);
    let rows: Vec<Vec<String>> = records.iter().map(NormalizedRecord::to_row).collect();
    if rows.is_empty() {
        return Ok(0);
    }
    client.append_rows(range, &rows).await
}

/// Read-only health check of the spreadsheet setup, printed for a human.
pub async fn diagnose(settings: &Settings) -> Result<()> {
    println!("=== Environment ===");
    let id = settings.spreadsheet_id.as_deref().filter(|s| !s.is_empty());
    println!("SPREADSHEET_ID:       {}", id.unwrap_or("(not set)"));
    println!(
        "GOOGLE_CREDENTIALS:   {}",
        if settings.google_credentials.is_some() { "set" } else { "(not set)" }
    );
    println!(
        "Credentials file:     {:?} ({})",
        settings.google_credentials_path,
        if settings.google_credentials_path.exists() { "found" } else { "missing" }
    );
    println!("Sync disabled:        {}", settings.disable_google_sheets);

    let Some(account) = ServiceAccount::from_settings(settings)? else {
        println!("\nNo service account credentials found.");
        return Ok(());
    };
    println!("\n=== Service account ===");
    println!("client_email:   {}", account.client_email);
    println!("project_id:     {}", account.project_id.as_deref().unwrap_or("-"));
    println!("private_key_id: {}", account.private_key_id.as_deref().unwrap_or("-"));

    let Some(id) = id else {
        println!("\nSPREADSHEET_ID not set, skipping spreadsheet checks.");
        return Ok(());
    };

    println!("\n=== Spreadsheet ===");
    let client = SheetsClient::connect(&account, id).await?;
    println!("Authentication: ok");
    let meta = match client.metadata().await {
        Ok(m) => m,
        Err(e) => {
            println!("Access failed: {:#}", e);
            println!(
                "Share the spreadsheet with {} as an editor and check the id.",
                account.client_email
            );
            return Ok(());
        }
    };
    let names: Vec<&str> = meta.sheets.iter().map(|s| s.properties.title.as_str()).collect();
    println!("Title:  {}", meta.properties.title);
    println!("Locale: {}", meta.properties.locale.as_deref().unwrap_or("-"));
    println!("Sheets: {}", names.join(", "));

    if names.contains(&"Sheet1") {
        match client.read_range(HEADER_RANGE).await {
            Ok(values) => println!(
                "Header: {}",
                values.first().map(|r| r.join(" | ")).unwrap_or_else(|| "(empty)".into())
            ),
            Err(e) => println!("Read failed: {:#}", e),
        }
    } else {
        println!("Sheet1 not found; first sheet is {}", names.first().unwrap_or(&"(none)"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;

    #[test]
    fn urls_escape_sheet_names() {
        let url = sheets_url("abc", &["values", "My Sheet!A2:D2:append"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/My%20Sheet!A2:D2:append"
        );
        assert_eq!(
            sheets_url("abc", &[]).unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc"
        );
    }

    #[test]
    fn parses_metadata() {
        let meta: SpreadsheetMeta = serde_json::from_str(
            r#"{"properties":{"title":"Creators","locale":"ja_JP"},
                "sheets":[{"properties":{"title":"Sheet1","sheetId":0}}]}"#,
        )
        .unwrap();
        assert_eq!(meta.properties.title, "Creators");
        assert_eq!(meta.sheets[0].properties.title, "Sheet1");
    }

    #[test]
    fn parses_append_response() {
        let resp: AppendResponse =
            serde_json::from_str(r#"{"updates":{"updatedRows":3,"updatedRange":"Sheet1!A2:D4"}}"#)
                .unwrap();
        assert_eq!(resp.updates.updated_rows, 3);
    }

    #[tokio::test]
    async fn skips_when_disabled() {
        let s = test_settings(&[("DISABLE_GOOGLE_SHEETS", "true"), ("SPREADSHEET_ID", "abc")]);
        assert!(!sync_records(&s, &[]).await);
    }

    #[tokio::test]
    async fn skips_without_spreadsheet_id() {
        let s = test_settings(&[]);
        assert!(!sync_records(&s, &[]).await);
    }

    #[tokio::test]
    async fn skips_without_credentials() {
        let s = test_settings(&[
            ("SPREADSHEET_ID", "abc"),
            ("GOOGLE_CREDENTIALS_PATH", "/nonexistent/credentials.json"),
        ]);
        assert!(!sync_records(&s, &[]).await);
    }

    #[tokio::test]
    async fn skips_with_malformed_credentials() {
        let s = test_settings(&[("SPREADSHEET_ID", "abc"), ("GOOGLE_CREDENTIALS", "{oops")]);
        assert!(!sync_records(&s, &[]).await);
    }
}
