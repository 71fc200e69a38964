mod browser;
mod config;
mod error;
mod normalize;
mod output;
mod record;
mod run;
mod scrape;
mod session;
mod sheets;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::config::{PagerMode, Settings};

#[derive(Parser)]
#[command(name = "backstage_scraper", about = "Creator listing scraper for the LIVE Backstage portal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, walk every listing page, normalize and save (then sync)
    Run {
        /// Show the browser window instead of running headless
        #[arg(long)]
        show_browser: bool,
        /// Directory for the JSON output (overrides OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Skip the Google Sheets sync
        #[arg(long)]
        no_sheets: bool,
        /// Pagination strategy (overrides PAGER_MODE)
        #[arg(long, value_enum)]
        pager: Option<PagerMode>,
    },
    /// Re-normalize a saved JSON run into a new file
    Normalize {
        input: PathBuf,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Push a saved JSON run to Google Sheets
    Sync { input: PathBuf },
    /// Check the Google Sheets setup without writing anything
    CheckSheets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    let result = match cli.command {
        Commands::Run {
            show_browser,
            output_dir,
            no_sheets,
            pager,
        } => {
            if show_browser {
                settings.headless = false;
            }
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            if let Some(mode) = pager {
                settings.pager_mode = mode;
            }
            let summary = run::execute(&settings, !no_sheets).await?;
            println!(
                "Extracted {} records from {} pages.",
                summary.records, summary.total_pages
            );
            if !summary.empty_pages.is_empty() {
                println!("Pages with no records: {:?}", summary.empty_pages);
            }
            if let Some(page) = summary.stopped_at {
                println!("Stopped early: could not navigate to page {}", page);
            }
            println!("Saved to {}", summary.output_path.display());
            if summary.synced {
                println!("Synced to Google Sheets.");
            }
            Ok(())
        }
        Commands::Normalize { input, output_dir } => {
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            let (count, path) = run::renormalize(&settings, &input)?;
            println!("Normalized {} records into {}", count, path.display());
            Ok(())
        }
        Commands::Sync { input } => {
            let records = output::load_records(&input)?;
            if records.is_empty() {
                println!("No records in {}", input.display());
                return Ok(());
            }
            if sheets::sync_records(&settings, &records).await {
                println!("Synced {} records.", records.len());
            } else {
                println!("Sync did not happen, see the log above.");
            }
            Ok(())
        }
        Commands::CheckSheets => sheets::diagnose(&settings).await,
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(std::time::Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from(["backstage_scraper", "run", "--no-sheets", "--pager", "next"])
            .unwrap();
        match cli.command {
            Commands::Run { no_sheets, pager, show_browser, .. } => {
                assert!(no_sheets);
                assert!(!show_browser);
                assert_eq!(pager, Some(PagerMode::Next));
            }
            _ => panic!("expected run"),
        }
    }
}
