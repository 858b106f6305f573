use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use trend_report::config::AppConfig;
use trend_report::models::DailyReport;
use trend_report::pipeline::{Pipeline, ReportRequest};
use trend_report::source::{FileSource, NaverSource, TrendDataSource};
use trend_report::utils;

#[derive(Parser)]
#[command(name = "trend-report", about = "Keyword search-trend reports", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Seed keyword (comma-separated synonyms are grouped together)
    #[arg(short, long)]
    keyword: String,

    /// First day of the daily curve (default: 30 days before end)
    #[arg(short, long)]
    start: Option<NaiveDate>,

    /// Last day to fetch (default: yesterday)
    #[arg(short, long)]
    end: Option<NaiveDate>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build a report from the live Naver APIs
    Report(ReportArgs),

    /// Build a report from CSV files in a directory
    Offline {
        /// Directory with overall.csv, female.csv … keywords.csv, mentions.csv
        #[arg(short, long, default_value = "data")]
        dir: PathBuf,

        #[command(flatten)]
        args: ReportArgs,
    },

    /// Print the effective configuration (credentials masked)
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "trend_report=info,warn",
        1 => "trend_report=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Report(args) => {
            let source = NaverSource::new(&config.source).context("Failed to build Naver client")?;
            run_report(config, Arc::new(source), args).await?;
        }

        Command::Offline { dir, args } => {
            anyhow::ensure!(dir.is_dir(), "{:?} is not a directory", dir);
            run_report(config, Arc::new(FileSource::new(dir)), args).await?;
        }

        Command::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }
    }

    Ok(())
}

async fn run_report(
    config: AppConfig,
    source: Arc<dyn TrendDataSource>,
    args: ReportArgs,
) -> Result<()> {
    let end = args
        .end
        .unwrap_or_else(|| Local::now().date_naive() - Days::new(1));
    let start = match args.start {
        Some(start) => start,
        None => end
            .checked_sub_days(Days::new(30))
            .context("end date out of range")?,
    };

    let request = ReportRequest {
        keyword: args.keyword,
        start,
        end: Some(end),
    };

    let report = {
        let _t = utils::Timer::start(format!("Report for {:?}", request.keyword));
        Pipeline::new(config, source)
            .run(&request)
            .await
            .with_context(|| format!("Report for {:?} failed", request.keyword))?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &DailyReport) {
    let d = &report.demographics;
    println!("─────────────────────────────────");
    println!("  Trend report: {}", report.title);
    println!("─────────────────────────────────");
    println!("  PC volume     : {}", utils::fmt_number(report.pc_volume));
    println!("  Mobile volume : {}", utils::fmt_number(report.mobile_volume));
    println!("  Blog mentions : {}", utils::fmt_number(report.blog_mention_count));
    println!("  News mentions : {}", utils::fmt_number(report.news_mention_count));
    println!("─────────────────────────────────");
    for (label, pct) in [
        ("female", d.female),
        ("male", d.male),
        ("age 10", d.age_10),
        ("age 20", d.age_20),
        ("age 30", d.age_30),
        ("age 40", d.age_40),
        ("age 50", d.age_50),
    ] {
        println!("  {:<7} {} {:>6.2}%", label, utils::pct_bar(pct, 20), pct);
    }
    println!("─────────────────────────────────");
    if report.related_keywords.is_empty() {
        println!("  No related keywords.");
    } else {
        println!("  Related: {}", report.related_keywords.join(", "));
    }
    println!("─────────────────────────────────");
    for day in &report.daily {
        println!("  {}  {:>10}", day.period, utils::fmt_number(day.estimated_count));
    }
    println!("─────────────────────────────────");
}
