mod logging;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use csv_adapter::CsvRecordWriter;
use json_adapter::JsonRecordWriter;
use markdown_adapter::MarkdownWriterAdapter;
use sqlite_adapter::SqliteRecordWriter;
use tracing::{debug, info};
use trending_core::config::{self, FetchSettings};
use trending_core::domain::{MaxResults, RegionCode, TrendingQuery};
use trending_core::ports::RecordWriter;
use trending_core::validation::{ValidationPolicy, Validator};
use trending_core::{PipelineReport, TrendingPipeline};
use youtube_adapter::YouTubeTrendingSource;

/// Fetch YouTube trending videos, validate them, and save them
#[derive(Parser, Debug)]
#[command(name = "yt-trending", version)]
#[command(about = "Fetches the YouTube trending chart for a region and writes it to JSON, CSV, Markdown or SQLite")]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and save trending YouTube videos
    Fetch(FetchArgs),
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Region code, e.g. US, CA
    #[arg(short, long, default_value = "US", value_parser = parse_region)]
    region: RegionCode,

    /// Number of trending videos to fetch (1-50)
    #[arg(short, long, default_value = "5", value_parser = parse_limit)]
    limit: MaxResults,

    /// Save output to trending_<REGION>.json
    #[arg(long)]
    json: bool,

    /// Save output to trending_<REGION>.csv
    #[arg(long)]
    csv: bool,

    /// Save a report to trending_<REGION>.md
    #[arg(long)]
    markdown: bool,

    /// Upsert records into this SQLite database
    #[arg(long, value_name = "DB")]
    sqlite: Option<PathBuf>,

    /// Directory for the JSON, CSV and Markdown files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Drop invalid records instead of rejecting the whole response
    #[arg(long)]
    lenient: bool,

    /// File to read YOUTUBE_API_KEY from when it is not in the environment
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// API root, e.g. a local mock server
    #[arg(long, env = config::BASE_URL_VAR, default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

fn parse_region(s: &str) -> std::result::Result<RegionCode, String> {
    s.parse().map_err(|e: trending_core::PipelineError| e.to_string())
}

fn parse_limit(s: &str) -> std::result::Result<MaxResults, String> {
    let value: u32 = s.trim().parse().map_err(|_| format!("{s:?} is not a number"))?;
    MaxResults::new(value).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fetch(args) => fetch(args),
    }
}

fn fetch(args: FetchArgs) -> Result<()> {
    let query = TrendingQuery {
        region: args.region.clone(),
        max_results: args.limit,
    };

    let api_key = config::load_api_key(args.env_file.as_deref()).context("loading API key")?;
    let settings = FetchSettings::new(&args.base_url, Duration::from_secs(args.timeout_secs))?;
    debug!(endpoint = %settings.videos_endpoint(), timeout = ?settings.timeout, "fetch settings");

    // Instantiate concrete implementations of the adapters
    let source = YouTubeTrendingSource::new(api_key, &settings)?;
    let validator = Validator::new(if args.lenient {
        ValidationPolicy::Lenient
    } else {
        ValidationPolicy::Strict
    });

    let pipeline = TrendingPipeline::new(Box::new(source), validator, build_writers(&args));
    let report = pipeline
        .run(&query)
        .with_context(|| format!("fetching trending videos for {}", query.region))?;

    print_report(&report);
    Ok(())
}

/// Writers in the order they run: files first, then the database
fn build_writers(args: &FetchArgs) -> Vec<Box<dyn RecordWriter>> {
    let mut writers: Vec<Box<dyn RecordWriter>> = Vec::new();
    if args.json {
        writers.push(Box::new(JsonRecordWriter::new(&args.output_dir)));
    }
    if args.csv {
        writers.push(Box::new(CsvRecordWriter::new(&args.output_dir)));
    }
    if args.markdown {
        writers.push(Box::new(MarkdownWriterAdapter::new(&args.output_dir)));
    }
    if let Some(db) = &args.sqlite {
        writers.push(Box::new(SqliteRecordWriter::new(db)));
    }
    writers
}

fn print_report(report: &PipelineReport) {
    println!(
        "\nFetched top {} trending videos in {}\n",
        report.accepted, report.region
    );
    for issue in &report.rejected {
        println!("Skipped {}", issue);
    }
    for output in &report.outputs {
        info!(destination = %output.destination, rows = output.rows, "output saved");
        println!("Saved {} record(s) to {}", output.rows, output.destination);
    }
}
