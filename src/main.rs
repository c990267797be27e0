use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use review_pulse::buckets::bucket_by_month;
use review_pulse::config::EngineConfig;
use review_pulse::db;
use review_pulse::directory::{business_detail, rank_businesses, RankingOrder};
use review_pulse::metrics::summarize_with_trend;
use review_pulse::models::{AggregateMetrics, MonthBucket};
use review_pulse::report::{self, DashboardReport};
use review_pulse::sources::{distribute_by_source, SourceDistribution, SourceNormalization};

#[derive(Parser)]
#[command(name = "review-pulse")]
#[command(about = "Review aggregation and business directory metrics", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true, env = "REVIEW_PULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("window")
        .args(["window_reviews", "window_days"])
        .multiple(false)
))]
struct AnalyticsArgs {
    /// Business slug
    #[arg(long)]
    business: String,
    /// Compare the newest N reviews with the N before them
    #[arg(long)]
    window_reviews: Option<usize>,
    /// Compare the last N days with the N days before them
    #[arg(long)]
    window_days: Option<i64>,
    /// Anchor date for day windows (defaults to today, UTC)
    #[arg(long)]
    as_of: Option<NaiveDate>,
    #[arg(long, value_enum)]
    normalization: Option<SourceNormalization>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo businesses and reviews
    Seed,
    /// Import reviews from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print monthly trend, source volume and key metrics as JSON
    Analytics(AnalyticsArgs),
    /// List public businesses with their ratings
    Directory {
        #[arg(long, value_enum)]
        order: Option<RankingOrder>,
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown performance report for one business
    Report {
        #[command(flatten)]
        analytics: AnalyticsArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Serialize)]
struct AnalyticsOutput<'a> {
    business: String,
    as_of: NaiveDate,
    metrics: &'a AggregateMetrics,
    monthly: &'a [MonthBucket],
    sources: &'a SourceDistribution,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = EngineConfig::load_or_default(cli.config.as_deref())?;

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} reviews from {}.", csv.display());
        }
        Commands::Analytics(args) => {
            config.override_trend(args.window_reviews, args.window_days);
            let normalization = args.normalization.unwrap_or(config.sources.normalization);
            let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());

            let profile = db::find_business(&pool, &args.business).await?;
            let metrics = summarize_with_trend(&profile.reviews, &config.trend, as_of)?;
            let monthly = bucket_by_month(&profile.reviews)?;
            let sources = distribute_by_source(&profile.reviews, normalization);

            let output = AnalyticsOutput {
                business: profile.display_name(),
                as_of,
                metrics: &metrics,
                monthly: &monthly,
                sources: &sources,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Directory { order, json } => {
            let order = order.unwrap_or(config.directory.order);
            let profiles = db::fetch_public_profiles(&pool).await?;
            let ranked = rank_businesses(&profiles, order)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                print!("{}", report::build_directory_report(&ranked));
            }
        }
        Commands::Report { analytics, out } => {
            config.override_trend(analytics.window_reviews, analytics.window_days);
            let normalization = analytics
                .normalization
                .unwrap_or(config.sources.normalization);
            let as_of = analytics.as_of.unwrap_or_else(|| Utc::now().date_naive());

            let profile = db::find_business(&pool, &analytics.business).await?;
            let metrics = summarize_with_trend(&profile.reviews, &config.trend, as_of)?;
            let monthly = bucket_by_month(&profile.reviews)?;
            let sources = distribute_by_source(&profile.reviews, normalization);
            let detail = business_detail(&profile, config.directory.recent_reviews)?;
            let business = profile.display_name();

            let markdown = report::build_dashboard_report(&DashboardReport {
                business: &business,
                as_of,
                metrics: &metrics,
                buckets: &monthly,
                sources: &sources,
                recent: &detail.recent_reviews,
            });
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(business = %business, path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
