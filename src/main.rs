use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, FixedOffset, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod allocation;
mod attendance;
mod cache;
mod config;
mod db;
mod error;
mod feedback;
mod hourly;
mod insights;
mod logging;
mod models;
mod report;
mod streak;
mod timezone;
mod window;

use cache::CacheKind;
use config::Settings;
use feedback::{ChatFeedbackClient, FeedbackRequest};
use models::{FocusResponse, StudyStatistics};

#[derive(Parser)]
#[command(name = "focus-insights")]
#[command(about = "Focus and study-time insights from recorded activity", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load two weeks of demo history
    Seed {
        #[arg(long, default_value_t = 1)]
        user: i64,
    },
    /// Import focus samples and/or study sessions from CSV files
    #[command(group(
        ArgGroup::new("source")
            .args(["focus_csv", "sessions_csv"])
            .required(true)
            .multiple(true)
    ))]
    Import {
        #[arg(long)]
        focus_csv: Option<PathBuf>,
        #[arg(long)]
        sessions_csv: Option<PathBuf>,
    },
    /// Record one focus sample at the current time
    RecordFocus {
        #[arg(long)]
        user: i64,
        #[arg(long, value_parser = clap::value_parser!(i32).range(0..=100))]
        status: i32,
    },
    /// Open a study session
    StartSession {
        #[arg(long)]
        user: i64,
    },
    /// Close the most recent study session
    StopSession {
        #[arg(long)]
        user: i64,
    },
    /// Print focus insights for the last 30 days as JSON
    Focus {
        #[arg(long)]
        user: i64,
        #[arg(
            long,
            default_value = timezone::DEFAULT_OFFSET,
            value_parser = timezone::parse_offset
        )]
        tz: FixedOffset,
        #[arg(long)]
        no_cache: bool,
    },
    /// Print study-time statistics as JSON
    Stats {
        #[arg(long)]
        user: i64,
        #[arg(
            long,
            default_value = timezone::DEFAULT_OFFSET,
            value_parser = timezone::parse_offset
        )]
        tz: FixedOffset,
        #[arg(long)]
        no_cache: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        user: i64,
        #[arg(
            long,
            default_value = timezone::DEFAULT_OFFSET,
            value_parser = timezone::parse_offset
        )]
        tz: FixedOffset,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long)]
        no_cache: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings;
    logging::init(&settings.log_level);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(settings.database_url()?)
        .await
        .context("failed to connect to Postgres")?;

    let feedback_client = settings
        .feedback_config()
        .map(ChatFeedbackClient::new)
        .transpose()
        .context("failed to build feedback client")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed { user } => {
            db::seed(&pool, user).await?;
            cache::evict(&pool, user, CacheKind::Focus).await?;
            cache::evict(&pool, user, CacheKind::Study).await?;
            println!("Seed data inserted for user {user}.");
        }
        Commands::Import {
            focus_csv,
            sessions_csv,
        } => {
            if let Some(path) = focus_csv {
                let summary = db::import_focus_csv(&pool, &path).await?;
                for user in &summary.users {
                    cache::evict(&pool, *user, CacheKind::Focus).await?;
                }
                println!(
                    "Inserted {} focus samples from {}.",
                    summary.inserted,
                    path.display()
                );
            }
            if let Some(path) = sessions_csv {
                let summary = db::import_sessions_csv(&pool, &path).await?;
                for user in &summary.users {
                    cache::evict(&pool, *user, CacheKind::Study).await?;
                }
                println!(
                    "Inserted {} study sessions from {}.",
                    summary.inserted,
                    path.display()
                );
            }
        }
        Commands::RecordFocus { user, status } => {
            db::record_focus(&pool, user, status).await?;
            cache::evict(&pool, user, CacheKind::Focus).await?;
            tracing::info!(user_id = user, status, "Focus sample recorded");
            println!("Recorded focus {status} for user {user}.");
        }
        Commands::StartSession { user } => {
            let started_at = db::start_session(&pool, user).await?;
            cache::evict(&pool, user, CacheKind::Study).await?;
            tracing::info!(user_id = user, %started_at, "Study session started");
            println!("Study session started at {started_at}.");
        }
        Commands::StopSession { user } => {
            let ended_at = db::stop_session(&pool, user).await?;
            cache::evict(&pool, user, CacheKind::Study).await?;
            tracing::info!(user_id = user, %ended_at, "Study session stopped");
            println!("Study session stopped at {ended_at}.");
        }
        Commands::Focus { user, tz, no_cache } => {
            let response =
                focus_response(&pool, &settings, feedback_client.as_ref(), user, tz, no_cache)
                    .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Stats { user, tz, no_cache } => {
            let statistics = study_statistics(&pool, &settings, user, tz, no_cache).await?;
            println!("{}", serde_json::to_string_pretty(&statistics)?);
        }
        Commands::Report {
            user,
            tz,
            out,
            no_cache,
        } => {
            let focus =
                focus_response(&pool, &settings, feedback_client.as_ref(), user, tz, no_cache)
                    .await?;
            let study = study_statistics(&pool, &settings, user, tz, no_cache).await?;
            let report = report::build_report(&tz, &focus, &study);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn focus_response(
    pool: &PgPool,
    settings: &Settings,
    feedback_client: Option<&ChatFeedbackClient>,
    user_id: i64,
    offset: FixedOffset,
    no_cache: bool,
) -> anyhow::Result<FocusResponse> {
    let key = CacheKind::Focus.key(&offset);
    cache::read_through(pool, user_id, &key, settings.cache_policy(no_cache), move || async move {
        let since = Utc::now() - Duration::days(insights::FOCUS_LOOKBACK_DAYS);
        let samples = db::fetch_focus_samples(pool, user_id, since).await?;
        tracing::info!(user_id, samples = samples.len(), "Computing focus insights");

        let insights = insights::compute_focus_insights(&samples, &offset);
        let request = FeedbackRequest::from_insights(&insights);
        let feedback = feedback::feedback_or_default(feedback_client, &request).await;

        Ok::<_, anyhow::Error>(FocusResponse {
            user_id,
            feedback,
            insights,
        })
    })
    .await
}

async fn study_statistics(
    pool: &PgPool,
    settings: &Settings,
    user_id: i64,
    offset: FixedOffset,
    no_cache: bool,
) -> anyhow::Result<StudyStatistics> {
    let key = CacheKind::Study.key(&offset);
    cache::read_through(pool, user_id, &key, settings.cache_policy(no_cache), move || async move {
        let sessions = db::fetch_study_sessions(pool, user_id).await?;
        tracing::info!(user_id, sessions = sessions.len(), "Computing study statistics");

        Ok::<_, anyhow::Error>(insights::compute_study_statistics(
            user_id,
            &sessions,
            Utc::now(),
            &offset,
        ))
    })
    .await
}
