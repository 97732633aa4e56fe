//! Command-line front end over a SQLite review database.
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use adaptive_review::{ReviewEvent, ReviewSession, ScheduleStore, SchedulerConfig, SqliteStore};
use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Adaptive spaced-repetition scheduler
#[derive(Parser)]
#[command(name = "adaptive-review")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Record review outcomes and compute adaptive review schedules")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = "reviews.sqlite3")]
    db: PathBuf,

    /// JSON file overriding scheduler constants (otherwise $ADAPTIVE_REVIEW_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a review outcome and reschedule the concept
    Review {
        user_id: String,
        concept_id: String,
        /// Fraction answered correctly (0.0 - 1.0)
        #[arg(long)]
        correctness: f64,
        /// Self-reported confidence after the review (1 - 5)
        #[arg(long)]
        confidence: Option<i64>,
        /// Minutes spent on the review
        #[arg(long)]
        minutes: Option<f64>,
        /// Display label for the concept (defaults to the stored label or the concept id)
        #[arg(long)]
        topic: Option<String>,
        /// Review time in RFC 3339, defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// List a user's concepts that are due for review
    Due {
        user_id: String,
        /// Reference time in RFC 3339, defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Print the stored schedule of a concept
    Show { user_id: String, concept_id: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => SchedulerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SchedulerConfig::load().context("Failed to load config")?,
    };

    let store = SqliteStore::open(&cli.db)
        .with_context(|| format!("Failed to open database {}", cli.db.display()))?;

    match cli.command {
        Commands::Review {
            user_id,
            concept_id,
            correctness,
            confidence,
            minutes,
            topic,
            at,
        } => {
            let now = at.unwrap_or_else(Utc::now);
            let event = ReviewEvent {
                timestamp: now,
                correctness,
                confidence_after: confidence,
                time_taken_minutes: minutes,
            };
            store.record_event(&user_id, &concept_id, &event)?;

            let topic = match topic {
                Some(topic) => topic,
                None => store
                    .get(&user_id, &concept_id)?
                    .map(|s| s.topic_label)
                    .unwrap_or_else(|| concept_id.clone()),
            };

            let session = ReviewSession::with_config(&store, &store, config)?;
            let result = session.record_review_and_reschedule_at(&user_id, &concept_id, &topic, now)?;
            info!(
                "'{}' next review in {} day(s) on {}",
                result.schedule.topic_label,
                result.schedule.interval_days,
                result.schedule.next_review.format("%Y-%m-%d")
            );
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Due { user_id, at } => {
            let now = at.unwrap_or_else(Utc::now);
            let due = store.due_for_review(&user_id, now)?;
            info!("{} concept(s) due for {}", due.len(), user_id);
            println!("{}", serde_json::to_string_pretty(&due)?);
        }
        Commands::Show {
            user_id,
            concept_id,
        } => match store.get(&user_id, &concept_id)? {
            Some(schedule) => println!("{}", serde_json::to_string_pretty(&schedule)?),
            None => bail!("No schedule for user '{}' concept '{}'", user_id, concept_id),
        },
    }

    Ok(())
}
