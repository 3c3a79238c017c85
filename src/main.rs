use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

mod classify;
mod compliance;
mod config;
mod db;
mod import;
mod models;
mod recommend;
mod report;
mod roles;

use classify::Metric;
use models::{NewAction, RecordFilter};
use roles::{Access, Permission, Role};

#[derive(Parser)]
#[command(name = "qperform")]
#[command(about = "Weekly Production/QA performance review for operations leadership", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Period {
    /// Defaults to the current year
    #[arg(long)]
    year: Option<i32>,
    /// Defaults to the current month
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
    #[arg(long)]
    client: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Only count actions dated within the reviewed weeks
    #[arg(long)]
    scope_actions: bool,
    /// Job title of the person requesting the review
    #[arg(long)]
    title: String,
}

impl Period {
    fn authorize(&self) -> Result<Role, roles::AccessError> {
        roles::require(&self.title, Permission::ViewReview)
    }

    fn filter(&self) -> RecordFilter {
        let today = Utc::now().date_naive();
        RecordFilter {
            year: self.year.unwrap_or(today.year()),
            month: self.month.unwrap_or(today.month()),
            client: self.client.clone(),
            category: self.category.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a sample month covering every recommendation level
    Seed,
    /// Import performance records from a CSV or JSON file
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Import action log rows from a CSV or JSON file
    ImportActions {
        #[arg(long)]
        file: PathBuf,
    },
    /// Classify a single score
    Classify {
        #[arg(long, value_enum)]
        metric: Metric,
        /// Score as a fraction, e.g. 0.993
        #[arg(long, allow_negative_numbers = true)]
        score: f64,
    },
    /// Monthly compliance and recommendation per agent
    Review {
        #[command(flatten)]
        period: Period,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown review report
    Report {
        #[command(flatten)]
        period: Period,
        #[arg(long, default_value = "qperform-report.md")]
        out: PathBuf,
    },
    /// Record a corrective action for an agent
    LogAction {
        #[arg(long)]
        email: String,
        #[arg(long)]
        action_type: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Email of the person taking the action
        #[arg(long)]
        taken_by: String,
        /// Job title of the person taking the action
        #[arg(long)]
        title: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        category: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the role and permissions a job title resolves to
    Role {
        #[arg(long)]
        title: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { metric, score } => {
            let status = classify::classify(metric, score);
            println!("{metric} {:.2}% -> {status}", score * 100.0);
        }
        Commands::Role { title } => {
            let role = Role::from_title(&title);
            println!("{title:?} -> {role}");
            for permission in [Permission::ViewReview, Permission::LogAction] {
                let access = match role.authorize(permission) {
                    Access::Granted => "granted",
                    Access::Denied => "denied",
                };
                println!("- {permission:?}: {access}");
            }
        }
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            let (records, actions) = db::seed(&pool).await?;
            println!("Seed data inserted ({records} records, {actions} actions).");
        }
        Commands::Import { file } => {
            let records = import::parse_records(&file)
                .with_context(|| format!("failed to import {}", file.display()))?;
            let pool = connect().await?;
            info!(rows = records.len(), file = %file.display(), "parsed performance records");
            let inserted = db::insert_records(&pool, &records).await?;
            println!("Inserted {inserted} of {} records from {}.", records.len(), file.display());
        }
        Commands::ImportActions { file } => {
            let actions = import::parse_actions(&file)
                .with_context(|| format!("failed to import {}", file.display()))?;
            let pool = connect().await?;
            info!(rows = actions.len(), file = %file.display(), "parsed action log");
            let inserted = db::insert_actions(&pool, &actions).await?;
            println!("Inserted {inserted} of {} actions from {}.", actions.len(), file.display());
        }
        Commands::Review { period, json } => {
            let role = period.authorize()?;
            debug!(%role, "review access granted");
            let pool = connect().await?;
            let filter = period.filter();
            let records = db::fetch_records(&pool, &filter).await?;
            let actions = db::fetch_actions(&pool, filter.email.as_deref()).await?;
            info!(
                period = %filter.label(),
                records = records.len(),
                actions = actions.len(),
                "loaded review data"
            );
            let reviews = report::review_agents(&records, &actions, period.scope_actions);

            if json {
                println!("{}", serde_json::to_string_pretty(&reviews)?);
                return Ok(());
            }

            if reviews.is_empty() {
                println!("No performance records found for {}.", filter.label());
                return Ok(());
            }

            println!("Agent reviews for {}:", filter.label());
            for review in reviews.iter() {
                println!(
                    "- {} ({}) {}/{} compliant weeks, {} action(s): {}{}",
                    review.agent_name,
                    review.agent_email,
                    review.compliance.compliant_weeks,
                    review.compliance.total_weeks,
                    review.compliance.action_count,
                    review.recommendation.action,
                    if review.recommendation.is_critical { " [critical]" } else { "" }
                );
            }
        }
        Commands::Report { period, out } => {
            let role = period.authorize()?;
            debug!(%role, "review access granted");
            let pool = connect().await?;
            let filter = period.filter();
            let records = db::fetch_records(&pool, &filter).await?;
            let actions = db::fetch_actions(&pool, filter.email.as_deref()).await?;
            let report = report::build_report(&filter, &records, &actions, period.scope_actions);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::LogAction {
            email,
            action_type,
            description,
            taken_by,
            title,
            client,
            category,
            date,
        } => {
            let role = roles::require(&title, Permission::LogAction)?;
            let pool = connect().await?;
            let entry = db::insert_action(
                &pool,
                NewAction {
                    agent_email: email,
                    action_type,
                    description,
                    taken_by,
                    action_date: date.unwrap_or_else(|| Utc::now().date_naive()),
                    client,
                    category,
                },
            )
            .await?;
            match entry {
                Some(entry) => {
                    info!(id = %entry.id, agent = %entry.agent_email, %role, "action logged");
                    println!(
                        "Logged {} for {} on {} ({}).",
                        entry.action_type, entry.agent_email, entry.action_date, entry.id
                    );
                }
                None => println!("That action is already logged; nothing inserted."),
            }
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let config = config::Config::from_env()?;
    debug!(max_connections = config.max_connections, "connecting to Postgres");
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")
}
