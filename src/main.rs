use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use incident_leaderboard::config::Config;
use incident_leaderboard::models::{Agent, IncidentCategory, IncidentRecord};
use incident_leaderboard::ranking::{self, RankingKey};
use incident_leaderboard::{aggregate, daily, db, report};

#[derive(Parser)]
#[command(name = "incident-leaderboard")]
#[command(about = "Incident tracker and leaderboards for agents", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to ./leaderboard.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo agents, incidents and quotes
    Seed,
    /// Register a new agent
    RegisterAgent {
        #[arg(long)]
        name: String,
    },
    /// Record an incident against an agent
    RecordIncident {
        #[arg(long)]
        agent_number: i32,
        #[arg(long)]
        category: IncidentCategory,
        #[arg(long)]
        cost: Decimal,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Import incidents from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List agents with their running totals
    Agents,
    /// Print one leaderboard view
    Leaderboard {
        /// incidents, cost, score, or a category (boat, car, plane, motorcycle, other)
        #[arg(long, default_value = "incidents")]
        view: RankingKey,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show the quote of the day
    Daily {
        /// Calendar day as YYYY-MM-DD (defaults to today, local time)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Generate a markdown report with every leaderboard
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;
    init_logging(&config);

    let database_url = config
        .database_url()
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    debug!("connected to Postgres");

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::RegisterAgent { name } => {
            let agent = db::register_agent(&pool, &name).await?;
            println!("Registered {} as agent #{}.", agent.name, agent.agent_number);
        }
        Commands::RecordIncident {
            agent_number,
            category,
            cost,
            note,
        } => {
            let agent = db::record_incident(&pool, agent_number, category, cost, &note).await?;
            println!(
                "Recorded {} incident for {} (now {} incidents, {:.2} total cost).",
                category, agent.name, agent.total_incidents, agent.total_cost
            );
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} incidents from {}.", csv.display());
        }
        Commands::Agents => {
            let agents = db::list_agents(&pool)
                .await
                .map_err(data_unavailable)?;
            if agents.is_empty() {
                println!("No agents registered.");
                return Ok(());
            }
            for agent in agents.iter() {
                println!(
                    "- #{} {}: {} incidents, {:.2} total cost, score {:.2}",
                    agent.agent_number,
                    agent.name,
                    agent.total_incidents,
                    agent.total_cost,
                    aggregate::combined_score(agent)
                );
            }
        }
        Commands::Leaderboard { view, limit, json } => {
            let (agents, incidents) = load_snapshot(&pool).await?;
            let summaries = aggregate::summarize_agents(&agents, &incidents);
            let limit = limit.unwrap_or_else(|| config.leaderboard.limits().for_key(view));
            let entries = ranking::rank(&summaries, view, limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            println!("{}:", view.title());
            if entries.is_empty() {
                println!("No eligible agents.");
            }
            for entry in entries.iter() {
                println!("- {}", report::entry_line(view, entry));
            }
        }
        Commands::Daily { date } => {
            let date = date.unwrap_or_else(today);
            let pool_items = db::list_active_content_items(&pool)
                .await
                .map_err(data_unavailable)?;
            if pool_items.is_empty() {
                println!("No quote of the day available.");
                return Ok(());
            }
            let item = daily::select_daily(&pool_items, date)?;
            println!("\"{}\"", item.body);
            if let Some(author) = &item.author {
                println!("  - {author}");
            }
        }
        Commands::Report { out, date } => {
            let date = date.unwrap_or_else(today);
            let (agents, incidents) = load_snapshot(&pool).await?;
            let set =
                ranking::recompute_leaderboards(&agents, &incidents, config.leaderboard.limits());

            let pool_items = db::list_active_content_items(&pool)
                .await
                .map_err(data_unavailable)?;
            let quote = if pool_items.is_empty() {
                None
            } else {
                Some(daily::select_daily(&pool_items, date)?)
            };

            let output = report::build_report(&set, date, quote);
            std::fs::write(&out, output)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn load_snapshot(pool: &PgPool) -> anyhow::Result<(Vec<Agent>, Vec<IncidentRecord>)> {
    let agents = db::list_agents(pool).await.map_err(data_unavailable)?;
    let incidents = db::list_incidents(pool, None)
        .await
        .map_err(data_unavailable)?;
    Ok((agents, incidents))
}

fn data_unavailable(err: anyhow::Error) -> anyhow::Error {
    warn!("store read failed: {err:#}");
    err.context("data unavailable")
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
