use anyhow::Context;
use availability::TimeRange;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{Config, LogLevel, load_config};
use core_types::{MaintainedTable, MaintenanceMode};
use database::{DbRepository, connect, run_migrations};
use services::{Services, TableOutcome};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Administration tool for the court booking database.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the variables may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _guard = init_tracing(&config, cli.log_level);

    match cli.command {
        Commands::Serve => web_server::run_server(config).await,
        Commands::Availability(args) => handle_availability(args, &open_services(&config).await?).await,
        Commands::Slots(args) => handle_slots(args, &open_services(&config).await?).await,
        Commands::Purge(args) => handle_purge(args, &open_services(&config).await?).await,
        Commands::Maintain(args) => handle_maintain(args, &open_services(&config).await?).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the configured log level. `RUST_LOG` wins over both.
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve,
    /// Check whether a court is free for a time range.
    Availability(AvailabilityArgs),
    /// List the free slots of a court on a day.
    Slots(SlotsArgs),
    /// Delete bookings dated before a cutoff.
    Purge(PurgeArgs),
    /// Validate, clean or back up tables.
    Maintain(MaintainArgs),
}

#[derive(Parser)]
struct AvailabilityArgs {
    #[arg(long)]
    court: i32,
    /// Format: YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,
    /// Format: HH:MM.
    #[arg(long)]
    start: NaiveTime,
    /// Format: HH:MM.
    #[arg(long)]
    end: NaiveTime,
    /// Booking to ignore, when checking a reschedule.
    #[arg(long)]
    exclude: Option<i32>,
}

#[derive(Parser)]
struct SlotsArgs {
    #[arg(long)]
    court: i32,
    #[arg(long)]
    date: NaiveDate,
}

#[derive(Parser)]
struct PurgeArgs {
    /// Bookings dated strictly before this day are removed.
    #[arg(long)]
    before: NaiveDate,
}

#[derive(Parser)]
struct MaintainArgs {
    #[arg(long)]
    mode: MaintenanceMode,
    /// Every maintained table when omitted.
    #[arg(long)]
    table: Option<MaintainedTable>,
}

// ==============================================================================
// Logging
// ==============================================================================

/// Console logging, plus a daily log file when `logging.directory` is set.
/// The returned guard must live until exit so buffered lines are flushed.
fn init_tracing(config: &Config, level: Option<LogLevel>) -> Option<WorkerGuard> {
    let level = level.unwrap_or(config.logging.level);
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
    };

    match &config.logging.directory {
        Some(dir) => {
            use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

            let file_appender = tracing_appender::rolling::daily(dir, &config.logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(filter())
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter()).init();
            None
        }
    }
}

// ==============================================================================
// Commands
// ==============================================================================

fn actor() -> String {
    std::env::var("USER").map(|user| format!("cli:{}", user)).unwrap_or_else(|_| "cli".to_string())
}

async fn open_services(config: &Config) -> anyhow::Result<Services> {
    let pool = connect(&config.database).await?;
    run_migrations(&pool).await?;
    Ok(Services::new(DbRepository::new(pool), config))
}

fn hhmm(range: &TimeRange) -> String {
    format!("{}-{}", range.start().format("%H:%M"), range.end().format("%H:%M"))
}

async fn handle_availability(args: AvailabilityArgs, services: &Services) -> anyhow::Result<()> {
    let requested = TimeRange::new(args.start, args.end)?;
    let report = services
        .bookings
        .check_availability(args.court, args.date, requested, args.exclude)
        .await?;

    if report.available {
        println!("Court {} is free on {} at {}.", args.court, args.date, hhmm(&requested));
        return Ok(());
    }

    println!("Court {} is taken on {} at {}:", args.court, args.date, hhmm(&requested));
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Booking", "Start", "End", "Status"]);
    for slot in &report.conflicts {
        table.add_row(vec![
            slot.id.to_string(),
            slot.start_time.format("%H:%M").to_string(),
            slot.end_time.format("%H:%M").to_string(),
            slot.status.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn handle_slots(args: SlotsArgs, services: &Services) -> anyhow::Result<()> {
    let slots = services.bookings.free_slots(args.court, args.date).await?;
    if slots.is_empty() {
        println!("No free slots for court {} on {}.", args.court, args.date);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Start", "End", "Minutes"]);
    for slot in &slots {
        table.add_row(vec![
            slot.start().format("%H:%M").to_string(),
            slot.end().format("%H:%M").to_string(),
            slot.duration_minutes().to_string(),
        ]);
    }
    println!("Free slots for court {} on {}:", args.court, args.date);
    println!("{table}");
    Ok(())
}

async fn handle_purge(args: PurgeArgs, services: &Services) -> anyhow::Result<()> {
    let removed = services.bookings.purge_before(args.before, &actor()).await?;
    tracing::info!(removed, before = %args.before, "Purge finished.");
    println!("Removed {} booking(s) dated before {}.", removed, args.before);
    Ok(())
}

async fn handle_maintain(args: MaintainArgs, services: &Services) -> anyhow::Result<()> {
    let actor = actor();
    let outcomes = match args.table {
        Some(table) => {
            let result = services.maintenance.run(table, args.mode, &actor).await?;
            vec![(table, TableOutcome::Ok { result })]
        }
        None => services
            .maintenance
            .run_all(args.mode, &actor)
            .await
            .into_iter()
            .collect(),
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Table", "Status", "Result"]);
    let mut failures = 0;
    for (name, outcome) in &outcomes {
        let (status, detail) = match outcome {
            TableOutcome::Ok { result } => ("ok", serde_json::to_string(result)?),
            TableOutcome::Failed { error } => {
                failures += 1;
                ("failed", error.clone())
            }
        };
        table.add_row(vec![name.to_string(), status.to_string(), detail]);
    }
    println!("{table}");

    if failures > 0 {
        anyhow::bail!("{} table(s) failed during {}", failures, args.mode);
    }
    Ok(())
}
