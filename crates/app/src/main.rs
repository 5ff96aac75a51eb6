use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use services::{AppServices, CampaignSetup, Clock, QuizConfig};

mod db;
mod host;

#[derive(Parser)]
#[command(name = "campaign", version, about = "Monument quiz campaign")]
struct Cli {
    /// SQLite database URL or path
    #[arg(long = "db", env = "CAMPAIGN_DB_URL", default_value = "sqlite://campaign.sqlite3", global = true)]
    db_url: String,

    /// JSON catalog replacing the built-in monuments
    #[arg(long, env = "CAMPAIGN_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// Continue automatically this many milliseconds after feedback
    #[arg(long, global = true)]
    auto_continue_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the campaign in the terminal (default)
    Play {
        /// Unit to open first (1-based)
        #[arg(long)]
        unit: Option<usize>,
    },

    /// Show score and per-unit progress
    Status,

    /// Show or edit the local leaderboard
    Leaderboard {
        #[command(subcommand)]
        action: Option<LeaderboardAction>,
    },

    /// Erase all campaign progress (leaderboard is kept)
    #[cfg(any(debug_assertions, feature = "admin"))]
    Reset {
        /// Confirm the irreversible reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum LeaderboardAction {
    /// List saved scores (default)
    Show,
    /// Save the current score
    Save {
        /// Player name; defaults to the last name used
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove every saved score
    Clear,
}

fn setup(cli: &Cli) -> Result<CampaignSetup, Box<dyn std::error::Error>> {
    let setup = match &cli.catalog {
        Some(path) => CampaignSetup::from_catalog_file(path)?,
        None => CampaignSetup::builtin()?,
    };
    let quiz = QuizConfig::default().with_auto_continue(cli.auto_continue_ms.map(Duration::from_millis));
    Ok(setup
        .with_quiz_config(quiz)
        .with_clock(Clock::default_clock()))
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let setup = setup(&cli)?;

    // migrations run in `new_sqlite`
    let target = db::DbTarget::parse(&cli.db_url)?;
    target.ensure_file()?;
    let db_url = target.url();
    let app = AppServices::new_sqlite(&db_url, setup).await?;
    tracing::debug!(db = %db_url, "services ready");

    match cli.command.unwrap_or(Commands::Play { unit: None }) {
        Commands::Play { unit } => host::play(&app, unit.map(|u| u.saturating_sub(1))).await,
        Commands::Status => {
            host::print_summary(&app.campaign().progress_summary().await);
            Ok(())
        }
        Commands::Leaderboard { action } => {
            leaderboard(&app, action.unwrap_or(LeaderboardAction::Show)).await
        }
        #[cfg(any(debug_assertions, feature = "admin"))]
        Commands::Reset { yes } => {
            if !yes {
                eprintln!("reset erases all campaign progress; pass --yes to confirm");
                return Ok(());
            }
            app.reset().await;
            if app.campaign().is_degraded() {
                return Err("reset could not be persisted".into());
            }
            println!("campaign progress reset");
            Ok(())
        }
    }
}

async fn leaderboard(
    app: &AppServices,
    action: LeaderboardAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let board = app.leaderboard();
    match action {
        LeaderboardAction::Show => {
            let entries = board.entries().await?;
            if entries.is_empty() {
                println!("No scores yet!");
            }
            for (rank, entry) in entries.entries().iter().enumerate() {
                println!(
                    "{:>2}. {:<20} {:>6}  {}",
                    rank + 1,
                    entry.player_name(),
                    entry.score(),
                    entry.date_label()
                );
            }
        }
        LeaderboardAction::Save { name } => {
            let name = match name {
                Some(name) => name,
                None => board.last_player_name().await?,
            };
            let saved = board.save_score(&name).await?;
            match saved.rank {
                Some(rank) => println!(
                    "Saved {} with {} points (rank {rank})",
                    saved.entry.player_name(),
                    saved.entry.score()
                ),
                None => println!("{} points did not make the top scores", saved.entry.score()),
            }
        }
        LeaderboardAction::Clear => {
            board.clear().await?;
            println!("Leaderboard cleared");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // stderr keeps stdout for the game text
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("campaign=info,services=info,storage=warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
