use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swiss_pairing::calculate::win_rate;
use swiss_pairing::config::AppConfig;
use swiss_pairing::pairing::RematchPolicy;
use swiss_pairing::round::RoundController;
use swiss_pairing::storage::{JsonlStore, StorageConfig, TournamentStore};
use swiss_pairing::{Outcome, PlayerId, RoundPairings, Standing, TournamentId};

#[derive(Parser)]
#[command(name = "swiss")]
#[command(about = "Swiss-system tournament pairing")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./swiss.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a tournament and print its id
    Create {
        /// Tournament name
        name: String,
    },

    /// Register players
    Register {
        #[arg(long, short)]
        tournament: String,

        /// Player names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List registered players
    Players {
        #[arg(long, short)]
        tournament: String,
    },

    /// Show current standings
    Standings {
        #[arg(long, short)]
        tournament: String,
    },

    /// Pair the next round
    Pair {
        #[arg(long, short)]
        tournament: String,

        /// Fall back to the fewest rematches when a clean round is impossible
        #[arg(long)]
        allow_rematches: bool,
    },

    /// Report a match result
    Report {
        #[arg(long, short)]
        tournament: String,

        #[arg(long)]
        round: u32,

        #[arg(long, requires = "loser", conflicts_with = "draw")]
        winner: Option<u32>,

        #[arg(long, requires = "winner", conflicts_with = "draw")]
        loser: Option<u32>,

        /// Two player ids that drew
        #[arg(long, num_args = 2, value_names = ["A", "B"])]
        draw: Option<Vec<u32>>,
    },

    /// Record a bye
    Bye {
        #[arg(long, short)]
        tournament: String,

        #[arg(long)]
        round: u32,

        player: u32,
    },

    /// Delete recorded matches and byes
    Reset {
        #[arg(long, short)]
        tournament: String,

        /// Also clear the roster
        #[arg(long)]
        players: bool,
    },
}

fn init_logging(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    config.validate()?;

    init_logging(&config.log_level, cli.json_logs);
    tracing::debug!("Starting swiss v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(JsonlStore::new(StorageConfig::new(config.data_dir.clone())));
    let controller = RoundController::new(Arc::clone(&store), config.pairing.clone());

    match cli.command {
        Commands::Create { name } => {
            let tournament = store.create_tournament(&name).await?;
            println!("{}", tournament.id);
        }

        Commands::Register { tournament, names } => {
            let tournament = TournamentId::from(tournament);
            for name in names {
                let player = store.register_player(&tournament, &name).await?;
                println!("{:>4}  {}", player.id, player.name);
            }
        }

        Commands::Players { tournament } => {
            let tournament = TournamentId::from(tournament);
            let players = store.list_players(&tournament).await?;
            if players.is_empty() {
                println!("No players registered");
            }
            for player in players {
                println!("{:>4}  {}", player.id, player.name);
            }
        }

        Commands::Standings { tournament } => {
            let tournament = TournamentId::from(tournament);
            let standings = controller.get_standings(&tournament).await?;
            print_standings(&standings);
        }

        Commands::Pair {
            tournament,
            allow_rematches,
        } => {
            let tournament = TournamentId::from(tournament);
            let policy = if allow_rematches {
                RematchPolicy::AllowForced
            } else {
                config.pairing.rematch_policy
            };
            let round = controller
                .advance_round_with_policy(&tournament, policy)
                .await?;
            print_round(&round);
        }

        Commands::Report {
            tournament,
            round,
            winner,
            loser,
            draw,
        } => {
            let tournament = TournamentId::from(tournament);
            let (a, b, outcome) = match (winner, loser, draw.as_deref()) {
                (Some(w), Some(l), None) => (w, l, Outcome::AWins),
                (None, None, Some([a, b])) => (*a, *b, Outcome::Draw),
                _ => bail!("Report either --winner and --loser, or --draw A B"),
            };
            let record = controller
                .record_result(&tournament, round, PlayerId(a), PlayerId(b), outcome)
                .await?;
            println!(
                "Round {}: {} vs {} ({})",
                record.round, record.player_a, record.player_b, record.outcome
            );
        }

        Commands::Bye {
            tournament,
            round,
            player,
        } => {
            let tournament = TournamentId::from(tournament);
            let bye = controller
                .record_bye(&tournament, round, PlayerId(player))
                .await?;
            println!("Round {}: {} (bye)", bye.round, bye.player);
        }

        Commands::Reset {
            tournament,
            players,
        } => {
            let tournament = TournamentId::from(tournament);
            let removed = store.delete_matches(&tournament).await?;
            println!("Removed {} matches", removed);
            if players {
                let removed = store.delete_players(&tournament).await?;
                println!("Removed {} players", removed);
            }
        }
    }

    Ok(())
}

fn print_round(round: &RoundPairings) {
    println!("Round {}", round.round);
    for (i, pairing) in round.pairings.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, pairing);
    }
    if !round.forced_rematches.is_empty() {
        println!("  Forced rematches:");
        for pairing in &round.forced_rematches {
            println!("      {}", pairing);
        }
    }
    println!("  Score gap: {}", round.score_gap);
}

fn print_standings(standings: &[Standing]) {
    println!(
        "{:>4}  {:>4}  {:<20} {:>3} {:>3} {:>3} {:>6}",
        "Rank", "ID", "Player", "W", "L", "D", "Win%"
    );
    for (rank, s) in standings.iter().enumerate() {
        println!(
            "{:>4}  {:>4}  {:<20} {:>3} {:>3} {:>3} {:>5.1}%",
            rank + 1,
            s.player_id,
            s.name,
            s.wins,
            s.losses,
            s.draws,
            win_rate(s.wins, s.losses, s.draws) * 100.0
        );
    }
}
