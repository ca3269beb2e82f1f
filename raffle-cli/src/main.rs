mod commands;
mod config;

use clap::{Parser, Subcommand};
use raffle_core::RaffleError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "raffle")]
#[command(about = "Time-gated verifiably-random prize raffle simulator")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run complete rounds against the simulated oracle
    Simulate {
        /// Network profile to use
        #[arg(short, long, default_value = "local")]
        network: String,
        /// Number of participants per round
        #[arg(short, long, default_value_t = 4)]
        participants: usize,
        /// Number of rounds to run
        #[arg(short, long, default_value_t = 1)]
        rounds: u32,
        /// Oracle seed for a reproducible run
        #[arg(short, long)]
        seed: Option<u8>,
    },
    /// List the built-in network profiles
    Profiles,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "raffle={},raffle_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        Commands::Simulate {
            network,
            participants,
            rounds,
            seed,
        } => match config::profile(&network) {
            Some(profile) => commands::simulate(&profile, participants, rounds, seed).await,
            None => Err(RaffleError::config(format!(
                "Unknown network profile '{}'",
                network
            ))),
        },
        Commands::Profiles => {
            commands::show_profiles(&config::builtin_profiles());
            Ok(())
        }
    };

    if let Err(e) = result {
        match e {
            RaffleError::Config(msg) => {
                eprintln!("Error: {}", msg);
                eprintln!("Use 'raffle profiles' to see available networks");
            }
            RaffleError::UpkeepNotNeeded {
                pool_balance,
                participant_count,
                state,
            } => {
                eprintln!("Error: Upkeep not needed");
                eprintln!(
                    "Pool: {} units, participants: {}, state: {}",
                    pool_balance, participant_count, state
                );
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
