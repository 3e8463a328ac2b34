//! Maintenance CLI for the reward engine.
//!
//! Inspects the event catalog, triggers events directly and manages the
//! silver ledger from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use game_events::{EventCatalog, EventExecutor, EventRepository};
use rewards::config::RewardsConfig;
use rewards::ledger::{BalanceLedger, BalanceStore};

/// Command line arguments for the reward engine CLI
#[derive(Parser, Debug)]
#[command(name = "rewards-cli")]
#[command(about = "Inspect and exercise the chat reward engine")]
struct Args {
    /// Directory of event definition files (*.jsonc)
    #[arg(long, default_value = "events")]
    events_dir: PathBuf,

    /// Path to the balance ledger file
    #[arg(long, default_value = "balances.json")]
    balances: PathBuf,

    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all loaded event definitions
    List,
    /// List every tag used by the loaded definitions
    Tags,
    /// Pick a random event, optionally constrained by tags
    Pick {
        /// Required tags, comma-separated
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Execute an event's requests against the game API
    Trigger {
        /// Event id
        id: String,
    },
    /// Show all silver balances
    Balances,
    /// Credit silver to a user
    Award {
        user: String,
        amount: i64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match RewardsConfig::from_file(path) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("Error loading config {}: {}", path.display(), error);
                std::process::exit(1);
            }
        },
        None => RewardsConfig::default(),
    };

    let catalog = EventCatalog::new(EventRepository::new(&args.events_dir));

    match args.command {
        Command::List => {
            let entries = catalog.entries();
            if entries.is_empty() {
                println!("No event definitions in {}", args.events_dir.display());
                return;
            }
            for entry in entries {
                let definition = &entry.definition;
                println!(
                    "{:<24} {:<28} cost: {:<6} tags: [{}]",
                    definition.id,
                    definition.label,
                    definition.cost,
                    definition.tags.join(", ")
                );
            }
        }
        Command::Tags => {
            for tag in catalog.all_tags() {
                println!("{}", tag);
            }
        }
        Command::Pick { tags } => match catalog.pick_random(&tags) {
            Some(definition) => println!("{} ({})", definition.id, definition.label),
            None => {
                println!("No matching events");
                std::process::exit(1);
            }
        },
        Command::Trigger { id } => {
            let Some(definition) = catalog
                .all()
                .into_iter()
                .find(|definition| definition.id == id)
            else {
                eprintln!("Unknown event id: {}", id);
                std::process::exit(1);
            };

            let executor = match EventExecutor::new() {
                Ok(executor) => executor,
                Err(error) => {
                    eprintln!("Error building HTTP client: {}", error);
                    std::process::exit(1);
                }
            };

            let outcomes =
                executor.execute_detailed(&config.api.host, config.api.port, &definition);
            let mut failed = false;
            for outcome in &outcomes {
                println!("{}", outcome.display());
                failed |= !outcome.ok;
            }
            if failed {
                std::process::exit(1);
            }
        }
        Command::Balances => {
            let ledger = BalanceLedger::open(BalanceStore::new(&args.balances));
            let balances = ledger.all_balances();
            if balances.is_empty() {
                println!("No balances recorded");
                return;
            }
            for (user, balance) in balances {
                println!("{:<24} {}", user, balance);
            }
        }
        Command::Award { user, amount } => {
            let ledger = BalanceLedger::open(BalanceStore::new(&args.balances));
            let new_balance = ledger.add_silver(&user, amount);
            ledger.persist();
            println!("{} now has {} silver", user.trim().to_lowercase(), new_balance);
        }
    }
}
