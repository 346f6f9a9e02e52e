use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use sheetscout::{
    bot::{sheets_service, CommandHandler, Poller},
    logging,
    metrics::BotMetrics,
    BotConfig, Command, Messages, SearchError,
};
use std::{
    num::NonZeroUsize,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};
use tracing::{info, warn};

type Result<T> = std::result::Result<T, SearchError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// Configuration file, merged over the global and local config files
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,
}

impl ConfigArgs {
    fn load(&self) -> Result<BotConfig> {
        let mut config = BotConfig::load_from(self.config.as_deref())?;
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot and answer commands until stopped
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Number of threads handling a batch of updates
        #[arg(short = 'j', long)]
        workers: Option<NonZeroUsize>,
    },

    /// Run one /search against the configured source and print the reply
    Search {
        #[command(flatten)]
        config: ConfigArgs,

        /// Mode followed by the keyword, e.g. `complete vijay`. Put keywords
        /// starting with `-` after `--`.
        args: Vec<String>,
    },

    /// List the configured modes and their partitions
    Modes {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the effective configuration with secrets hidden
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, workers } => {
            let mut config = config.load()?;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            logging::init(&config.log_level)?;

            let mut poller = Poller::from_config(&config)?;
            info!(
                "{} started with modes: {}",
                config.bot_name,
                config.modes.joined_names()
            );

            let shutdown = shutdown_on_ctrl_c()?;
            poller.run(&shutdown);
            Ok(())
        }
        Commands::Search { config: args_config, args } => {
            let config = args_config.load()?;
            // One-shot searches stay quiet unless a level is asked for
            logging::init(args_config.log_level.as_deref().unwrap_or("warn"))?;

            let service = sheets_service(&config, BotMetrics::new())?;
            let handler = CommandHandler::new(service, Messages::from_config(&config));
            if let Some(reply) = handler.handle(&Command::new("search", args)) {
                println!("{}", reply);
            }
            Ok(())
        }
        Commands::Modes { config } => {
            let config = config.load()?;
            print_modes(&config);
            Ok(())
        }
        Commands::Config { config } => {
            let config = config.load()?;
            print!("{}", config.to_redacted_yaml()?);
            Ok(())
        }
    }
}

/// Returns a flag that is raised when the process receives Ctrl-C.
///
/// The signal is awaited on a small dedicated runtime in its own thread; the
/// poller checks the flag between polls.
fn shutdown_on_ctrl_c() -> Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let flag = shutdown.clone();
    thread::Builder::new()
        .name("sheetscout-signal".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Ctrl-C received, stopping after the current poll");
                        flag.store(true, Ordering::Relaxed);
                    }
                    Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
                }
            });
        })?;

    Ok(shutdown)
}

fn print_modes(config: &BotConfig) {
    println!("Available modes:");
    for mode in &config.modes {
        println!("  {} -> {}", mode.name.green(), mode.partition.blue());
    }
    println!(
        "\nSkipping {} header rows, showing up to {} matches",
        config.header_rows, config.display_cap
    );
}
