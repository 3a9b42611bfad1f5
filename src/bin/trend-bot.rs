// Trend Signal Bot - CLI
// Single entry point for scanning, analysis and watch list management

use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};
use trend_signal_bot::{BotError, Config};

// Load command modules from cli directory
#[path = "../cli/scan_commands.rs"]
mod scan_commands;
#[path = "../cli/watch_commands.rs"]
mod watch_commands;

#[derive(Parser)]
#[command(name = "trend-bot")]
#[command(version)]
#[command(about = "Multi-resolution trend scanner with Telegram alerts", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Start the scheduler with an interactive console
    Run {
        /// Log alerts instead of sending them
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Run a single scan cycle and exit
    Scan {
        /// Log alerts instead of sending them
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Print indicator snapshots and the classification for one instrument
    Analyze {
        /// Instrument identifier (e.g., XBTUSD)
        instrument: String,
    },

    /// List tradable instruments on the exchange
    Markets {
        /// Only show instruments containing this text (e.g., USD)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Watch list management
    #[command(subcommand)]
    Watch(WatchCommands),
}

#[derive(Subcommand)]
enum WatchCommands {
    /// Add an instrument
    Add {
        instrument: String,

        /// Skip checking the instrument against the exchange listing
        #[arg(long)]
        no_verify: bool,
    },

    /// Remove an instrument
    Remove {
        instrument: String,
    },

    /// List watched instruments
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Init has no config to read the log level from yet
    let configured_level = match &cli.command {
        Commands::Init { .. } => None,
        _ => Config::from_file(&cli.config).ok().map(|c| c.logging.level),
    };
    init_logging(cli.verbose, configured_level.as_deref());

    if let Err(e) = execute(cli).await {
        error!("❌ {} error", e.category());
        for line in e.user_message().lines() {
            error!("{}", line);
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, configured: Option<&str>) {
    let level = if verbose {
        Level::DEBUG
    } else {
        configured
            .and_then(|l| l.parse::<Level>().ok())
            .unwrap_or(Level::INFO)
    };

    tracing_subscriber::fmt().with_max_level(level).init();
}

async fn execute(cli: Cli) -> Result<(), BotError> {
    info!("📈 Trend Signal Bot v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        // Init doesn't require config (it creates it)
        Commands::Init { force } => init_config(&cli.config, force),

        Commands::Run { dry_run } => {
            let config = load_config(&cli.config)?;
            scan_commands::run_scheduler(config, dry_run).await
        }

        Commands::Scan { dry_run } => {
            let config = load_config(&cli.config)?;
            scan_commands::scan_once(config, dry_run).await
        }

        Commands::Analyze { instrument } => {
            let config = load_config(&cli.config)?;
            scan_commands::analyze(config, &instrument).await
        }

        Commands::Markets { filter } => {
            let config = load_config(&cli.config)?;
            watch_commands::markets(&config, filter.as_deref()).await
        }

        Commands::Watch(cmd) => {
            let config = load_config(&cli.config)?;
            match cmd {
                WatchCommands::Add { instrument, no_verify } => {
                    watch_commands::add(&config, &instrument, !no_verify).await
                }
                WatchCommands::Remove { instrument } => watch_commands::remove(&config, &instrument),
                WatchCommands::List => watch_commands::list(&config),
            }
        }
    }
}

/// Load config, mapping a missing file to a helpful error
fn load_config(path: &str) -> Result<Config, BotError> {
    if !std::path::Path::new(path).exists() {
        return Err(BotError::ConfigNotFound(path.to_string()));
    }
    let mut config = Config::from_file(path)?;
    config.telegram = config.telegram.with_env_overrides();
    info!("📁 Config: {}", path);
    Ok(config)
}

fn init_config(path: &str, force: bool) -> Result<(), BotError> {
    if std::path::Path::new(path).exists() && !force {
        warn!("⚠️  {} already exists, skipping (use --force to overwrite)", path);
        return Ok(());
    }

    std::fs::write(path, include_str!("../../config.toml.example"))
        .map_err(|e| BotError::FileWrite(e.to_string()))?;
    info!("📝 Created {}", path);

    info!("✅ Initialized!");
    info!("💡 Next steps:");
    info!("   1. Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID (or edit {})", path);
    info!("   2. Run: trend-bot scan --dry-run");
    info!("   3. Run: trend-bot run");
    Ok(())
}
