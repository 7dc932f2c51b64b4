// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use topic_relay::app_config::{self, Config, TransferMode};
use topic_relay::app_controller::Controller;
use topic_relay::transport::Transport;
use topic_relay::transport::telegram::TelegramClient;

/// CLI Wrapper for TransferMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTransferMode {
    Direct,
    Manual,
    DirectThenManual,
}

impl From<CliTransferMode> for TransferMode {
    fn from(cli_mode: CliTransferMode) -> Self {
        match cli_mode {
            CliTransferMode::Direct => TransferMode::Direct,
            CliTransferMode::Manual => TransferMode::Manual,
            CliTransferMode::DirectThenManual => TransferMode::DirectThenManual,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot (default command)
    Run(RunArgs),

    /// Load and validate the configuration, then check the bot token
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Generate shell completions for topic-relay
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct RunArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Transfer strategy to use
    #[arg(short, long, value_enum)]
    mode: Option<CliTransferMode>,

    /// Delay between two transfers, in milliseconds
    #[arg(short, long)]
    delay_ms: Option<u64>,
}

/// Topic Relay - copy a range of channel messages into a new forum topic
///
/// The operator names a topic, then sends the links of the first and last
/// message of the range; the bot copies every message in between without
/// the "forwarded from" header.
#[derive(Parser, Debug)]
#[command(name = "topic-relay")]
#[command(version)]
#[command(about = "Relay a range of channel messages into a new forum topic")]
#[command(long_about = "Topic Relay copies a range of source channel messages into a freshly created forum topic.

EXAMPLES:
    topic-relay                                  # Run with conf.json
    topic-relay run --mode manual                # Always rebuild messages
    topic-relay run --delay-ms 3000              # Slow down between messages
    topic-relay check                            # Validate config and token
    topic-relay completions bash > relay.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. TELEGRAM_BOT_TOKEN, AUTHORIZED_USER_IDS,
    SOURCE_CHANNEL_ID, DESTINATION_GROUP_ID, STAGING_CHAT_ID,
    DELAY_BETWEEN_FORWARDS (seconds), TRANSFER_MODE and LOG_LEVEL override it.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is lowered once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "topic-relay", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Check { config_path }) => run_check(&config_path).await,
        Some(Commands::Run(args)) => run_bot(args).await,
        None => run_bot(cli.run).await,
    }
}

/// Load the config file, creating a default one when missing, then apply env overrides
fn load_config(config_path: &str) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path).context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    Ok(config)
}

async fn run_bot(options: RunArgs) -> Result<()> {
    if let Some(level) = &options.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = load_config(&options.config_path)?;
    if let Some(mode) = options.mode {
        config.transfer.mode = mode.into();
    }
    if let Some(delay_ms) = options.delay_ms {
        config.transfer.delay_ms = delay_ms;
    }
    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    info!(
        "Relaying from {} to {} using {} ({} ms between messages)",
        config.source_channel_id,
        config.destination_group_id,
        config.effective_mode().display_name(),
        config.transfer.delay_ms
    );

    let controller = Controller::with_config(config)?;
    tokio::select! {
        result = controller.run() => result.map_err(|e| anyhow!(e)),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping; a running transfer is abandoned");
            Ok(())
        }
    }
}

async fn run_check(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate().context("Configuration validation failed")?;

    let mode = config.effective_mode();
    if mode != config.transfer.mode {
        warn!(
            "{} needs a staging chat, {} will be used",
            config.transfer.mode.display_name(),
            mode.display_name()
        );
    }
    if mode.needs_fetch() {
        info!("Source messages are read through staging chat {:?}", config.staging_chat_id);
    }

    let client = TelegramClient::new(
        &config.telegram.token,
        &config.telegram.api_endpoint,
        config.telegram.timeout_secs,
    )?;
    let me = client.test_connection().await.context("Bot token check failed")?;
    info!(
        "Configuration OK, bot @{} (id {})",
        me.username.as_deref().unwrap_or(&me.first_name),
        me.id
    );
    Ok(())
}
