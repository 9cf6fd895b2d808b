// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use jatoko::app_config::{self, Config, TranslationProvider};
use jatoko::app_controller::Controller;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Deepl,
    Mock,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Deepl => TranslationProvider::DeepL,
            CliTranslationProvider::Mock => TranslationProvider::Mock,
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

/// Options shared by every subcommand that reads documents
#[derive(clap::Args, Debug, Clone)]
struct CommonArgs {
    /// Source language code (e.g., 'ja')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'ko')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(clap::Args, Debug)]
struct TranslateArgs {
    /// SVG / .uml.json file or directory to process
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (or directory when INPUT is a directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Cancel the run after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args, Debug)]
struct ExtractArgs {
    /// SVG / .uml.json file or directory to inspect
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate documents, reusing cached translations
    Translate(TranslateArgs),

    /// Print the translatable text of documents as JSON without translating
    Extract(ExtractArgs),

    /// Generate shell completions for jatoko
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// jatoko - incremental Japanese to Korean translation of diagrams and SVGs
#[derive(Parser, Debug)]
#[command(name = "jatoko")]
#[command(version)]
#[command(about = "Incremental translation of UML diagram models and SVG files")]
#[command(long_about = "jatoko extracts Japanese text from diagram models (*.uml.json) and SVG files,
translates only what changed since the last run and writes a Korean copy that keeps
the original text reachable.

EXAMPLES:
    jatoko translate model.uml.json              # Writes model_translated.uml.json
    jatoko translate -f drawings/                 # Translate a folder, overwrite outputs
    jatoko translate -o out.svg figure.svg        # Explicit output file
    jatoko translate -p mock figure.svg           # Offline run with the mock backend
    jatoko extract model.uml.json                 # Show units and cache coverage
    jatoko completions bash > jatoko.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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
        // The logger itself accepts everything; `set_max_level` does the filtering
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => " ",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
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
            let level = record.level();
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
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
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "jatoko", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
        Commands::Extract(args) => run_extract(args),
    }
}

/// Load or create the configuration and apply command line overrides
fn load_config(common: &CommonArgs, provider: Option<CliTranslationProvider>) -> Result<Config> {
    // Apply the command line level right away so config loading is logged with it
    if let Some(level) = &common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = if common.config.exists() {
        Config::from_file(&common.config)?
    } else {
        warn!("Config file not found at {:?}, creating default config.", common.config);
        let config = Config::default();
        config.save_to_file(&common.config)?;
        config
    };

    if let Some(provider) = provider {
        config.translation.provider = provider.into();
    }
    if let Some(source_language) = &common.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &common.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(level) = &common.log_level {
        config.log_level = level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let config = load_config(&args.common, args.provider.clone())?;
    let controller = Controller::with_config(config)?;

    let cancel = CancellationToken::new();
    if let Some(seconds) = args.timeout_secs {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            warn!("Timeout of {}s reached, cancelling", seconds);
            token.cancel();
        });
    }
    {
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                token.cancel();
            }
        });
    }

    if args.input.is_file() {
        let outcome = controller.run(args.input, args.output, args.force, &cancel).await?;
        info!("Wrote {}", outcome.output.display());
    } else if args.input.is_dir() {
        let batch = controller.run_folder(args.input, args.output, args.force, &cancel).await?;
        if !batch.failed.is_empty() {
            return Err(anyhow!("{} documents failed", batch.failed.len()));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input));
    }
    Ok(())
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    // The dry run never talks to the translation service
    let config = load_config(&args.common, Some(CliTranslationProvider::Mock))?;
    let controller = Controller::with_config(config)?;

    let previews = controller.extract(Path::new(&args.input))?;
    let json = serde_json::to_string_pretty(&previews).context("Failed to serialize extracted units")?;
    println!("{}", json);
    Ok(())
}
