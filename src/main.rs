// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use tubelingo::app_config::{self, Config, TranslatorMode};
use tubelingo::app_controller::Controller;

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

/// CLI Wrapper for TranslatorMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslatorMode {
    Simple,
    Server,
}

impl From<CliTranslatorMode> for TranslatorMode {
    fn from(cli_mode: CliTranslatorMode) -> Self {
        match cli_mode {
            CliTranslatorMode::Simple => TranslatorMode::Simple,
            CliTranslatorMode::Server => TranslatorMode::Server,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a channel and its video list
    Channel {
        /// Channel URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Fetch a single video's metadata
    Video {
        /// Video URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// List stored videos of a channel
    Videos {
        /// Channel ID
        #[arg(value_name = "CHANNEL_ID")]
        channel_id: String,
    },

    /// Transcribe a local audio file with whisper
    Transcribe {
        /// Video the audio belongs to
        #[arg(value_name = "VIDEO_ID")]
        video_id: String,

        /// Audio file to transcribe
        #[arg(value_name = "AUDIO_FILE")]
        audio_file: PathBuf,
    },

    /// Translate a stored transcription
    Translate(TranslateArgs),

    /// Show a stored translation
    Show {
        /// Translation ID
        #[arg(value_name = "TRANSLATION_ID")]
        translation_id: String,

        /// Print each segment next to its source text
        #[arg(long)]
        segments: bool,
    },

    /// Delete a stored translation
    Delete {
        /// Translation ID
        #[arg(value_name = "TRANSLATION_ID")]
        translation_id: String,
    },

    /// Generate shell completions for tubelingo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Transcription to translate
    #[arg(value_name = "TRANSCRIPTION_ID")]
    transcription_id: String,

    /// Target language code (e.g., 'ja', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Source language code of the transcript (e.g., 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Token budget per batch
    #[arg(long)]
    max_tokens: Option<i64>,

    /// Run the translator per call or as a server
    #[arg(long, value_enum)]
    mode: Option<CliTranslatorMode>,
}

/// tubelingo - YouTube transcript translation
///
/// Fetches channel and video metadata with yt-dlp, transcribes audio with whisper
/// and translates transcripts with plamo-translate.
#[derive(Parser, Debug)]
#[command(name = "tubelingo")]
#[command(version)]
#[command(about = "Transcribe and translate YouTube videos")]
#[command(long_about = "tubelingo stores YouTube metadata, whisper transcriptions and their translations in SQLite.

EXAMPLES:
    tubelingo channel https://www.youtube.com/@example   # Store a channel and its videos
    tubelingo transcribe dQw4w9WgXcQ audio.mp3            # Transcribe a downloaded audio file
    tubelingo translate <TRANSCRIPTION_ID> -t ja          # Translate to Japanese
    tubelingo show <TRANSLATION_ID> --segments            # Show the result per segment
    tubelingo completions bash > tubelingo.bash           # Generate bash completions

CONFIGURATION:
    Configuration is stored in tubelingo.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "tubelingo.json", global = true)]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
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
        // The logger accepts everything; log::set_max_level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and prefix for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌"),
            Level::Warn => ("\x1B[1;33m", "🚧"),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "🔍"),
            Level::Trace => ("\x1B[1;35m", "📋"),
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
            let (color, prefix) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, prefix, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "tubelingo", &mut std::io::stdout());
        return Ok(());
    }

    // If log level is set via command line, apply it immediately
    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&cli)?;
    let controller = Controller::with_config(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling...");
            ctrl_c.cancel();
        }
    });

    run_command(&controller, cli.command, &cancel).await
}

/// Load the config file and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config)?;

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    if let Commands::Translate(args) = &cli.command {
        if let Some(target_language) = &args.target_language {
            config.target_language = target_language.clone();
        }
        if let Some(source_language) = &args.source_language {
            config.source_language = source_language.clone();
        }
        if let Some(max_tokens) = args.max_tokens {
            config.translator.max_tokens = max_tokens;
        }
        if let Some(mode) = &args.mode {
            config.translator.mode = mode.clone().into();
        }
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

async fn run_command(controller: &Controller, command: Commands, cancel: &CancellationToken) -> Result<()> {
    match command {
        Commands::Channel { url } => {
            let (channel, stored) = controller.fetch_channel(&url, cancel).await?;
            println!("{}\t{}\t{} videos", channel.id, channel.title, stored);
        }
        Commands::Video { url } => {
            let video = controller.fetch_video(&url, cancel).await?;
            println!("{}\t{}", video.id, video.title);
        }
        Commands::Videos { channel_id } => {
            let videos = controller.list_videos(&channel_id).await?;
            if videos.is_empty() {
                warn!("No stored videos for channel {}", channel_id);
            }
            for video in videos {
                let duration = video
                    .duration_secs
                    .map(|secs| format!("{}:{:02}", secs / 60, secs % 60))
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", video.id, duration, video.title);
            }
        }
        Commands::Transcribe { video_id, audio_file } => {
            let transcription = controller.transcribe(&video_id, &audio_file, cancel).await?;
            println!("{}", transcription.id);
        }
        Commands::Translate(args) => {
            let translation = controller
                .translate(&args.transcription_id, args.target_language.as_deref(), cancel)
                .await?;
            info!("Translation {} created", translation.id);
            println!("{}", translation.id);
        }
        Commands::Show { translation_id, segments } => {
            let translation = controller
                .show_translation(&translation_id)
                .await?
                .ok_or_else(|| anyhow!("Translation not found: {}", translation_id))?;

            println!(
                "{} ({} -> {}, {}, {})",
                translation.id,
                translation.transcription_id,
                translation.target_language,
                translation.source,
                translation.created_at
            );
            if segments {
                for segment in &translation.segments {
                    println!("[{}] {}\n    {}", segment.segment_index, segment.source_text, segment.translated_text);
                }
            } else {
                println!("{}", translation.content);
            }
        }
        Commands::Delete { translation_id } => {
            if !controller.delete_translation(&translation_id).await? {
                return Err(anyhow!("Translation not found: {}", translation_id));
            }
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
