// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use readalong::app_config::{self, Config};
use readalong::file_utils::{self, FileManager};
use readalong::formats::{self, detect_format};
use readalong::pipeline::{self, decode_payload};
use readalong::providers::http::HttpFetcher;
use readalong::providers::simulated::{SimulatedTransport, TimedSpeech};
use readalong::providers::{SpeechSynthesizer, Transport};
use readalong::session::{self, CaptionLoader, PlaybackSession, SessionConfig};
use readalong::timestamp::{format_clock, format_srt_timestamp};
use readalong::youtube::{self, CaptionTrack, TrackSelection};

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

/// Output format of the merge command
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MergeFormat {
    Json,
    Srt,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the detected format and the parsed entries of a caption file
    Inspect {
        /// Caption file (SRT, WebVTT or timed-text XML)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of entries to print
        #[arg(short = 'n', long, default_value_t = 5)]
        limit: usize,
    },

    /// Merge a source and a translation track into bilingual sentences
    Merge {
        /// Source-language caption file or http(s) URL
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Translation caption file, or URL when SOURCE is a URL
        #[arg(short, long)]
        target: Option<String>,

        /// Output file (defaults to <SOURCE stem>.bilingual.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = MergeFormat::Srt)]
        format: MergeFormat,
    },

    /// Simulate playback of a caption file, with optional read-along narration
    Play {
        /// Source-language caption file or http(s) URL
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Translation caption file, or URL when SOURCE is a URL
        #[arg(short, long)]
        target: Option<String>,

        /// Pause at each sentence end and speak the translation
        #[arg(short, long)]
        narrate: bool,

        /// Caption offset in seconds
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        offset: f64,

        /// Shift the offset by this many configured steps
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        nudge: i32,

        /// Playback speed multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Media length in seconds (defaults to the end of the last sentence)
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Print the video id of a YouTube link
    VideoId {
        /// YouTube URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Generate shell completions for readalong
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// readalong - bilingual caption read-along
///
/// Parses caption files, pairs them with their translation and plays them
/// back against a clock, optionally narrating each translated sentence.
#[derive(Parser, Debug)]
#[command(name = "readalong")]
#[command(version)]
#[command(about = "Bilingual caption parser and read-along player")]
#[command(long_about = "readalong turns caption files into timed bilingual sentences and keeps them in sync with playback.

EXAMPLES:
    readalong inspect talk.en.vtt                      # Show format and first entries
    readalong merge talk.en.srt -t talk.zh.srt         # Write talk.en.bilingual.srt
    readalong merge talk.en.vtt -t talk.zh.vtt -f json # Sentences with word timings as JSON
    readalong play talk.en.srt -t talk.zh.srt --narrate --speed 4
    readalong merge 'https://www.youtube.com/api/timedtext?v=dQw4w9WgXcQ&lang=en' # Machine-translated target
    readalong video-id https://youtu.be/dQw4w9WgXcQ
    readalong completions bash > readalong.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

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
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
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
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "readalong", &mut std::io::stdout());
            Ok(())
        }
        Commands::VideoId { url } => {
            let id = youtube::extract_video_id(&url).ok_or_else(|| anyhow!("Not a YouTube video link: {}", url))?;
            println!("{}", id);
            Ok(())
        }
        Commands::Inspect { file, limit } => {
            apply_cli_log_level(cli.log_level.as_ref());
            run_inspect(&file, limit)
        }
        Commands::Merge { source, target, output, format } => {
            let config = load_config(&cli.config_path, cli.log_level)?;
            run_merge(&config, &source, target.as_deref(), output, format).await
        }
        Commands::Play {
            source,
            target,
            narrate,
            offset,
            nudge,
            speed,
            duration,
        } => {
            let config = load_config(&cli.config_path, cli.log_level)?;
            let options = PlayOptions {
                narrate,
                offset,
                nudge,
                speed,
                duration,
            };
            run_play(&config, &source, target.as_deref(), options).await
        }
    }
}

fn apply_cli_log_level(level: Option<&CliLogLevel>) {
    if let Some(level) = level {
        let config_level: app_config::LogLevel = level.clone().into();
        log::set_max_level(LevelFilter::from(&config_level));
    }
}

// Command line values win over the file
fn load_config(config_path: &str, log_level: Option<CliLogLevel>) -> Result<Config> {
    apply_cli_log_level(log_level.as_ref());

    let mut config = Config::load_or_create(config_path)?;
    if let Some(level) = log_level {
        config.log_level = level.into();
    }
    config.validate().context("Configuration validation failed")?;

    log::set_max_level(LevelFilter::from(&config.log_level));
    Ok(config)
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = FileManager::read_caption_file(path)?;
    Ok(decode_payload(&bytes))
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn remote_track(url: &str) -> CaptionTrack {
    CaptionTrack {
        language: String::new(),
        language_name: String::new(),
        url: url.to_string(),
        format: String::new(),
    }
}

/// Caption text of a local file pair, or of a fetched track pair when SOURCE is a URL
async fn read_captions(config: &Config, source: &str, target: Option<&str>) -> Result<(String, Option<String>)> {
    if !is_remote(source) {
        let source_text = read_text(Path::new(source))?;
        let target_text = target.map(|t| read_text(Path::new(t))).transpose()?;
        return Ok((source_text, target_text));
    }
    if let Some(target) = target.filter(|t| !is_remote(t)) {
        return Err(anyhow!("Target {} must be a URL when the source is a URL", target));
    }

    let loader = CaptionLoader::with_translation_locale(
        HttpFetcher::from_config(&config.fetch),
        config.fetch.translation_locale.clone(),
    );
    let selection = TrackSelection {
        source: Some(remote_track(source)),
        target: target.map(remote_track),
    };
    let payloads = loader.load_tracks(&selection).await;
    if payloads.source.is_empty() {
        return Err(anyhow!("Could not fetch captions from {}", source));
    }
    let target_text = (!payloads.target.is_empty()).then_some(payloads.target);
    Ok((payloads.source, target_text))
}

fn run_inspect(file: &Path, limit: usize) -> Result<()> {
    let text = read_text(file)?;
    let format = detect_format(&text);
    let entries = formats::parse_captions(&text, &formats::ParseSettings::default());

    println!("{}: {} format, {} entries", file.display(), format, entries.len());
    for entry in entries.iter().take(limit) {
        println!(
            "  [{}] {} --> {}  {}{}",
            entry.index.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string()),
            format_srt_timestamp(entry.start),
            format_srt_timestamp(entry.end),
            entry.source_text,
            if entry.target_text.is_empty() {
                String::new()
            } else {
                format!(" | {}", entry.target_text)
            }
        );
    }
    Ok(())
}

async fn run_merge(
    config: &Config,
    source: &str,
    target: Option<&str>,
    output: Option<PathBuf>,
    format: MergeFormat,
) -> Result<()> {
    let (source_text, target_text) = read_captions(config, source, target).await?;
    let sentences = pipeline::require_sentences(&config.load_settings(), &source_text, target_text.as_deref())
        .with_context(|| format!("No captions could be parsed from {}", source))?;

    let extension = match format {
        MergeFormat::Json => "json",
        MergeFormat::Srt => "srt",
    };
    let output = output.unwrap_or_else(|| {
        if is_remote(source) {
            let stem = youtube::extract_video_id(source).unwrap_or_else(|| "captions".to_string());
            PathBuf::from(format!("{}.bilingual.{}", stem, extension))
        } else {
            FileManager::generate_output_path(source, None, "bilingual", extension)
        }
    });
    match format {
        MergeFormat::Json => file_utils::write_sentences_json(&sentences, &output)?,
        MergeFormat::Srt => file_utils::write_bilingual_srt(&sentences, &output)?,
    }

    let translated = sentences.iter().filter(|s| !s.target_text.is_empty()).count();
    info!(
        "Wrote {} sentences ({} translated) to {}",
        sentences.len(),
        translated,
        output.display()
    );
    Ok(())
}

struct PlayOptions {
    narrate: bool,
    offset: f64,
    nudge: i32,
    speed: f64,
    duration: Option<f64>,
}

async fn run_play(config: &Config, source: &str, target: Option<&str>, options: PlayOptions) -> Result<()> {
    let (source_text, target_text) = read_captions(config, source, target).await?;

    let mut session_config = SessionConfig::from_config(config);
    session_config.narration_enabled |= options.narrate;
    let narrating = session_config.narration_enabled;

    // Parse once up front to size the simulated media
    let sentences = pipeline::require_sentences(&session_config.load, &source_text, target_text.as_deref())
        .with_context(|| format!("No captions could be parsed from {}", source))?;
    let media_length = options
        .duration
        .unwrap_or_else(|| sentences.iter().map(|s| s.end).fold(0.0, f64::max) + 1.0);

    let simulated = Arc::new(SimulatedTransport::new(media_length, options.speed));
    let transport: Arc<dyn Transport> = simulated.clone();
    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(TimedSpeech::with_rate(config.narration.speech_rate));

    let handle = PlaybackSession::spawn(transport.clone(), speech, session_config);
    let generation = handle.load_sentences(sentences.clone()).await?;
    handle.wait_until_loaded(generation).await?;
    if options.offset != 0.0 {
        handle.adjust_offset(options.offset).await?;
    }
    if options.nudge != 0 {
        handle.nudge_offset(options.nudge).await?;
    }

    let mut changes = handle.subscribe();
    let clock = session::spawn_clock(
        transport.clone(),
        handle.clone(),
        Duration::from_millis(config.sync.tick_interval_ms),
    );

    info!(
        "Playing {} sentences over {} at {}x{}",
        sentences.len(),
        format_clock(media_length),
        options.speed,
        if narrating { " with narration" } else { "" }
    );
    transport.play()?;

    let mut end_check = tokio::time::interval(Duration::from_millis(200));
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *changes.borrow_and_update();
                if let Some(sentence) = current.and_then(|i| sentences.get(i)) {
                    info!("[{}] {}", format_clock(transport.current_time()), sentence.source_text);
                    if !sentence.target_text.is_empty() {
                        info!("        {}", sentence.target_text);
                    }
                }
            }
            _ = end_check.tick() => {
                if simulated.is_finished() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                break;
            }
        }
    }

    handle.shutdown().await?;
    clock.abort();
    info!("Playback finished at {}", format_clock(transport.current_time()));
    Ok(())
}
