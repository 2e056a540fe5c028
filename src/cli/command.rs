use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use log::Level;
use mpa::process::Options;

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (mpa ", env!("MPA_VERSION"), ", built ", env!("BUILD_TIMESTAMP"), ")"
    ),
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for inspecting MPEG audio files: frames, VBR headers and tags",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Parser options for the global flags.
    pub fn options(&self) -> Options {
        Options {
            fail_level: if self.strict { Level::Warn } else { Level::Error },
            ..Default::default()
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print tags, first frame, VBR header and duration.
    Info(InfoArgs),

    /// Walk every frame and report resyncs and CRC errors.
    Frames(FramesArgs),

    /// Print the byte offset for a playback position.
    Seek(SeekArgs),

    /// Print the last frame and the one before it.
    Last(LastArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input MPEG audio file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Plain)]
    pub format: ReportFormat,
}

#[derive(Debug, Args)]
pub struct FramesArgs {
    /// Input MPEG audio file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Verify the CRC of protected frames.
    #[arg(long)]
    pub crc: bool,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    pub limit: Option<u64>,

    /// Print every frame.
    #[arg(long)]
    pub verbose_frames: bool,
}

#[derive(Debug, Args)]
pub struct SeekArgs {
    /// Input MPEG audio file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Playback position in percent (0-100).
    #[arg(value_name = "PERCENT")]
    pub percent: f32,
}

#[derive(Debug, Args)]
pub struct LastArgs {
    /// Input MPEG audio file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ReportFormat {
    /// Aligned text.
    Plain,
    /// YAML document.
    Yaml,
}
