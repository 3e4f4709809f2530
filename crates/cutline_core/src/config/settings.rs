//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Output and log locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// External tool executables.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Process execution behavior.
    #[serde(default)]
    pub execution: ExecutionSettings,

    /// Output codec choices.
    #[serde(default)]
    pub encoding: EncodingSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for output and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Default folder for rendered files.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for per-operation log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "cutline_output".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Executables to launch. Bare names are resolved through PATH.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Process execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Kill ffmpeg after this many seconds. 0 disables the limit.
    #[serde(default)]
    pub timeout_secs: u64,

    /// Overwrite existing output files (`-y`); otherwise `-n`.
    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// Pass `-hide_banner`.
    #[serde(default = "default_true")]
    pub hide_banner: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            overwrite: true,
            hide_banner: true,
        }
    }
}

impl ExecutionSettings {
    /// Timeout as a duration, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Codec settings for rendered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSettings {
    /// Video encoder when the video plane is re-encoded.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Audio encoder.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate (`192k`).
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Move the moov atom to the front (`-movflags +faststart`).
    #[serde(default = "default_true")]
    pub faststart: bool,
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            faststart: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level for the global tracing subscriber.
    #[serde(default)]
    pub level: LogLevel,

    /// Keep ffmpeg output out of the log file; only show its tail on error.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of error lines to show in tail.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Log the command one option per line.
    #[serde(default)]
    pub show_command_pretty: bool,

    /// Log the argument vector as JSON.
    #[serde(default)]
    pub show_command_json: bool,

    /// Write a log file per operation into `paths.logs_folder`.
    #[serde(default = "default_true")]
    pub write_files: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            show_command_pretty: false,
            show_command_json: false,
            write_files: true,
        }
    }
}

/// Config sections for atomic updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Tools,
    Execution,
    Encoding,
    Logging,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Tools,
        ConfigSection::Execution,
        ConfigSection::Encoding,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Tools => "tools",
            ConfigSection::Execution => "execution",
            ConfigSection::Encoding => "encoding",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section in generated files.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and log directories",
            ConfigSection::Tools => "External tool executables",
            ConfigSection::Execution => "Process execution (timeout_secs = 0 disables the limit)",
            ConfigSection::Encoding => "Output codecs",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
