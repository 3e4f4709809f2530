//! Configuration management for Cutline.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use cutline_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/cutline.toml");
//! config.load_or_create().unwrap();
//!
//! println!("ffmpeg: {}", config.settings().tools.ffmpeg);
//!
//! config.settings_mut().execution.timeout_secs = 600;
//! config.update_section(ConfigSection::Execution).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EncodingSettings, ExecutionSettings, LoggingSettings, PathSettings, Settings,
    ToolSettings,
};
