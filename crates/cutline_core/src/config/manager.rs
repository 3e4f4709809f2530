//! Reading and writing `cutline.toml`.
//!
//! Writes never leave a half-written file: content goes to `<name>.toml.tmp`
//! and is renamed over the real file. A single table can be replaced with
//! `toml_edit`, so comments and edits in the other tables stay as they are.
//! On load, unknown tables are dropped and missing keys filled in.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

/// Failure to read, parse or write the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot access settings file: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot edit settings file: {0}")]
    Edit(#[from] toml_edit::TomlError),

    #[error("Settings file not found: {0}")]
    NotFound(PathBuf),
}

/// Result alias for [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages the settings file.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Manager for the file at `config_path`, holding defaults until loaded.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only; persist with [`save`](Self::save) or
    /// [`update_section`](Self::update_section).
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read the file; [`ConfigError::NotFound`] when it is absent.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;
        Ok(())
    }

    /// Read the file, writing defaults first if there is none.
    ///
    /// A file with unknown tables or missing keys is rewritten in full.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let (settings, needs_rewrite) = parse_and_check(&content)?;
            self.settings = settings;

            if needs_rewrite {
                tracing::debug!("Rewriting {} with defaults", self.config_path.display());
                self.save()?;
            }
        } else {
            self.settings = Settings::default();
            self.save()?;
        }
        Ok(())
    }

    /// Create the output and logs folders if missing.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        for dir in [&self.settings.paths.output_folder, &self.settings.paths.logs_folder] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    pub fn output_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.output_folder)
    }

    /// Write every table, replacing the file.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.render_document()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Replace one table on disk with the in-memory values.
    ///
    /// The file is re-read first, so edits made to other tables on disk are
    /// kept.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current_content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = if current_content.is_empty() {
            DocumentMut::new()
        } else {
            current_content.parse()?
        };

        let section_doc: DocumentMut = self.section_toml(section)?.parse()?;
        doc[section.table_name()] = Item::Table(section_doc.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        Ok(match section {
            ConfigSection::Paths => toml::to_string_pretty(&s.paths)?,
            ConfigSection::Tools => toml::to_string_pretty(&s.tools)?,
            ConfigSection::Execution => toml::to_string_pretty(&s.execution)?,
            ConfigSection::Encoding => toml::to_string_pretty(&s.encoding)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
        })
    }

    fn render_document(&self) -> ConfigResult<String> {
        let mut output = String::new();
        output.push_str("# Cutline configuration\n");
        output.push_str(
            "# This file is auto-generated. Comments may be preserved on section updates.\n",
        );

        for section in ConfigSection::ALL {
            output.push('\n');
            output.push_str(&format!("# {}\n", section.description()));
            output.push_str(&format!("[{}]\n", section.table_name()));
            for line in self.section_toml(section)?.lines() {
                output.push_str(line);
                output.push('\n');
            }
        }

        Ok(output)
    }

    /// Write to a temp file in the same directory, then rename over the
    /// config file.
    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.config_path)?;
        Ok(())
    }
}

/// Parse settings and decide whether the file should be rewritten.
fn parse_and_check(content: &str) -> ConfigResult<(Settings, bool)> {
    let doc: DocumentMut = content.parse()?;
    let settings: Settings = toml::from_str(content)?;

    let known: Vec<&str> = ConfigSection::ALL.iter().map(|s| s.table_name()).collect();
    let has_unknown = doc.iter().any(|(key, _)| !known.contains(&key));

    // Compare values, not text, so user comments alone never trigger a rewrite
    let reparsed: toml::Table = toml::from_str(content)?;
    let complete: toml::Table = toml::from_str(&toml::to_string(&settings)?)?;
    Ok((settings, has_unknown || reparsed != complete))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn first_run_writes_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("cutline.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[paths]"));
        assert!(content.contains("[tools]"));
        assert!(content.contains("[encoding]"));

        // The generated file parses back to the defaults
        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings(), &Settings::default());
    }

    #[test]
    fn existing_values_survive_fill_in() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutline.toml");
        fs::write(&config_path, "[tools]\nffmpeg = \"/usr/local/bin/ffmpeg\"\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().tools.ffmpeg, "/usr/local/bin/ffmpeg");
        // Missing sections were filled in on disk
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[execution]"));
        assert!(content.contains("/usr/local/bin/ffmpeg"));
    }

    #[test]
    fn complete_file_is_not_rewritten() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutline.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();
        let mut content = fs::read_to_string(&config_path).unwrap();
        content.push_str("# my note\n");
        fs::write(&config_path, &content).unwrap();

        manager.load_or_create().unwrap();
        assert!(fs::read_to_string(&config_path).unwrap().contains("# my note"));
    }

    #[test]
    fn unknown_sections_are_dropped() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutline.toml");
        fs::write(&config_path, "[bogus]\nx = 1\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();
        assert!(!fs::read_to_string(&config_path).unwrap().contains("bogus"));
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("absent.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn section_update_keeps_other_tables() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutline.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        // Someone edits another section on disk meanwhile
        let content = fs::read_to_string(&config_path)
            .unwrap()
            .replace("ffprobe = \"ffprobe\"", "ffprobe = \"/opt/ffprobe\"");
        fs::write(&config_path, content).unwrap();

        manager.settings_mut().execution.timeout_secs = 120;
        manager.update_section(ConfigSection::Execution).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("timeout_secs = 120"));
        assert!(content.contains("/opt/ffprobe"));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutline.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(!dir.path().join("cutline.toml.tmp").exists());
    }

    #[test]
    fn ensure_dirs_creates_folders() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("cutline.toml"));
        manager.settings_mut().paths.output_folder = dir.path().join("out").display().to_string();
        manager.settings_mut().paths.logs_folder = dir.path().join("logs").display().to_string();
        manager.ensure_dirs_exist().unwrap();
        assert!(manager.output_folder().is_dir());
        assert!(manager.logs_folder().is_dir());
    }
}
