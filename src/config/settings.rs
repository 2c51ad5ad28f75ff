//! Runtime configuration settings
//!
//! Loaded once from a JSON document at startup, then shared read-only by
//! every worker. Every optional key has a default.

use crate::error::{ClipError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Spreadsheet header names for the four logical row fields
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CsvColumns {
    #[serde(default = "default_name_column")]
    pub name: String,
    #[serde(default = "default_surname_column")]
    pub surname: String,
    #[serde(default = "default_song_column")]
    pub song: String,
    #[serde(default = "default_start_time_column")]
    pub start_time: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            name: default_name_column(),
            surname: default_surname_column(),
            song: default_song_column(),
            start_time: default_start_time_column(),
        }
    }
}

/// Runtime settings for the clip pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Plain-text log, truncated at process start
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Directory receiving `{Last}, {First}.{format}` clips
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Output container/codec, also the format requested from the downloader
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    /// Encoder bitrate (e.g. "192k"), honoured for mp3 only
    #[serde(default)]
    pub audio_bitrate: Option<String>,
    /// Forced output sample rate in Hz
    #[serde(default)]
    pub sample_rate: Option<u32>,
    /// Loudness target when normalizing
    #[serde(rename = "target_dBFS", default = "default_target_dbfs")]
    pub target_dbfs: f64,
    #[serde(default)]
    pub fade_in: bool,
    #[serde(default)]
    pub fade_in_duration_ms: u64,
    #[serde(default)]
    pub fade_out: bool,
    #[serde(default)]
    pub fade_out_duration_ms: u64,
    #[serde(default)]
    pub csv_columns: CsvColumns,
    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: String,
    #[serde(default = "default_csv_file")]
    pub csv_file: PathBuf,
    #[serde(default)]
    pub overwrite_existing_files: bool,
    /// Total download attempts per row
    #[serde(default = "default_max_download_retries")]
    pub max_download_retries: u32,
    /// Pause between download attempts; fractions allowed
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: f64,
    #[serde(default = "default_clip_duration_seconds")]
    pub default_clip_duration_seconds: u64,
    #[serde(default = "default_true")]
    pub normalize_audio: bool,
    #[serde(default = "default_parallel_workers")]
    pub parallel_workers: usize,

    // Runtime-only flags, set from the CLI
    #[serde(skip)]
    pub show_progress: bool,
    #[serde(skip)]
    pub dry_run: bool,
}

impl Settings {
    /// Load settings from a JSON file
    ///
    /// A missing or malformed file is fatal: the batch cannot run without it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClipError::ConfigError(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let settings = Self::from_json(&content).map_err(|e| match e {
            ClipError::ConfigError(reason) => {
                ClipError::ConfigError(format!("'{}': {}", path.display(), reason))
            }
            other => other,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    /// Parse, expand and validate settings from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let mut settings: Settings = serde_json::from_str(content)
            .map_err(|e| ClipError::ConfigError(format!("malformed JSON: {}", e)))?;
        settings.show_progress = true;
        settings.output_dir = expand_home(&settings.output_dir);
        settings.log_file = expand_home(&settings.log_file);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply command-line overrides on top of the loaded file
    pub fn apply_cli(&mut self, cli: &super::cli::Cli) -> Result<()> {
        if let Some(csv) = &cli.csv {
            self.csv_file = csv.clone();
        }
        if let Some(workers) = cli.workers {
            self.parallel_workers = workers;
        }
        if cli.overwrite {
            self.overwrite_existing_files = true;
        }
        self.show_progress = !cli.quiet;
        self.dry_run = cli.dry_run;
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.parallel_workers == 0 {
            return Err(ClipError::ConfigError(
                "parallel_workers must be at least 1".to_string(),
            ));
        }
        if self.max_download_retries == 0 {
            return Err(ClipError::ConfigError(
                "max_download_retries must be at least 1".to_string(),
            ));
        }
        if !self.retry_delay_seconds.is_finite() || self.retry_delay_seconds < 0.0 {
            return Err(ClipError::ConfigError(format!(
                "retry_delay_seconds must be a non-negative number, got {}",
                self.retry_delay_seconds
            )));
        }
        if self.audio_format.trim().is_empty() {
            return Err(ClipError::ConfigError(
                "audio_format must not be empty".to_string(),
            ));
        }
        self.delimiter_byte()?;
        Ok(())
    }

    /// The CSV delimiter as the single byte the reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.csv_delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(ClipError::ConfigError(format!(
                "csv_delimiter must be a single ASCII character, got '{}'",
                self.csv_delimiter
            ))),
        }
    }

    /// Normalized output format (lowercase, no leading dot)
    pub fn format(&self) -> String {
        self.audio_format.trim().trim_start_matches('.').to_lowercase()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_seconds)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            output_dir: default_output_dir(),
            audio_format: default_audio_format(),
            audio_bitrate: None,
            sample_rate: None,
            target_dbfs: default_target_dbfs(),
            fade_in: false,
            fade_in_duration_ms: 0,
            fade_out: false,
            fade_out_duration_ms: 0,
            csv_columns: CsvColumns::default(),
            csv_delimiter: default_csv_delimiter(),
            csv_file: default_csv_file(),
            overwrite_existing_files: false,
            max_download_retries: default_max_download_retries(),
            retry_delay_seconds: default_retry_delay_seconds(),
            default_clip_duration_seconds: default_clip_duration_seconds(),
            normalize_audio: true,
            parallel_workers: default_parallel_workers(),
            show_progress: true,
            dry_run: false,
        }
    }
}

/// Expand a leading `~` to the user's home directory
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("process.log")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_target_dbfs() -> f64 {
    -20.0
}

fn default_csv_delimiter() -> String {
    ";".to_string()
}

fn default_csv_file() -> PathBuf {
    PathBuf::from("testdata.csv")
}

fn default_max_download_retries() -> u32 {
    3
}

fn default_retry_delay_seconds() -> f64 {
    5.0
}

fn default_clip_duration_seconds() -> u64 {
    30
}

fn default_parallel_workers() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_name_column() -> String {
    "name".to_string()
}

fn default_surname_column() -> String {
    "surname".to_string()
}

fn default_song_column() -> String {
    "song".to_string()
}

fn default_start_time_column() -> String {
    "start_time".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings.audio_format, "mp3");
        assert_eq!(settings.parallel_workers, 4);
        assert_eq!(settings.default_clip_duration_seconds, 30);
        assert!(settings.normalize_audio);
        assert_eq!(settings.max_download_retries, 3);
        assert_eq!(settings.retry_delay_seconds, 5.0);
        assert!(!settings.overwrite_existing_files);
        assert_eq!(settings.target_dbfs, -20.0);
        assert_eq!(settings.csv_delimiter, ";");
        assert_eq!(settings.csv_columns, CsvColumns::default());
        assert_eq!(settings.log_file, PathBuf::from("process.log"));
    }

    #[test]
    fn test_full_document() {
        let json = r#"{
            "log_file": "run.log",
            "output_dir": "./clips",
            "audio_format": "WAV",
            "audio_bitrate": "192k",
            "sample_rate": 44100,
            "target_dBFS": -14.5,
            "fade_in": true,
            "fade_in_duration_ms": 500,
            "fade_out": true,
            "fade_out_duration_ms": 1500,
            "csv_columns": {
                "name": "Vorname",
                "surname": "Nachname",
                "song": "Lied",
                "start_time": "Start"
            },
            "csv_delimiter": ",",
            "csv_file": "people.csv",
            "overwrite_existing_files": true,
            "max_download_retries": 5,
            "retry_delay_seconds": 1,
            "default_clip_duration_seconds": 20,
            "normalize_audio": false,
            "parallel_workers": 2,
            "some_unknown_key": 42
        }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.format(), "wav");
        assert_eq!(settings.audio_bitrate.as_deref(), Some("192k"));
        assert_eq!(settings.sample_rate, Some(44100));
        assert_eq!(settings.target_dbfs, -14.5);
        assert!(settings.fade_in && settings.fade_out);
        assert_eq!(settings.fade_out_duration_ms, 1500);
        assert_eq!(settings.csv_columns.surname, "Nachname");
        assert_eq!(settings.delimiter_byte().unwrap(), b',');
        assert_eq!(settings.csv_file, PathBuf::from("people.csv"));
        assert!(settings.overwrite_existing_files);
        assert_eq!(settings.retry_delay(), Duration::from_secs(1));
        assert!(!settings.normalize_audio);
        assert_eq!(settings.parallel_workers, 2);
    }

    #[test]
    fn test_fractional_retry_delay() {
        let settings = Settings::from_json(r#"{"retry_delay_seconds": 0.5}"#).unwrap();
        assert_eq!(settings.retry_delay(), Duration::from_millis(500));

        let err = Settings::from_json(r#"{"retry_delay_seconds": -1}"#).unwrap_err();
        assert!(matches!(err, ClipError::ConfigError(_)));
    }

    #[test]
    fn test_partial_column_mapping_keeps_other_defaults() {
        let settings = Settings::from_json(r#"{"csv_columns": {"song": "Track"}}"#).unwrap();
        assert_eq!(settings.csv_columns.song, "Track");
        assert_eq!(settings.csv_columns.name, "name");
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ClipError::ConfigError(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Settings::load(Path::new("/definitely/not/here/config.json")).unwrap_err();
        assert!(matches!(err, ClipError::ConfigError(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Settings::from_json(r#"{"parallel_workers": 0}"#).is_err());
        assert!(Settings::from_json(r#"{"max_download_retries": 0}"#).is_err());
        assert!(Settings::from_json(r#"{"csv_delimiter": ";;"}"#).is_err());
        assert!(Settings::from_json(r#"{"audio_format": " "}"#).is_err());
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home(Path::new("./output")), PathBuf::from("./output"));
        let expanded = expand_home(Path::new("~/clips"));
        assert!(expanded.ends_with("clips"));
    }
}
