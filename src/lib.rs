//! clipcut - Spreadsheet-driven song clip cutter
//!
//! Turns a spreadsheet of (first name, last name, song, start time) rows
//! into trimmed, normalized audio clips named `"{Last}, {First}.{format}"`.
//! Each song is found and downloaded by search query, cut to a fixed
//! length from its start time, and exported in the configured format.
//!
//! # Architecture
//!
//! - `config`: JSON configuration file and CLI overrides
//! - `timestamp`: `MM:SS` start-time parsing
//! - `spreadsheet`: CSV reading through the configured column mapping
//! - `download`: search-and-download backend with bounded retries
//! - `audio`: decoding (symphonia), clip effects, resampling, encoding
//! - `clip`: the trim/normalize/export step for one clip
//! - `pipeline`: per-row processing and the parallel batch driver
//!
//! # Example
//!
//! ```no_run
//! use clipcut::{config::Settings, pipeline};
//! use std::path::Path;
//!
//! let settings = Settings::load(Path::new("config.json")).expect("Bad config");
//! let result = pipeline::run(&settings).expect("Batch failed");
//! println!("Cut {} clips", result.successful);
//! ```

pub mod audio;
pub mod clip;
pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod spreadsheet;
pub mod timestamp;
pub mod types;

// Re-export key types at crate root
pub use error::{ClipError, Result, RowOutcome};
pub use types::{AudioBuffer, Job, StereoBuffer, TrackRow};
