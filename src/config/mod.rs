//! Configuration file and CLI handling

pub mod cli;
pub mod settings;

pub use cli::Cli;
pub use settings::{CsvColumns, Settings, DEFAULT_CONFIG_FILE};
