//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

use super::settings::DEFAULT_CONFIG_FILE;

/// clipcut - Cut per-person song clips from a spreadsheet
///
/// Reads rows of (first name, last name, song, start time), downloads each
/// song by search query, and exports a trimmed, normalized clip named
/// "{Last}, {First}.{format}" into the configured output directory.
#[derive(Parser, Debug)]
#[command(name = "clipcut")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Spreadsheet to process (overrides `csv_file` from the config)
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Number of parallel workers (overrides `parallel_workers`)
    #[arg(short = 'j', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Re-create clips that already exist
    #[arg(long, default_value = "false")]
    pub overwrite: bool,

    /// Verbose console output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bar, errors only)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Dry run - show what each row would produce without downloading
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

impl Cli {
    /// Console log filter based on verbosity flags
    pub fn console_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["clipcut"]);
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(cli.csv.is_none());
        assert_eq!(cli.console_filter(), "warn");
    }

    #[test]
    fn test_overrides_and_verbosity() {
        let cli = Cli::parse_from(["clipcut", "--csv", "a.csv", "-j", "8", "--overwrite", "-vv"]);
        assert_eq!(cli.csv, Some(PathBuf::from("a.csv")));
        assert_eq!(cli.workers, Some(8));
        assert!(cli.overwrite);
        assert_eq!(cli.console_filter(), "debug");

        let quiet = Cli::parse_from(["clipcut", "-q", "-vvv"]);
        assert_eq!(quiet.console_filter(), "error");
    }
}
