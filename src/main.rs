//! clipcut CLI entry point

use clap::Parser;
use clipcut::config::{Cli, Settings};
use clipcut::{logging, pipeline};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Missing or malformed config is fatal
    let mut settings = match Settings::load(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = settings.apply_cli(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let _log_guard = match logging::init(&settings.log_file, cli.console_filter()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = validate_inputs(&settings) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match pipeline::run(&settings) {
        Ok(result) => {
            println!();
            println!(
                "Summary: {} successful, {} skipped, {} failed (of {} rows)",
                result.successful, result.skipped, result.failed, result.total_rows
            );
            println!("Log written to {}", settings.log_file.display());

            if result.failed > 0 {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!("Fatal error: {}", e);
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate_inputs(settings: &Settings) -> Result<(), String> {
    if !settings.csv_file.exists() {
        return Err(format!(
            "Spreadsheet does not exist: {}\n\n  Tip: Set \"csv_file\" in the config or pass --csv.\n  Example:\n    clipcut --config config.json --csv people.csv",
            settings.csv_file.display()
        ));
    }
    Ok(())
}
