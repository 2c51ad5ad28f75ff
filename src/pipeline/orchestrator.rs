//! Batch orchestration
//!
//! Reads the spreadsheet, then runs every row on a fixed-size rayon pool.
//! Rows are independent: one row's failure or panic never stops its
//! siblings, and every row advances the progress bar.

use crate::audio::{ClipEncoder, FfmpegEncoder};
use crate::clip::{ClipOptions, Trimmer};
use crate::config::Settings;
use crate::download::{AudioFetcher, Downloader, RetryPolicy, YtDlpFetcher};
use crate::error::{ClipError, Result, RowOutcome};
use crate::pipeline::row::RowProcessor;
use crate::spreadsheet;
use crate::types::TrackRow;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Batch result summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub total_rows: usize,
    pub successful: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// External capabilities the batch runs against
pub struct Backends {
    pub fetcher: Arc<dyn AudioFetcher>,
    pub encoder: Arc<dyn ClipEncoder>,
}

impl Default for Backends {
    /// yt-dlp for downloads, ffmpeg (native for WAV) for export
    fn default() -> Self {
        Self {
            fetcher: Arc::new(YtDlpFetcher::new()),
            encoder: Arc::new(FfmpegEncoder::new()),
        }
    }
}

/// Run the configured spreadsheet with the default backends
pub fn run(settings: &Settings) -> Result<BatchResult> {
    run_with(settings, Backends::default())
}

/// Run the configured spreadsheet with explicit backends
pub fn run_with(settings: &Settings, backends: Backends) -> Result<BatchResult> {
    let started = Instant::now();

    let rows = spreadsheet::read_rows(
        &settings.csv_file,
        settings.delimiter_byte()?,
        &settings.csv_columns,
    )?;

    // Dry runs leave the filesystem untouched
    if !settings.dry_run {
        std::fs::create_dir_all(&settings.output_dir)
            .map_err(|e| ClipError::output_error(&settings.output_dir, e))?;
    }

    if rows.is_empty() {
        info!("Spreadsheet has no rows, nothing to do");
        return Ok(BatchResult::default());
    }

    let processor = build_processor(settings, backends);

    if settings.dry_run {
        return Ok(run_dry_run(&rows, &processor));
    }

    let result = process_rows(&rows, &processor, settings)?;

    info!(
        "Processed {} rows in {:.2}s: {} successful, {} skipped, {} failed",
        result.total_rows,
        started.elapsed().as_secs_f64(),
        result.successful,
        result.skipped,
        result.failed
    );

    Ok(result)
}

fn build_processor(settings: &Settings, backends: Backends) -> RowProcessor {
    let settings = Arc::new(settings.clone());
    let downloader = Downloader::new(
        backends.fetcher,
        RetryPolicy::from_settings(&settings),
        settings.format(),
    );
    let trimmer = Trimmer::new(ClipOptions::from_settings(&settings), backends.encoder);
    RowProcessor::new(settings, downloader, trimmer)
}

/// Dispatch rows on a local pool sized by `parallel_workers`
fn process_rows(
    rows: &[TrackRow],
    processor: &RowProcessor,
    settings: &Settings,
) -> Result<BatchResult> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.parallel_workers)
        .thread_name(|i| format!("clipcut-worker-{}", i))
        .build()
        .map_err(|e| ClipError::ConfigError(format!("Failed to build worker pool: {}", e)))?;
    debug!("Worker pool ready with {} threads", settings.parallel_workers);

    let progress_bar = settings.show_progress.then(|| {
        let pb = ProgressBar::new(rows.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Processing [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tracks {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb
    });

    let successful = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    pool.install(|| {
        rows.par_iter().for_each(|row| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| processor.process(row)))
                .unwrap_or_else(|payload| {
                    let msg = panic_message(payload.as_ref());
                    error!("Error during parallel processing: {}", msg);
                    RowOutcome::failed(format!(
                        "Unexpected error for {} {}: {}",
                        row.first_name, row.last_name, msg
                    ))
                });

            match &outcome {
                RowOutcome::Success { .. } => {
                    successful.fetch_add(1, Ordering::Relaxed);
                }
                RowOutcome::Skipped { .. } => {
                    skipped.fetch_add(1, Ordering::Relaxed);
                }
                RowOutcome::Failed { reason } => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    report_failure(progress_bar.as_ref(), reason);
                }
            }

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
        });
    });

    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    Ok(BatchResult {
        total_rows: rows.len(),
        successful: successful.load(Ordering::Relaxed),
        skipped: skipped.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
    })
}

/// Print a user-visible failure line without clobbering the progress bar
fn report_failure(progress_bar: Option<&ProgressBar>, reason: &str) {
    let line = format!("✗ {}", reason);
    match progress_bar {
        Some(pb) => pb.println(line),
        None => println!("{}", line),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Dry run mode - show what each row would do without downloading
fn run_dry_run(rows: &[TrackRow], processor: &RowProcessor) -> BatchResult {
    println!();
    println!("=== DRY RUN MODE ===");
    println!();

    let mut result = BatchResult {
        total_rows: rows.len(),
        ..Default::default()
    };
    let mut would_process = 0usize;

    for (i, row) in rows.iter().enumerate() {
        let line = i + 1;
        match processor.plan(row) {
            None => {
                println!("  row {:>3}: skip (incomplete)", line);
                result.skipped += 1;
            }
            Some(job) if processor.blocked_by_existing(&job) => {
                println!(
                    "  row {:>3}: skip (exists)  {}",
                    line,
                    display_name(&job.final_path)
                );
                result.skipped += 1;
            }
            Some(job) => {
                println!(
                    "  row {:>3}: {} @ {} -> {}",
                    line,
                    job.row.song,
                    job.row.start_time,
                    display_name(&job.final_path)
                );
                would_process += 1;
            }
        }
    }

    println!();
    println!("─────────────────────────────────────────");
    println!(
        "Would process {} of {} rows ({} skipped)",
        would_process, result.total_rows, result.skipped
    );
    println!();

    // Nothing was actually processed
    result.skipped = result.total_rows;
    result
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/o/Doe, John.mp3")), "Doe, John.mp3");
    }
}
