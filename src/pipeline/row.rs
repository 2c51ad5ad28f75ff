//! Single-row processing
//!
//! One row runs end to end: validate, derive paths, skip if the clip
//! exists, download, trim, remove the download. Each step short-circuits
//! the next on failure, and nothing here panics or returns an error.

use crate::clip::Trimmer;
use crate::config::Settings;
use crate::download::Downloader;
use crate::error::RowOutcome;
use crate::types::{Job, TrackRow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Per-output-path locks
///
/// Rows that resolve to the same clip path run one after another instead
/// of interleaving their download and export.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for `path`; hold its guard for the row's lifetime
    pub fn for_path(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        map.entry(path.to_path_buf()).or_default().clone()
    }
}

/// Orchestrates one row at a time; shared by all workers
pub struct RowProcessor {
    settings: Arc<Settings>,
    downloader: Downloader,
    trimmer: Trimmer,
    locks: PathLocks,
}

impl RowProcessor {
    pub fn new(settings: Arc<Settings>, downloader: Downloader, trimmer: Trimmer) -> Self {
        Self {
            settings,
            downloader,
            trimmer,
            locks: PathLocks::new(),
        }
    }

    /// Derive the job for a row, or `None` if a field is missing
    pub fn plan(&self, row: &TrackRow) -> Option<Job> {
        row.is_complete()
            .then(|| Job::new(row.clone(), &self.settings.output_dir, &self.settings.format()))
    }

    /// Whether an existing clip blocks this job
    pub fn blocked_by_existing(&self, job: &Job) -> bool {
        job.final_path.exists() && !self.settings.overwrite_existing_files
    }

    /// Process a row; every failure is logged and folded into the outcome
    pub fn process(&self, row: &TrackRow) -> RowOutcome {
        let Some(job) = self.plan(row) else {
            info!("Skipping incomplete row: {:?}", row);
            return RowOutcome::skipped("incomplete row");
        };

        let lock = self.locks.for_path(&job.final_path);
        let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

        if self.blocked_by_existing(&job) {
            info!(
                "File already exists and overwrite is off: {}",
                job.final_path.display()
            );
            return RowOutcome::skipped("already exists");
        }

        info!(
            "Starting processing: {} {}, Song: {}, Start time: {}",
            job.row.first_name, job.row.last_name, job.row.song, job.row.start_time
        );

        if !self.downloader.download(&job.row.song, &job.temp_template) {
            error!("Download failed for {}", job.row.song);
            return RowOutcome::failed(format!("Download failed for {}", job.row.song));
        }

        let downloaded = job.downloaded_path();
        debug!("Downloaded to {}", downloaded.display());

        let trimmed = self.trimmer.trim(
            &downloaded,
            &job.final_path,
            &job.row.start_time,
            self.settings.default_clip_duration_seconds,
            self.settings.normalize_audio,
        );

        if !trimmed {
            error!("Trimming failed for {}", job.final_path.display());
            remove_download(&downloaded);
            return RowOutcome::failed(format!(
                "Trimming failed for {}",
                job.final_path.display()
            ));
        }

        remove_download(&downloaded);

        info!("Successfully saved: {}", job.final_path.display());
        RowOutcome::Success {
            output: job.final_path,
        }
    }
}

/// Best-effort removal of the full-length download
fn remove_download(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Could not remove temporary file {}: {}", path.display(), e);
    }
}
