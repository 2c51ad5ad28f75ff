//! Trim, normalize and export a single clip
//!
//! Steps run in a fixed order: parse start, decode, slice, force stereo,
//! normalize, fade in, fade out, resample, export. Export goes to a
//! `.part` file that is renamed over the destination only on success, so a
//! failed export never replaces an existing clip.

use crate::audio::effects;
use crate::audio::encoder::sibling_with_suffix;
use crate::audio::resample::resample_stereo;
use crate::audio::{self, ClipEncoder, ExportSpec};
use crate::config::Settings;
use crate::error::{ClipError, Result};
use crate::timestamp;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Post-slice processing options taken from configuration
#[derive(Debug, Clone)]
pub struct ClipOptions {
    pub target_dbfs: f64,
    /// Fade-in length; `None` when disabled or zero
    pub fade_in_ms: Option<u64>,
    pub fade_out_ms: Option<u64>,
    pub sample_rate: Option<u32>,
    pub export: ExportSpec,
}

impl ClipOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let enabled = |on: bool, ms: u64| (on && ms > 0).then_some(ms);
        Self {
            target_dbfs: settings.target_dbfs,
            fade_in_ms: enabled(settings.fade_in, settings.fade_in_duration_ms),
            fade_out_ms: enabled(settings.fade_out, settings.fade_out_duration_ms),
            sample_rate: settings.sample_rate,
            export: ExportSpec {
                format: settings.format(),
                bitrate: settings.audio_bitrate.clone(),
            },
        }
    }
}

/// What a successful trim produced
#[derive(Debug, Clone, PartialEq)]
pub struct ClipReport {
    pub duration_ms: u64,
    /// Gain applied by normalization, if any
    pub gain_db: Option<f64>,
}

/// Cuts clips out of downloaded tracks
pub struct Trimmer {
    options: ClipOptions,
    encoder: Arc<dyn ClipEncoder>,
}

impl Trimmer {
    pub fn new(options: ClipOptions, encoder: Arc<dyn ClipEncoder>) -> Self {
        Self { options, encoder }
    }

    /// Trim `input` into `output`, reporting failure as `false`
    ///
    /// Every error is logged here; nothing propagates to the caller.
    pub fn trim(
        &self,
        input: &Path,
        output: &Path,
        start_time: &str,
        duration_sec: u64,
        normalize: bool,
    ) -> bool {
        let Some(start_ms) = timestamp::timestamp_to_ms(start_time) else {
            return false;
        };
        match self.try_trim(input, output, start_ms, duration_sec, normalize) {
            Ok(report) => {
                debug!(
                    "Trimmed {} -> {} ({} ms)",
                    input.display(),
                    output.display(),
                    report.duration_ms
                );
                true
            }
            Err(e) if e.is_recoverable() => {
                error!("Error while trimming: {}", e);
                false
            }
            // Not specific to this track; later rows will likely hit it too
            Err(e) => {
                error!(
                    "Unrecoverable error while trimming {}: {}",
                    input.display(),
                    e
                );
                false
            }
        }
    }

    /// Trim with a parsed start offset, returning the error on failure
    pub fn try_trim(
        &self,
        input: &Path,
        output: &Path,
        start_ms: u64,
        duration_sec: u64,
        normalize: bool,
    ) -> Result<ClipReport> {
        let source = audio::decode(input)?;

        let sliced = effects::slice_ms(&source, start_ms, duration_sec.saturating_mul(1000));
        drop(source);
        if sliced.is_empty() {
            warn!(
                "Start {} ms is at or past the end of {}; clip is empty",
                start_ms,
                input.display()
            );
        }

        let mut clip = effects::to_stereo(&sliced);

        let gain_db = if normalize {
            let gain = effects::match_target_dbfs(&mut clip, self.options.target_dbfs);
            if gain.is_none() {
                warn!("Clip from {} is silent, skipping normalization", input.display());
            }
            gain
        } else {
            None
        };

        if let Some(ms) = self.options.fade_in_ms {
            effects::fade_in(&mut clip, ms);
        }
        if let Some(ms) = self.options.fade_out_ms {
            effects::fade_out(&mut clip, ms);
        }

        if let Some(rate) = self.options.sample_rate {
            clip = resample_stereo(clip, rate);
        }

        let duration_ms = clip.duration_ms();
        self.export_atomically(&clip, output)?;

        Ok(ClipReport {
            duration_ms,
            gain_db,
        })
    }

    fn export_atomically(&self, clip: &crate::types::StereoBuffer, output: &Path) -> Result<()> {
        let part = sibling_with_suffix(output, ".part");

        if let Err(e) = self.encoder.encode(clip, &part, &self.options.export) {
            let _ = std::fs::remove_file(&part);
            return Err(e);
        }

        std::fs::rename(&part, output).map_err(|e| {
            let _ = std::fs::remove_file(&part);
            ClipError::export_error(output, format!("Failed to finalize file: {}", e))
        })?;

        debug!(
            "Exported {} via {} encoder",
            output.display(),
            self.encoder.name()
        );
        Ok(())
    }
}
