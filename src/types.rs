//! Core data types for clipcut
//!
//! These types represent the domain model and flow through the pipeline.

use std::path::PathBuf;

// =============================================================================
// Spreadsheet rows and jobs
// =============================================================================

/// One spreadsheet record, resolved through the configured column mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRow {
    pub first_name: String,
    pub last_name: String,
    pub song: String,
    pub start_time: String,
}

impl TrackRow {
    /// Build a row with every field whitespace-trimmed
    pub fn new(
        first_name: impl AsRef<str>,
        last_name: impl AsRef<str>,
        song: impl AsRef<str>,
        start_time: impl AsRef<str>,
    ) -> Self {
        Self {
            first_name: first_name.as_ref().trim().to_string(),
            last_name: last_name.as_ref().trim().to_string(),
            song: song.as_ref().trim().to_string(),
            start_time: start_time.as_ref().trim().to_string(),
        }
    }

    /// All four fields are present
    pub fn is_complete(&self) -> bool {
        !self.first_name.is_empty()
            && !self.last_name.is_empty()
            && !self.song.is_empty()
            && !self.start_time.is_empty()
    }

    /// `"{last}, {first}"`, the clip's file stem
    pub fn file_stem(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Placeholder the downloader replaces with the real file extension
pub const EXT_PLACEHOLDER: &str = "%(ext)s";

/// Work item derived from a complete row
#[derive(Debug, Clone)]
pub struct Job {
    pub row: TrackRow,
    /// Where the finished clip lands
    pub final_path: PathBuf,
    /// Download destination, still containing [`EXT_PLACEHOLDER`]
    pub temp_template: PathBuf,
    /// Output format (also the downloaded audio format)
    pub format: String,
}

impl Job {
    /// Derive paths for a row under `output_dir`
    pub fn new(row: TrackRow, output_dir: &std::path::Path, format: &str) -> Self {
        let stem = row.file_stem();
        let final_path = output_dir.join(format!("{}.{}", stem, format));
        let temp_template = output_dir.join(format!("{}_full.{}", stem, EXT_PLACEHOLDER));
        Self {
            row,
            final_path,
            temp_template,
            format: format.to_string(),
        }
    }

    /// The downloaded file once the placeholder is resolved
    pub fn downloaded_path(&self) -> PathBuf {
        resolve_template(&self.temp_template, &self.format)
    }
}

/// Substitute `format` for the extension placeholder in a download template
pub fn resolve_template(template: &std::path::Path, format: &str) -> PathBuf {
    PathBuf::from(
        template
            .to_string_lossy()
            .replace(EXT_PLACEHOLDER, format),
    )
}

// =============================================================================
// Audio buffer types
// =============================================================================

/// Decoded audio, interleaved, at the source's native rate and layout
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Interleaved samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Channel count of the interleaved data
    pub channels: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            (samples.len() / channels) as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            channels,
            sample_rate,
            duration,
        }
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Duration in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() as u64 * 1000) / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Two-channel audio, the shape every exported clip takes
#[derive(Debug, Clone)]
pub struct StereoBuffer {
    /// Left channel samples normalized to [-1.0, 1.0]
    pub left: Vec<f32>,
    /// Right channel samples normalized to [-1.0, 1.0]
    pub right: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl StereoBuffer {
    pub fn new(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Self {
        let num_samples = left.len().min(right.len());
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            num_samples as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            left,
            right,
            sample_rate,
            duration,
        }
    }

    /// Number of samples per channel
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Duration in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.len() as u64 * 1000) / self.sample_rate as u64
    }


    /// Create from interleaved samples
    pub fn from_interleaved(samples: &[f32], sample_rate: u32) -> Self {
        let num_frames = samples.len() / 2;
        let mut left = Vec::with_capacity(num_frames);
        let mut right = Vec::with_capacity(num_frames);

        for chunk in samples.chunks(2) {
            if chunk.len() == 2 {
                left.push(chunk[0]);
                right.push(chunk[1]);
            }
        }

        Self::new(left, right, sample_rate)
    }

    /// Mutable access to both channels at once
    pub fn channels_mut(&mut self) -> [&mut Vec<f32>; 2] {
        [&mut self.left, &mut self.right]
    }
}
