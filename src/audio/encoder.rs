//! Clip encoding backends
//!
//! WAV is written natively with hound. Every other format is produced by
//! handing an intermediate WAV to ffmpeg.

use crate::error::{ClipError, Result};
use crate::types::StereoBuffer;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Export parameters taken from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpec {
    /// Lowercase format name, e.g. "mp3"
    pub format: String,
    /// Encoder bitrate, passed through for mp3 only
    pub bitrate: Option<String>,
}

impl ExportSpec {
    /// Bitrate to hand the encoder, if the format honours one
    pub fn effective_bitrate(&self) -> Option<&str> {
        match self.format.as_str() {
            "mp3" => self
                .bitrate
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty()),
            _ => None,
        }
    }
}

/// Encoder backend
pub trait ClipEncoder: Send + Sync {
    /// Write `clip` to `dest` in the requested format
    ///
    /// `dest` is a scratch path; the caller renames it into place.
    fn encode(&self, clip: &StereoBuffer, dest: &Path, spec: &ExportSpec) -> Result<()>;

    /// Get the name of this encoder (for logging)
    fn name(&self) -> &'static str;
}

/// 16-bit PCM WAV writer
///
/// Writes WAV data regardless of the requested format.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavEncoder;

impl ClipEncoder for WavEncoder {
    fn encode(&self, clip: &StereoBuffer, dest: &Path, _spec: &ExportSpec) -> Result<()> {
        write_stereo_wav(dest, clip)
    }

    fn name(&self) -> &'static str {
        "wav"
    }
}

/// ffmpeg subprocess encoder
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }

    /// Use a specific ffmpeg binary
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_command(&self, input: &Path, dest: &Path, spec: &ExportSpec) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-y")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input)
            .arg("-vn");

        if let Some(bitrate) = spec.effective_bitrate() {
            cmd.arg("-b:a").arg(bitrate);
        }

        // The scratch destination has no meaningful extension, so name the muxer
        cmd.arg("-f").arg(muxer_for(&spec.format)).arg(dest);
        cmd.stdout(Stdio::null()).stderr(Stdio::piped());
        cmd
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipEncoder for FfmpegEncoder {
    fn encode(&self, clip: &StereoBuffer, dest: &Path, spec: &ExportSpec) -> Result<()> {
        if spec.format == "wav" {
            return write_stereo_wav(dest, clip);
        }

        let intermediate = sibling_with_suffix(dest, ".src.wav");
        write_stereo_wav(&intermediate, clip)?;

        let mut cmd = self.build_command(&intermediate, dest, spec);
        debug!("Running ffmpeg: {:?}", cmd);

        let output = cmd.output();
        let _ = std::fs::remove_file(&intermediate);

        let output = output
            .map_err(|e| ClipError::export_error(dest, format!("Failed to spawn ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ClipError::export_error(
                dest,
                format!(
                    "ffmpeg exited with code {:?}: {}",
                    output.status.code(),
                    if stderr.is_empty() { "unknown error" } else { &stderr }
                ),
            ));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

/// ffmpeg muxer name for a file format
fn muxer_for(format: &str) -> &str {
    match format {
        "m4a" | "mp4" => "ipod",
        "aac" => "adts",
        "opus" => "opus",
        "ogg" | "oga" => "ogg",
        other => other,
    }
}

/// `dest` with `suffix` appended to its file name
pub(crate) fn sibling_with_suffix(dest: &Path, suffix: &str) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    dest.with_file_name(name)
}

/// Write stereo audio to a 16-bit WAV file
pub fn write_stereo_wav(path: &Path, audio: &StereoBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| ClipError::export_error(path, format!("Failed to create WAV file: {}", e)))?;

    for (l, r) in audio.left.iter().zip(audio.right.iter()) {
        let l_i16 = (*l * 32767.0).clamp(-32768.0, 32767.0) as i16;
        let r_i16 = (*r * 32767.0).clamp(-32768.0, 32767.0) as i16;

        writer
            .write_sample(l_i16)
            .and_then(|_| writer.write_sample(r_i16))
            .map_err(|e| ClipError::export_error(path, format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| ClipError::export_error(path, format!("Failed to finalize WAV: {}", e)))?;

    debug!("Wrote {} frames to {}", audio.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec(format: &str, bitrate: Option<&str>) -> ExportSpec {
        ExportSpec {
            format: format.to_string(),
            bitrate: bitrate.map(str::to_string),
        }
    }

    #[test]
    fn test_bitrate_only_for_mp3() {
        assert_eq!(spec("mp3", Some("192k")).effective_bitrate(), Some("192k"));
        assert_eq!(spec("flac", Some("192k")).effective_bitrate(), None);
        assert_eq!(spec("mp3", None).effective_bitrate(), None);
    }

    #[test]
    fn test_blank_bitrate_is_ignored() {
        assert_eq!(spec("mp3", Some("")).effective_bitrate(), None);
        assert_eq!(spec("mp3", Some("  ")).effective_bitrate(), None);

        let encoder = FfmpegEncoder::new();
        let cmd = encoder.build_command(
            Path::new("/tmp/in.wav"),
            Path::new("/tmp/out.mp3.part"),
            &spec("mp3", Some("")),
        );
        assert!(!cmd.get_args().any(|a| a == "-b:a"));
    }

    #[test]
    fn test_ffmpeg_command_line() {
        let encoder = FfmpegEncoder::new();
        let cmd = encoder.build_command(
            Path::new("/tmp/in.wav"),
            Path::new("/tmp/out.mp3.part"),
            &spec("mp3", Some("128k")),
        );
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(cmd.get_program(), "ffmpeg");
        assert!(args.windows(2).any(|w| w == ["-b:a", "128k"]));
        assert!(args.windows(2).any(|w| w == ["-f", "mp3"]));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp3.part"));

        let m4a = encoder.build_command(
            Path::new("/tmp/in.wav"),
            Path::new("/tmp/out.m4a.part"),
            &spec("m4a", Some("128k")),
        );
        let args: Vec<String> = m4a.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        assert!(!args.iter().any(|a| a == "-b:a"));
        assert!(args.windows(2).any(|w| w == ["-f", "ipod"]));
    }

    #[test]
    fn test_wav_encoder_writes_stereo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.wav");
        let clip = StereoBuffer::new(vec![0.5; 800], vec![-0.5; 800], 8000);
        WavEncoder.encode(&clip, &path, &spec("wav", None)).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.duration(), 800);
    }

    #[test]
    fn test_missing_ffmpeg_is_export_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("clip.mp3.part");
        let clip = StereoBuffer::new(vec![0.1; 80], vec![0.1; 80], 8000);
        let encoder = FfmpegEncoder::with_program("/definitely/not/ffmpeg");
        let err = encoder.encode(&clip, &dest, &spec("mp3", None)).unwrap_err();
        assert!(matches!(err, ClipError::ExportError { .. }));
        // Intermediate WAV is cleaned up
        assert!(!sibling_with_suffix(&dest, ".src.wav").exists());
    }

    #[test]
    fn test_sibling_suffix() {
        assert_eq!(
            sibling_with_suffix(Path::new("/o/Doe, John.mp3"), ".part"),
            PathBuf::from("/o/Doe, John.mp3.part")
        );
    }
}
