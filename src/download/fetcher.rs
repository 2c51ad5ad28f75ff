//! Search-and-download backends

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// A single failed fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {code:?}")]
    Exit { program: String, code: Option<i32> },
}

/// External capability that resolves a search query to audio on disk
pub trait AudioFetcher: Send + Sync {
    /// Fetch the first result for `query` as `format` audio
    ///
    /// `template` contains `%(ext)s`, which the backend replaces with the
    /// extension of the file it writes.
    fn fetch(&self, query: &str, template: &Path, format: &str) -> Result<(), FetchError>;

    /// Get the name of this fetcher (for logging)
    fn name(&self) -> &'static str;
}

/// yt-dlp subprocess backend using `ytsearch1:` queries
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: PathBuf,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
        }
    }

    /// Use a specific yt-dlp binary
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_command(&self, query: &str, template: &Path, format: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--extract-audio")
            .arg("--audio-format")
            .arg(format)
            .arg("-o")
            .arg(template)
            .arg(format!("ytsearch1:{}", query))
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioFetcher for YtDlpFetcher {
    fn fetch(&self, query: &str, template: &Path, format: &str) -> Result<(), FetchError> {
        let program = self.program.display().to_string();
        let mut cmd = self.build_command(query, template, format);
        debug!("Running yt-dlp: {:?}", cmd);

        let status = cmd.status().map_err(|source| FetchError::Spawn {
            program: program.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(FetchError::Exit {
                program,
                code: status.code(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let fetcher = YtDlpFetcher::new();
        let cmd = fetcher.build_command(
            "Daft Punk One More Time",
            Path::new("/out/Doe, John_full.%(ext)s"),
            "mp3",
        );
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "--extract-audio",
                "--audio-format",
                "mp3",
                "-o",
                "/out/Doe, John_full.%(ext)s",
                "ytsearch1:Daft Punk One More Time",
            ]
        );
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let fetcher = YtDlpFetcher::with_program("/definitely/not/yt-dlp");
        let err = fetcher
            .fetch("q", Path::new("/tmp/x_full.%(ext)s"), "mp3")
            .unwrap_err();
        assert!(matches!(err, FetchError::Spawn { .. }));
    }
}
