// Audio/video muxing behind a trait so the pipeline can be tested
// without a real ffmpeg install

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::ResolveError;

/// Combines a silent video track with its audio track into one file.
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn combine(&self, video: &Path, audio: &Path, output: &Path)
        -> Result<(), ResolveError>;
}

/// Well-known install locations, checked before falling back to PATH.
const FFMPEG_CANDIDATES: [&str; 3] = [
    "/opt/homebrew/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/usr/bin/ffmpeg",
];

/// [`Muxer`] backed by the ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    binary: PathBuf,
}

impl FfmpegMuxer {
    pub fn new() -> Self {
        Self {
            binary: locate_ffmpeg(),
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    /// Runs `ffmpeg -i video -i audio -c:v copy -c:a aac -y output`.
    ///
    /// The video stream is copied untouched; audio is re-encoded to AAC so
    /// the container always ends up playable.
    async fn combine(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<(), ResolveError> {
        debug!(binary = %self.binary.display(), output = %output.display(), "combining tracks");
        let result = Command::new(&self.binary)
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .arg("-c:v")
            .arg("copy")
            .arg("-c:a")
            .arg("aac")
            .arg("-y")
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| {
                ResolveError::MuxFailure(format!(
                    "could not launch {}: {}",
                    self.binary.display(),
                    err
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            if stderr.is_empty() {
                return Err(ResolveError::MuxFailure(format!(
                    "ffmpeg exited with {}",
                    result.status
                )));
            }
            return Err(ResolveError::MuxFailure(stderr));
        }
        Ok(())
    }
}

fn locate_ffmpeg() -> PathBuf {
    for candidate in FFMPEG_CANDIDATES {
        let path = Path::new(candidate);
        if path.exists() {
            return path.to_path_buf();
        }
    }
    PathBuf::from("ffmpeg")
}
