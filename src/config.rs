// Pipeline configuration

use std::path::PathBuf;
use std::time::Duration;

/// Tunables for a resolver instance.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Directory under which per-run scratch directories are created.
    pub media_root: PathBuf,
    /// Base URL for post metadata endpoints.
    pub reddit_base: String,
    /// Base URL for redgifs gif metadata lookups.
    pub redgifs_api_base: String,
    /// Timeout for metadata requests (post JSON, manifests, redirects).
    pub metadata_timeout: Duration,
    /// Upper bound on concurrent probes or downloads in one fan-out.
    pub fan_out_limit: usize,
    /// Explicit ffmpeg path; autodetected when unset.
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media_files"),
            reddit_base: "https://www.reddit.com".to_string(),
            redgifs_api_base: "https://api.redgifs.com/v1/gifs/".to_string(),
            metadata_timeout: Duration::from_secs(10),
            fan_out_limit: 8,
            ffmpeg_path: None,
        }
    }
}

impl ResolverConfig {
    pub fn with_media_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.media_root = root.into();
        self
    }

    pub fn with_reddit_base(mut self, base: impl Into<String>) -> Self {
        self.reddit_base = base.into();
        self
    }

    pub fn with_redgifs_api_base(mut self, base: impl Into<String>) -> Self {
        self.redgifs_api_base = base.into();
        self
    }

    pub fn with_metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    pub fn with_fan_out_limit(mut self, limit: usize) -> Self {
        self.fan_out_limit = limit;
        self
    }

    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }
}
