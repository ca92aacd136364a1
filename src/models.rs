// Data model for fetched posts, media candidates, and artifacts

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hard cap applied to every video/gif candidate before selection.
pub const MAX_SIZE_MB: f64 = 45.0;

/// Validated snapshot of a fetched post, taken once per run.
#[derive(Debug, Clone, Deserialize)]
pub struct PostDescriptor {
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub url: String,
    #[serde(default)]
    pub removed_by_category: Option<String>,
    #[serde(default)]
    pub post_hint: Option<String>,
    pub over_18: bool,
    pub permalink: String,
    pub is_video: bool,
    /// Manifest URL discovered separately in the raw document, not a
    /// top-level post field.
    #[serde(default)]
    pub dash_url: Option<String>,
    #[serde(default)]
    pub is_gallery: bool,
    pub domain: String,
    pub subreddit: String,
    #[serde(default)]
    pub media_metadata: Option<Value>,
    #[serde(default)]
    pub gallery_data: Option<Value>,
    #[serde(default)]
    pub preview: Option<Value>,
}

impl PostDescriptor {
    /// Permalink as an absolute URL.
    pub fn absolute_permalink(&self) -> String {
        if self.permalink.starts_with("http") {
            self.permalink.clone()
        } else {
            format!("https://www.reddit.com{}", self.permalink)
        }
    }
}

/// Where a candidate sits in its source listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateLabel {
    /// Horizontal resolution of a DASH representation.
    Resolution(u32),
    /// Named quality tier from the redgifs content-URL map.
    Tier(&'static str),
}

/// One downloadable media variant, eligible for selection under the cap.
///
/// Never persisted; scoped to a single extraction call.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCandidate {
    pub label: CandidateLabel,
    pub size_mb: f64,
    pub source_url: String,
}

impl MediaCandidate {
    /// Horizontal resolution, when the candidate came from a manifest.
    pub fn resolution(&self) -> Option<u32> {
        match self.label {
            CandidateLabel::Resolution(width) => Some(width),
            CandidateLabel::Tier(_) => None,
        }
    }
}

/// Media category an artifact falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Video,
    Image,
    Gallery,
    Other,
}

/// Final output of one pipeline run.
///
/// `temp_dir`, when present, holds every downloaded file and belongs to
/// the caller once the run returns: delete it after consuming the files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaArtifact {
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    #[serde(default)]
    pub file_type: Option<String>,
    pub nsfw: bool,
    pub subreddit: String,
    pub permalink: String,
}

/// User-facing envelope for a pipeline outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResolveResponse {
    Success { data: MediaArtifact },
    Error { message: String },
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingUrl,
    CheckingCache,
    FetchingPost,
    Classifying,
    ExtractingMedia,
    Downloading,
    Combining,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolvingUrl => "resolving_url",
            Self::CheckingCache => "checking_cache",
            Self::FetchingPost => "fetching_post",
            Self::Classifying => "classifying",
            Self::ExtractingMedia => "extracting_media",
            Self::Downloading => "downloading",
            Self::Combining => "combining",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
