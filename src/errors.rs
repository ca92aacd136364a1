// Error taxonomy for the resolution pipeline

use thiserror::Error;

use crate::models::MAX_SIZE_MB;

/// Failures a pipeline run can surface.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input string is not a recognizable post link
    #[error("invalid post URL: {0}")]
    InvalidUrl(String),

    /// A metadata endpoint was unreachable, rejected the request, or
    /// returned an undecodable body
    #[error("fetch failed: {0}")]
    FetchFailure(String),

    /// The post no longer exists
    #[error("{0}")]
    PostRemoved(String),

    /// The post document is missing required fields
    #[error("invalid post data: {0}")]
    InvalidPost(String),

    /// A third-party metadata response lacks the expected media object
    #[error("missing media metadata: {0}")]
    NoMetadata(String),

    /// A video post carries no DASH manifest URL
    #[error("no DASH manifest URL found for video post")]
    MissingManifestUrl,

    /// Every discovered candidate exceeded the size cap, or none existed
    #[error("no media candidates within the {} MB size limit", MAX_SIZE_MB)]
    NoCandidatesWithinSizeLimit,

    /// A required stream or file transfer failed
    #[error("download failed: {0}")]
    DownloadFailure(String),

    /// Stream combination failed
    #[error("mux failed: {0}")]
    MuxFailure(String),

    /// Local filesystem failure while staging media
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
