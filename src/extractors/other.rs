// Passthrough for posts with nothing to download

use crate::extractors::base_artifact;
use crate::models::{ArtifactKind, MediaArtifact, PostDescriptor};

/// Terminal variant for text posts and unrecognized links: the post
/// fields are the whole artifact, no files are acquired.
pub fn extract(post: &PostDescriptor) -> MediaArtifact {
    base_artifact(post, ArtifactKind::Other)
}
