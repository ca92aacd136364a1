// Image extractor, with the GIF-to-MP4 preview upgrade

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::accessor::{walk_str, Step};
use crate::errors::ResolveError;
use crate::extractors::base_artifact;
use crate::models::{ArtifactKind, MediaArtifact, PostDescriptor, Stage};
use crate::net::HttpClients;
use crate::utils::{extension_from_url, unescape_url};

/// Downloads the post image into the scratch directory.
///
/// GIF posts are swapped for an MP4 rendition when the preview metadata
/// offers one; otherwise the raw URL is fetched as-is.
pub async fn extract(
    clients: &HttpClients,
    post: &PostDescriptor,
    scratch: &Path,
) -> Result<MediaArtifact, ResolveError> {
    let source = pick_source(post);
    let extension = extension_from_url(&source);
    let target = scratch.join(format!("image{}", extension));

    info!(stage = %Stage::Downloading, url = %source, "downloading image");
    if !clients.download_to(&source, &target).await {
        return Err(ResolveError::DownloadFailure(source));
    }

    let mut artifact = base_artifact(post, ArtifactKind::Image);
    artifact.files = vec![target];
    artifact.file_type = Some(extension.trim_start_matches('.').to_string());
    Ok(artifact)
}

fn pick_source(post: &PostDescriptor) -> String {
    if post.url.ends_with(".gif") {
        if let Some(mp4) = mp4_rendition(post) {
            return mp4;
        }
    }
    post.url.clone()
}

/// MP4 stand-in for a GIF, from the preview metadata.
///
/// A `reddit_video_preview` node settles the question by itself; only when
/// that node is absent do the per-image MP4 variants get scanned.
fn mp4_rendition(post: &PostDescriptor) -> Option<String> {
    let preview = post.preview.as_ref()?;
    if let Some(fallback) = preview.get("reddit_video_preview") {
        return fallback
            .get("fallback_url")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    let images = preview.get("images").and_then(Value::as_array)?;
    images.iter().find_map(|image| {
        walk_str(
            image,
            &[
                Step::Key("variants"),
                Step::Key("mp4"),
                Step::Key("source"),
                Step::Key("url"),
            ],
        )
        .map(unescape_url)
    })
}
