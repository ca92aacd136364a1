// Gallery extractor: ordered items, per-item failure tolerance

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::ResolverConfig;
use crate::errors::ResolveError;
use crate::extractors::base_artifact;
use crate::models::{ArtifactKind, MediaArtifact, PostDescriptor, Stage};
use crate::net::HttpClients;
use crate::utils::{extension_from_url, unescape_url};

/// One gallery entry scheduled for download. `index` is the position in
/// the posted item order and fixes the output file name.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GalleryItem {
    index: usize,
    source_url: String,
    file_name: String,
}

/// Downloads every usable gallery item into the scratch directory.
///
/// Downloads run concurrently under the fan-out bound; a failed item is
/// dropped without failing the batch. A gallery where every item failed
/// still resolves successfully, with an empty file list.
pub async fn extract(
    clients: &HttpClients,
    config: &ResolverConfig,
    post: &PostDescriptor,
    scratch: &Path,
) -> Result<MediaArtifact, ResolveError> {
    let planned = plan_items(post)?;
    info!(stage = %Stage::Downloading, items = planned.len(), "downloading gallery");

    let semaphore = Arc::new(Semaphore::new(config.fan_out_limit));
    let downloads = planned.iter().map(|item| {
        let semaphore = Arc::clone(&semaphore);
        let target = scratch.join(&item.file_name);
        async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return None,
            };
            if clients.download_to(&item.source_url, &target).await {
                Some(target)
            } else {
                warn!(index = item.index, url = %item.source_url, "gallery item dropped");
                None
            }
        }
    });

    // join_all yields results in launch order, so surviving files keep the
    // posted gallery order.
    let files: Vec<PathBuf> = join_all(downloads).await.into_iter().flatten().collect();

    let mut artifact = base_artifact(post, ArtifactKind::Gallery);
    artifact.files = files;
    Ok(artifact)
}

/// Resolves the ordered download plan, or fails when the post lacks the
/// gallery structure entirely. An empty `items` list is a valid plan.
fn plan_items(post: &PostDescriptor) -> Result<Vec<GalleryItem>, ResolveError> {
    let metadata = post.media_metadata.as_ref().ok_or_else(|| {
        ResolveError::InvalidPost("gallery post without media_metadata".to_string())
    })?;
    let items = post
        .gallery_data
        .as_ref()
        .and_then(|gallery| gallery.get("items"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ResolveError::InvalidPost("gallery post without gallery_data items".to_string())
        })?;

    let mut planned = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let media_id = match item.get("media_id").and_then(Value::as_str) {
            Some(id) => id,
            None => continue,
        };
        let source_url = match metadata.get(media_id).and_then(item_source) {
            Some(url) => url,
            None => {
                warn!(index, media_id, "gallery item has no usable source");
                continue;
            }
        };
        let file_name = format!("media_{}{}", index, extension_from_url(&source_url));
        planned.push(GalleryItem {
            index,
            source_url,
            file_name,
        });
    }
    Ok(planned)
}

/// Source URL for one media-info entry.
///
/// Static images use their source URL; animated entries prefer the MP4
/// variant over the GIF. Entries of any other type are unusable.
fn item_source(meta: &Value) -> Option<String> {
    let source = meta.get("s")?;
    let url = match meta.get("e").and_then(Value::as_str) {
        Some("Image") => source.get("u").and_then(Value::as_str),
        Some("AnimatedImage") => source
            .get("mp4")
            .and_then(Value::as_str)
            .or_else(|| source.get("gif").and_then(Value::as_str)),
        _ => None,
    };
    url.map(unescape_url)
}
