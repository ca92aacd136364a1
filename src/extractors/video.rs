// Video extractor: DASH manifest -> best representation -> optional mux

use std::path::Path;

use tracing::{debug, info};

use crate::config::ResolverConfig;
use crate::dash::{parse_manifest, select_video};
use crate::errors::ResolveError;
use crate::extractors::base_artifact;
use crate::models::{ArtifactKind, MediaArtifact, PostDescriptor, Stage};
use crate::mux::Muxer;
use crate::net::HttpClients;

/// Resolves a native video post.
///
/// Fetches and parses the DASH manifest, probes every representation, and
/// downloads the best one under the cap. When the manifest names an audio
/// track, both streams download concurrently and must succeed, and the
/// muxed file is the artifact; a mux failure is fatal, never video-only
/// output. Without audio the downloaded video file is final.
pub async fn extract(
    clients: &HttpClients,
    config: &ResolverConfig,
    muxer: &dyn Muxer,
    post: &PostDescriptor,
    scratch: &Path,
) -> Result<MediaArtifact, ResolveError> {
    let manifest_url = post
        .dash_url
        .as_deref()
        .ok_or(ResolveError::MissingManifestUrl)?;

    debug!(url = manifest_url, "fetching DASH manifest");
    let response = clients
        .api
        .get(manifest_url)
        .send()
        .await
        .map_err(|err| ResolveError::FetchFailure(err.to_string()))?;
    if !response.status().is_success() {
        return Err(ResolveError::FetchFailure(format!(
            "{} returned {}",
            manifest_url,
            response.status()
        )));
    }
    let xml = response
        .text()
        .await
        .map_err(|err| ResolveError::FetchFailure(err.to_string()))?;
    let manifest = parse_manifest(&xml)?;

    // Representation paths are relative to the post URL.
    let base_url = format!("{}/", post.url);
    let picked = select_video(clients, &manifest, &base_url, config.fan_out_limit).await?;
    info!(
        resolution = ?picked.resolution(),
        size_mb = picked.size_mb,
        "selected video rendition"
    );

    let video_path = scratch.join("video.mp4");
    let mut artifact = base_artifact(post, ArtifactKind::Video);
    artifact.file_type = Some("mp4".to_string());

    info!(stage = %Stage::Downloading, url = %picked.source_url, "downloading streams");
    match manifest.audio_path.as_ref() {
        Some(audio_rel) => {
            let audio_url = format!("{}{}", base_url, audio_rel);
            let audio_path = scratch.join("audio.mp4");
            let (video_ok, audio_ok) = tokio::join!(
                clients.download_to(&picked.source_url, &video_path),
                clients.download_to(&audio_url, &audio_path),
            );
            if !video_ok {
                return Err(ResolveError::DownloadFailure(picked.source_url.clone()));
            }
            if !audio_ok {
                return Err(ResolveError::DownloadFailure(audio_url));
            }
            let output = scratch.join("output_video.mp4");
            info!(stage = %Stage::Combining, "combining audio and video tracks");
            muxer.combine(&video_path, &audio_path, &output).await?;
            artifact.files = vec![output];
        }
        None => {
            if !clients.download_to(&picked.source_url, &video_path).await {
                return Err(ResolveError::DownloadFailure(picked.source_url.clone()));
            }
            artifact.files = vec![video_path];
        }
    }
    Ok(artifact)
}
