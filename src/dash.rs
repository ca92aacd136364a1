// DASH manifest handling
//
// Reddit serves a small static MPD per video post. Only the first
// adaptation set per content type is read; representations without a
// width attribute or a BaseURL child are ignored.

use std::sync::Arc;

use futures::future::join_all;
use roxmltree::{Document, Node};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::errors::ResolveError;
use crate::models::{CandidateLabel, MediaCandidate, MAX_SIZE_MB};
use crate::net::HttpClients;
use crate::utils::first_max_by_key;

/// One video stream advertised by the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRepresentation {
    pub width: u32,
    pub bandwidth: u64,
    /// Relative to the post URL.
    pub base_url: String,
}

/// Streams extracted from one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashManifest {
    pub video: Vec<VideoRepresentation>,
    pub audio_path: Option<String>,
}

/// Parses the MPD document into video representations plus an optional
/// audio path.
///
/// Tags are matched by local name so the DASH default namespace never
/// gets in the way.
pub fn parse_manifest(xml: &str) -> Result<DashManifest, ResolveError> {
    let doc = Document::parse(xml)
        .map_err(|err| ResolveError::FetchFailure(format!("manifest parse: {}", err)))?;

    let sets: Vec<Node> = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "AdaptationSet")
        .collect();

    let mut video = Vec::new();
    if let Some(set) = sets
        .iter()
        .find(|n| n.attribute("contentType") == Some("video"))
    {
        for rep in representations(*set) {
            let width = match rep.attribute("width").and_then(|v| v.parse::<u32>().ok()) {
                Some(width) => width,
                None => continue,
            };
            let base_url = match base_url_text(rep) {
                Some(base_url) => base_url,
                None => continue,
            };
            let bandwidth = rep
                .attribute("bandwidth")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            video.push(VideoRepresentation {
                width,
                bandwidth,
                base_url,
            });
        }
    }

    let audio_path = sets
        .iter()
        .find(|n| n.attribute("contentType") == Some("audio"))
        .and_then(|set| pick_audio_path(*set));

    Ok(DashManifest { video, audio_path })
}

/// Highest-bandwidth audio path in the set.
///
/// The bandwidth bar rises on every strictly greater value even when that
/// representation carries no BaseURL, in which case the previously kept
/// path survives. Zero-bandwidth entries never clear the bar.
fn pick_audio_path(set: Node<'_, '_>) -> Option<String> {
    let mut best_bandwidth: u64 = 0;
    let mut path = None;
    for rep in representations(set) {
        let bandwidth = rep
            .attribute("bandwidth")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        if bandwidth > best_bandwidth {
            best_bandwidth = bandwidth;
            if let Some(base_url) = base_url_text(rep) {
                path = Some(base_url);
            }
        }
    }
    path
}

fn representations<'a, 'd>(set: Node<'a, 'd>) -> impl Iterator<Item = Node<'a, 'd>> {
    set.children()
        .filter(|n| n.tag_name().name() == "Representation")
}

fn base_url_text(rep: Node<'_, '_>) -> Option<String> {
    rep.children()
        .find(|n| n.tag_name().name() == "BaseURL")
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Probes every video representation and picks the best one under the
/// size cap.
///
/// Probes run concurrently, bounded by `fan_out_limit`. Representations
/// whose probe fails are dropped; oversized ones are filtered out; ties on
/// resolution keep the earliest manifest entry. With nothing left this is
/// a [`ResolveError::NoCandidatesWithinSizeLimit`].
pub async fn select_video(
    clients: &HttpClients,
    manifest: &DashManifest,
    base_url: &str,
    fan_out_limit: usize,
) -> Result<MediaCandidate, ResolveError> {
    let semaphore = Arc::new(Semaphore::new(fan_out_limit));
    let probes = manifest.video.iter().map(|rep| {
        let semaphore = Arc::clone(&semaphore);
        let url = format!("{}{}", base_url, rep.base_url);
        let width = rep.width;
        async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return None,
            };
            let size_mb = clients.probe_size_mb(&url).await?;
            Some(MediaCandidate {
                label: CandidateLabel::Resolution(width),
                size_mb,
                source_url: url,
            })
        }
    });

    let mut candidates = Vec::new();
    for candidate in join_all(probes).await.into_iter().flatten() {
        if candidate.size_mb > MAX_SIZE_MB {
            debug!(
                url = %candidate.source_url,
                size_mb = candidate.size_mb,
                "representation over size cap"
            );
            continue;
        }
        candidates.push(candidate);
    }

    first_max_by_key(&candidates, |c| c.resolution().unwrap_or(0))
        .cloned()
        .ok_or(ResolveError::NoCandidatesWithinSizeLimit)
}
