// Redgifs extractor: gif id -> metadata lookup -> best tier under the cap

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ResolverConfig;
use crate::errors::ResolveError;
use crate::extractors::base_artifact;
use crate::models::{
    ArtifactKind, CandidateLabel, MediaArtifact, MediaCandidate, PostDescriptor, Stage,
    MAX_SIZE_MB,
};
use crate::net::HttpClients;
use crate::utils::first_max_by_key;

/// Quality tiers in the content-URL map, largest first.
const TIER_KEYS: [&str; 4] = ["mp4", "mobile", "max5mbGif", "max2mbGif"];

lazy_static! {
    // Link shapes that carry the gif id, tried in order. The bare path
    // comes last: it matches the first segment of anything on the host.
    static ref ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"redgifs\.com/watch/([\w-]+)").unwrap(),
        Regex::new(r"redgifs\.com/ifr/([\w-]+)").unwrap(),
        Regex::new(r"redgifs\.com/([\w-]+)").unwrap(),
    ];
}

/// Resolves a redgifs post: look up the gif metadata, pick the largest
/// rendition at or under the size cap, download it.
pub async fn extract(
    clients: &HttpClients,
    config: &ResolverConfig,
    post: &PostDescriptor,
    scratch: &Path,
) -> Result<MediaArtifact, ResolveError> {
    let gif_id = extract_gif_id(&post.url)
        .ok_or_else(|| ResolveError::InvalidUrl(post.url.clone()))?;

    let endpoint = format!("{}{}", config.redgifs_api_base, gif_id);
    let response = clients
        .api
        .get(&endpoint)
        .send()
        .await
        .map_err(|err| ResolveError::FetchFailure(err.to_string()))?;
    if !response.status().is_success() {
        return Err(ResolveError::FetchFailure(format!(
            "{} returned {}",
            endpoint,
            response.status()
        )));
    }
    let doc: Value = response
        .json()
        .await
        .map_err(|err| ResolveError::FetchFailure(err.to_string()))?;

    let gfy_item = doc
        .get("gfyItem")
        .and_then(Value::as_object)
        .filter(|item| !item.is_empty())
        .ok_or_else(|| ResolveError::NoMetadata(gif_id.clone()))?;
    // A missing content-URL map is an empty one, which falls out below as
    // a size-limit failure.
    let candidates = match gfy_item.get("content_urls") {
        Some(urls) => tier_candidates(urls),
        None => Vec::new(),
    };
    let picked = first_max_by_key(&candidates, |c| c.size_mb)
        .ok_or(ResolveError::NoCandidatesWithinSizeLimit)?;
    info!(
        stage = %Stage::Downloading,
        gif_id = %gif_id,
        tier = ?picked.label,
        size_mb = picked.size_mb,
        "downloading gif rendition"
    );

    let target = scratch.join(format!("{}.mp4", gif_id));
    if !clients.download_to(&picked.source_url, &target).await {
        return Err(ResolveError::DownloadFailure(picked.source_url.clone()));
    }

    let mut artifact = base_artifact(post, ArtifactKind::Video);
    artifact.files = vec![target];
    artifact.file_type = Some("mp4".to_string());
    Ok(artifact)
}

fn extract_gif_id(url: &str) -> Option<String> {
    ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Candidates from the content-URL map, in tier order.
///
/// A tier counts only when it carries both a URL and a byte size; sizes
/// over the cap are dropped before selection.
fn tier_candidates(content_urls: &Value) -> Vec<MediaCandidate> {
    let mut candidates = Vec::new();
    for tier in TIER_KEYS {
        let entry = match content_urls.get(tier) {
            Some(entry) => entry,
            None => continue,
        };
        let url = match entry.get("url").and_then(Value::as_str) {
            Some(url) => url.to_string(),
            None => continue,
        };
        let size = match entry.get("size").and_then(Value::as_f64) {
            Some(size) => size,
            None => continue,
        };
        let size_mb = size / 1_048_576.0;
        if size_mb > MAX_SIZE_MB {
            debug!(tier, size_mb, "tier over size cap");
            continue;
        }
        candidates.push(MediaCandidate {
            label: CandidateLabel::Tier(tier),
            size_mb,
            source_url: url,
        });
    }
    candidates
}
