// Post metadata fetching and validation

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::accessor::{first_str, walk, Step};
use crate::errors::ResolveError;
use crate::models::PostDescriptor;
use crate::net::HttpClients;

/// Shown to the user when a post has been taken down.
pub const DELETED_MESSAGE: &str = "The post was deleted by the author or moderators.";

/// Post fields inside the listing document.
const POST_PATH: [Step; 5] = [
    Step::Index(0),
    Step::Key("data"),
    Step::Key("children"),
    Step::Index(0),
    Step::Key("data"),
];

/// Places the DASH manifest URL can live: directly in the video metadata,
/// or one level down inside the crosspost parent. First present non-empty
/// value wins.
const DASH_URL_PATHS: [&[Step]; 2] = [
    &[
        Step::Key("secure_media"),
        Step::Key("reddit_video"),
        Step::Key("dash_url"),
    ],
    &[
        Step::Key("crosspost_parent_list"),
        Step::Index(0),
        Step::Key("secure_media"),
        Step::Key("reddit_video"),
        Step::Key("dash_url"),
    ],
];

/// Fetches the post JSON and validates it into a [`PostDescriptor`].
pub async fn fetch_post(
    clients: &HttpClients,
    endpoint: &str,
) -> Result<PostDescriptor, ResolveError> {
    debug!(endpoint, "fetching post metadata");
    let response = clients
        .api
        .get(endpoint)
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
    let listing: Value = response
        .json()
        .await
        .map_err(|err| ResolveError::FetchFailure(err.to_string()))?;
    descriptor_from_listing(&listing)
}

/// Validates the raw listing document.
///
/// Removed posts are rejected before shape validation so the user sees the
/// takedown message rather than a field error.
pub fn descriptor_from_listing(listing: &Value) -> Result<PostDescriptor, ResolveError> {
    let post = walk(listing, &POST_PATH)
        .ok_or_else(|| ResolveError::FetchFailure("unexpected listing shape".to_string()))?;

    // Only "deleted" counts; moderator and spam removals keep whatever
    // media metadata they still carry.
    let deleted = post
        .get("removed_by_category")
        .and_then(Value::as_str)
        .map_or(false, |reason| reason == "deleted");
    if deleted {
        return Err(ResolveError::PostRemoved(DELETED_MESSAGE.to_string()));
    }

    let dash_url = first_str(post, &DASH_URL_PATHS).map(str::to_string);

    let mut descriptor = PostDescriptor::deserialize(post)
        .map_err(|err| ResolveError::InvalidPost(err.to_string()))?;
    descriptor.dash_url = dash_url;
    Ok(descriptor)
}
