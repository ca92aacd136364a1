// Post URL recognition and share-link resolution

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::ResolveError;
use crate::net::HttpClients;

lazy_static! {
    // Mobile share links: /r/<sub>/s/<token>, opaque until followed.
    static ref SHORT_LINK: Regex =
        Regex::new(r"^https?://www\.reddit\.com/r/[^\s]+/s/[^\s]+").unwrap();
    // Canonical post links, scheme and www optional.
    static ref CANONICAL: Regex =
        Regex::new(r"(?:https?://)?(?:www\.)?reddit\.com/(r|user)/([^/]+)/comments/([^/]+)")
            .unwrap();
}

/// Identity of a post, independent of which link form named it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLocator {
    pub subreddit: String,
    pub post_id: String,
}

impl PostLocator {
    /// JSON metadata endpoint for this post under the given API base.
    pub fn endpoint(&self, base: &str) -> String {
        format!(
            "{}/r/{}/comments/{}.json",
            base.trim_end_matches('/'),
            self.subreddit,
            self.post_id
        )
    }
}

/// Whether `url` is a mobile share link that must be expanded first.
pub fn is_short_link(url: &str) -> bool {
    SHORT_LINK.is_match(url)
}

/// Pulls the subreddit and post id out of a canonical post link.
pub fn parse_post_url(url: &str) -> Result<PostLocator, ResolveError> {
    let caps = CANONICAL
        .captures(url)
        .ok_or_else(|| ResolveError::InvalidUrl(url.to_string()))?;
    Ok(PostLocator {
        subreddit: caps[2].to_string(),
        post_id: caps[3].to_string(),
    })
}

/// Turns any supported link form into a [`PostLocator`].
///
/// Share links get expanded over the network; canonical links parse
/// directly without any request.
pub async fn resolve_post_url(
    clients: &HttpClients,
    url: &str,
) -> Result<PostLocator, ResolveError> {
    if is_short_link(url) {
        let expanded = clients.final_url(url).await?;
        return parse_post_url(&expanded);
    }
    parse_post_url(url)
}
