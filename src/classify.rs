// Post classification: every post lands in exactly one bucket

use crate::models::PostDescriptor;

/// Hosts served by the redgifs CDN family.
const REDGIFS_DOMAINS: [&str; 2] = ["redgifs.com", "www.redgifs.com"];

/// Media category of a post, deciding which extractor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Redgifs,
    Gallery,
    Video,
    Image,
    Other,
}

/// Buckets a post by the first matching rule, checked in priority order:
/// redgifs host, gallery flag, video flag, image hint. Anything left over
/// is `Other` and passes through without downloads.
pub fn classify(post: &PostDescriptor) -> PostKind {
    if is_redgifs(post) {
        return PostKind::Redgifs;
    }
    if post.is_gallery {
        return PostKind::Gallery;
    }
    if post.is_video {
        return PostKind::Video;
    }
    if post.post_hint.as_deref() == Some("image") {
        return PostKind::Image;
    }
    PostKind::Other
}

fn is_redgifs(post: &PostDescriptor) -> bool {
    REDGIFS_DOMAINS.contains(&post.domain.as_str())
}
