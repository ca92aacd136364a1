// One extractor per classifier variant

pub mod gallery;
pub mod image;
pub mod other;
pub mod redgifs;
pub mod video;

use crate::models::{ArtifactKind, MediaArtifact, PostDescriptor};

/// Artifact skeleton shared by every variant: descriptive post fields
/// filled in, file fields left for the extractor.
pub(crate) fn base_artifact(post: &PostDescriptor, kind: ArtifactKind) -> MediaArtifact {
    MediaArtifact {
        kind,
        title: post.title.clone(),
        description: post.selftext.clone(),
        files: Vec::new(),
        temp_dir: None,
        file_type: None,
        nsfw: post.over_18,
        subreddit: post.subreddit.clone(),
        permalink: post.absolute_permalink(),
    }
}

#[cfg(test)]
pub(crate) fn make_test_post() -> PostDescriptor {
    PostDescriptor {
        title: "A test post".to_string(),
        selftext: "body text".to_string(),
        url: "https://i.redd.it/abc.jpg".to_string(),
        removed_by_category: None,
        post_hint: None,
        over_18: true,
        permalink: "/r/test/comments/abc/a_test_post/".to_string(),
        is_video: false,
        dash_url: None,
        is_gallery: false,
        domain: "i.redd.it".to_string(),
        subreddit: "test".to_string(),
        media_metadata: None,
        gallery_data: None,
        preview: None,
    }
}
