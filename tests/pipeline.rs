// End-to-end pipeline runs against a local mock server

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use reddit_media::{
    ArtifactKind, FfmpegMuxer, LinkCache, MediaArtifact, MediaResolver, MemoryCache, Muxer,
    ResolveError, ResolveResponse, ResolverConfig,
};

const POST_URL: &str = "https://www.reddit.com/r/pics/comments/abc123/interesting_post/";

fn base_post() -> Value {
    json!({
        "title": "Interesting post",
        "selftext": "",
        "url": "https://example.com",
        "over_18": false,
        "permalink": "/r/pics/comments/abc123/interesting_post/",
        "is_video": false,
        "domain": "example.com",
        "subreddit": "pics"
    })
}

fn listing(post: Value) -> Value {
    json!([
        { "data": { "children": [ { "data": post } ] } },
        { "data": { "children": [] } }
    ])
}

fn endpoint_for(server: &mockito::Server) -> String {
    format!("{}/r/pics/comments/abc123.json", server.url())
}

fn resolver_for(server: &mockito::Server, media_root: &Path) -> MediaResolver {
    let config = ResolverConfig::default()
        .with_reddit_base(server.url())
        .with_redgifs_api_base(format!("{}/v1/gifs/", server.url()))
        .with_media_root(media_root);
    MediaResolver::new(config).unwrap()
}

async fn mock_listing(server: &mut mockito::Server, post: Value) -> mockito::Mock {
    server
        .mock("GET", "/r/pics/comments/abc123.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(listing(post).to_string())
        .create_async()
        .await
}

#[derive(Clone)]
struct RecordingMuxer {
    calls: Arc<Mutex<Vec<(PathBuf, PathBuf, PathBuf)>>>,
}

impl RecordingMuxer {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Muxer for RecordingMuxer {
    async fn combine(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), ResolveError> {
        std::fs::write(output, b"MUXED")?;
        self.calls
            .lock()
            .unwrap()
            .push((video.into(), audio.into(), output.into()));
        Ok(())
    }
}

#[tokio::test]
async fn text_post_passes_through_without_downloads() {
    let mut server = mockito::Server::new_async().await;
    let mut post = base_post();
    post["selftext"] = json!("hello world");
    post["url"] = json!("https://www.reddit.com/r/pics/comments/abc123/interesting_post/");
    post["domain"] = json!("self.pics");
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path());

    let artifact = resolver.resolve(POST_URL).await.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Other);
    assert_eq!(artifact.description, "hello world");
    assert!(artifact.files.is_empty());
    assert!(artifact.temp_dir.is_none());
    assert_eq!(
        artifact.permalink,
        "https://www.reddit.com/r/pics/comments/abc123/interesting_post/"
    );
}

#[tokio::test]
async fn cache_hit_short_circuits_before_any_fetch() {
    let mut server = mockito::Server::new_async().await;
    let fetch = server
        .mock("GET", "/r/pics/comments/abc123.json")
        .expect(0)
        .create_async()
        .await;

    let cached = MediaArtifact {
        kind: ArtifactKind::Other,
        title: "from the cache".to_string(),
        description: String::new(),
        files: Vec::new(),
        temp_dir: None,
        file_type: None,
        nsfw: false,
        subreddit: "pics".to_string(),
        permalink: "https://www.reddit.com/r/pics/comments/abc123/interesting_post/".to_string(),
    };
    let cache = MemoryCache::new();
    cache.insert(&endpoint_for(&server), &cached).await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path()).with_cache(cache);

    let artifact = resolver.resolve(POST_URL).await.unwrap();
    assert_eq!(artifact.title, "from the cache");
    fetch.assert_async().await;
}

#[tokio::test]
async fn successful_runs_populate_the_cache() {
    let mut server = mockito::Server::new_async().await;
    let mut post = base_post();
    post["selftext"] = json!("text only");
    let fetch = server
        .mock("GET", "/r/pics/comments/abc123.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(listing(post).to_string())
        .expect(1)
        .create_async()
        .await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path()).with_cache(MemoryCache::new());

    let first = resolver.resolve(POST_URL).await.unwrap();
    let second = resolver.resolve(POST_URL).await.unwrap();
    assert_eq!(first, second);
    fetch.assert_async().await;
}

#[tokio::test]
async fn removed_post_reports_the_takedown_message() {
    let mut server = mockito::Server::new_async().await;
    let mut post = base_post();
    post["removed_by_category"] = json!("deleted");
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path());

    let response = resolver.resolve_response(POST_URL).await;
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["status"], json!("error"));
    assert_eq!(
        value["message"],
        json!("The post was deleted by the author or moderators.")
    );
}

#[tokio::test]
async fn gallery_keeps_item_order_and_drops_failed_items() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/g/first.jpg")
        .with_status(200)
        .with_body("jpg-0")
        .create_async()
        .await;
    server
        .mock("GET", "/g/second.jpg")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/g/third.mp4")
        .with_status(200)
        .with_body("mp4-2")
        .create_async()
        .await;

    let mut post = base_post();
    post["is_gallery"] = json!(true);
    post["gallery_data"] = json!({
        "items": [
            { "media_id": "aaa" },
            { "media_id": "bbb" },
            { "media_id": "ccc" }
        ]
    });
    post["media_metadata"] = json!({
        "aaa": { "e": "Image", "s": { "u": format!("{}/g/first.jpg", server.url()) } },
        "bbb": { "e": "Image", "s": { "u": format!("{}/g/second.jpg", server.url()) } },
        "ccc": { "e": "AnimatedImage", "s": { "mp4": format!("{}/g/third.mp4", server.url()) } }
    });
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path());

    let artifact = resolver.resolve(POST_URL).await.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Gallery);
    let temp_dir = artifact.temp_dir.clone().unwrap();
    assert_eq!(
        artifact.files,
        vec![temp_dir.join("media_0.jpg"), temp_dir.join("media_2.mp4")]
    );
    assert_eq!(
        std::fs::read_to_string(&artifact.files[0]).unwrap(),
        "jpg-0"
    );
    assert!(artifact.file_type.is_none());
}

#[tokio::test]
async fn fully_failed_gallery_still_resolves() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/g/only.jpg")
        .with_status(500)
        .create_async()
        .await;

    let mut post = base_post();
    post["is_gallery"] = json!(true);
    post["gallery_data"] = json!({ "items": [ { "media_id": "aaa" } ] });
    post["media_metadata"] = json!({
        "aaa": { "e": "Image", "s": { "u": format!("{}/g/only.jpg", server.url()) } }
    });
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path());

    let artifact = resolver.resolve(POST_URL).await.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Gallery);
    assert!(artifact.files.is_empty());
    assert!(artifact.temp_dir.is_some());
}

fn video_post(server: &mockito::Server) -> Value {
    let mut post = base_post();
    post["is_video"] = json!(true);
    post["url"] = json!(format!("{}/v", server.url()));
    post["domain"] = json!("v.redd.it");
    post["secure_media"] = json!({
        "reddit_video": { "dash_url": format!("{}/DASHPlaylist.mpd", server.url()) }
    });
    post
}

const MANIFEST_WITH_AUDIO: &str = r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011"><Period>
    <AdaptationSet contentType="video">
      <Representation width="1280" bandwidth="2500000"><BaseURL>DASH_720.mp4</BaseURL></Representation>
      <Representation width="640" bandwidth="800000"><BaseURL>DASH_360.mp4</BaseURL></Representation>
    </AdaptationSet>
    <AdaptationSet contentType="audio">
      <Representation bandwidth="128000"><BaseURL>DASH_AUDIO_128.mp4</BaseURL></Representation>
    </AdaptationSet>
</Period></MPD>"#;

const MANIFEST_VIDEO_ONLY: &str = r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011"><Period>
    <AdaptationSet contentType="video">
      <Representation width="640" bandwidth="800000"><BaseURL>DASH_360.mp4</BaseURL></Representation>
    </AdaptationSet>
</Period></MPD>"#;

async fn mock_video_host(server: &mut mockito::Server, manifest: &str) {
    server
        .mock("GET", "/DASHPlaylist.mpd")
        .with_status(200)
        .with_body(manifest)
        .create_async()
        .await;
    server
        .mock("HEAD", "/v/DASH_720.mp4")
        .with_status(200)
        .with_header("content-length", "10485760")
        .create_async()
        .await;
    server
        .mock("HEAD", "/v/DASH_360.mp4")
        .with_status(200)
        .with_header("content-length", "1048576")
        .create_async()
        .await;
    server
        .mock("GET", "/v/DASH_720.mp4")
        .with_status(200)
        .with_body("video-bytes")
        .create_async()
        .await;
    server
        .mock("GET", "/v/DASH_360.mp4")
        .with_status(200)
        .with_body("small-video-bytes")
        .create_async()
        .await;
    server
        .mock("GET", "/v/DASH_AUDIO_128.mp4")
        .with_status(200)
        .with_body("audio-bytes")
        .create_async()
        .await;
}

#[tokio::test]
async fn video_post_downloads_both_streams_and_muxes() {
    let mut server = mockito::Server::new_async().await;
    mock_video_host(&mut server, MANIFEST_WITH_AUDIO).await;
    let post = video_post(&server);
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let muxer = RecordingMuxer::new();
    let resolver = resolver_for(&server, root.path()).with_muxer(muxer.clone());

    let artifact = resolver.resolve(POST_URL).await.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Video);
    assert_eq!(artifact.file_type.as_deref(), Some("mp4"));

    let temp_dir = artifact.temp_dir.clone().unwrap();
    assert!(temp_dir.starts_with(root.path()));
    assert!(temp_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("post-"));
    assert_eq!(artifact.files, vec![temp_dir.join("output_video.mp4")]);
    assert_eq!(
        std::fs::read_to_string(&artifact.files[0]).unwrap(),
        "MUXED"
    );
    // The higher resolution fits under the cap, so it wins.
    assert_eq!(
        std::fs::read_to_string(temp_dir.join("video.mp4")).unwrap(),
        "video-bytes"
    );
    assert_eq!(
        std::fs::read_to_string(temp_dir.join("audio.mp4")).unwrap(),
        "audio-bytes"
    );
    assert_eq!(muxer.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn mux_failure_fails_the_run_and_removes_the_scratch_dir() {
    let mut server = mockito::Server::new_async().await;
    mock_video_host(&mut server, MANIFEST_WITH_AUDIO).await;
    let post = video_post(&server);
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let resolver =
        resolver_for(&server, root.path()).with_muxer(FfmpegMuxer::with_binary("false"));

    let result = resolver.resolve(POST_URL).await;
    assert!(matches!(result, Err(ResolveError::MuxFailure(_))));

    let leftovers: Vec<_> = std::fs::read_dir(root.path()).unwrap().collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn video_without_audio_skips_combining() {
    let mut server = mockito::Server::new_async().await;
    mock_video_host(&mut server, MANIFEST_VIDEO_ONLY).await;
    let post = video_post(&server);
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    // A muxer that would fail the run if it were ever invoked.
    let resolver =
        resolver_for(&server, root.path()).with_muxer(FfmpegMuxer::with_binary("false"));

    let artifact = resolver.resolve(POST_URL).await.unwrap();
    let temp_dir = artifact.temp_dir.clone().unwrap();
    assert_eq!(artifact.files, vec![temp_dir.join("video.mp4")]);
    assert_eq!(
        std::fs::read_to_string(&artifact.files[0]).unwrap(),
        "small-video-bytes"
    );
}

#[tokio::test]
async fn oversized_representations_produce_a_size_limit_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/DASHPlaylist.mpd")
        .with_status(200)
        .with_body(MANIFEST_VIDEO_ONLY)
        .create_async()
        .await;
    server
        .mock("HEAD", "/v/DASH_360.mp4")
        .with_status(200)
        .with_header("content-length", "104857600")
        .create_async()
        .await;
    let post = video_post(&server);
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path());

    let response = resolver.resolve_response(POST_URL).await;
    assert_eq!(
        response,
        ResolveResponse::Error {
            message: "no media candidates within the 45 MB size limit".to_string()
        }
    );
}

#[tokio::test]
async fn probe_without_content_length_is_admitted_as_zero() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/DASHPlaylist.mpd")
        .with_status(200)
        .with_body(MANIFEST_VIDEO_ONLY)
        .create_async()
        .await;
    // No explicit content-length on the probe response.
    server
        .mock("HEAD", "/v/DASH_360.mp4")
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("GET", "/v/DASH_360.mp4")
        .with_status(200)
        .with_body("small-video-bytes")
        .create_async()
        .await;
    let post = video_post(&server);
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path());

    let artifact = resolver.resolve(POST_URL).await.unwrap();
    let temp_dir = artifact.temp_dir.clone().unwrap();
    assert_eq!(artifact.files, vec![temp_dir.join("video.mp4")]);
}

#[tokio::test]
async fn redgifs_post_picks_the_largest_tier_under_the_cap() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1/gifs/happygif")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "gfyItem": {
                    "content_urls": {
                        "mp4": { "url": format!("{}/files/big.mp4", server.url()), "size": 52428800 },
                        "mobile": { "url": format!("{}/files/mobile.mp4", server.url()), "size": 10485760 },
                        "max5mbGif": { "url": format!("{}/files/small.gif", server.url()), "size": 4194304 }
                    }
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    let big = server
        .mock("GET", "/files/big.mp4")
        .expect(0)
        .create_async()
        .await;
    server
        .mock("GET", "/files/mobile.mp4")
        .with_status(200)
        .with_body("gif-as-mp4")
        .create_async()
        .await;

    let mut post = base_post();
    post["url"] = json!("https://www.redgifs.com/watch/happygif");
    post["domain"] = json!("redgifs.com");
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path());

    let artifact = resolver.resolve(POST_URL).await.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Video);
    assert_eq!(artifact.file_type.as_deref(), Some("mp4"));
    let temp_dir = artifact.temp_dir.clone().unwrap();
    assert_eq!(artifact.files, vec![temp_dir.join("happygif.mp4")]);
    assert_eq!(
        std::fs::read_to_string(&artifact.files[0]).unwrap(),
        "gif-as-mp4"
    );
    big.assert_async().await;
}

#[tokio::test]
async fn image_post_downloads_into_the_artifact_dir() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/i/cat.png")
        .with_status(200)
        .with_body("png-bytes")
        .create_async()
        .await;

    let mut post = base_post();
    post["post_hint"] = json!("image");
    post["url"] = json!(format!("{}/i/cat.png", server.url()));
    post["domain"] = json!("i.redd.it");
    post["over_18"] = json!(true);
    mock_listing(&mut server, post).await;

    let root = tempfile::tempdir().unwrap();
    let resolver = resolver_for(&server, root.path());

    let artifact = resolver.resolve(POST_URL).await.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Image);
    assert!(artifact.nsfw);
    assert_eq!(artifact.file_type.as_deref(), Some("png"));
    let temp_dir = artifact.temp_dir.clone().unwrap();
    assert!(temp_dir.exists());
    assert_eq!(artifact.files, vec![temp_dir.join("image.png")]);
}

#[tokio::test]
async fn invalid_links_fail_fast() {
    let root = tempfile::tempdir().unwrap();
    let config = ResolverConfig::default().with_media_root(root.path());
    let resolver = MediaResolver::new(config).unwrap();

    let result = resolver.resolve("https://example.com/not/a/post").await;
    assert!(matches!(result, Err(ResolveError::InvalidUrl(_))));

    let response = resolver
        .resolve_response("https://example.com/not/a/post")
        .await;
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["status"], json!("error"));
    assert_eq!(
        value["message"],
        json!("invalid post URL: https://example.com/not/a/post")
    );
}
