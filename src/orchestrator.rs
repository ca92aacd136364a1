// Pipeline orchestration: one run per inbound link

use tempfile::TempDir;
use tracing::{error, info};

use crate::cache::{LinkCache, NoCache};
use crate::classify::{classify, PostKind};
use crate::config::ResolverConfig;
use crate::errors::ResolveError;
use crate::extractors;
use crate::models::{MediaArtifact, PostDescriptor, ResolveResponse, Stage};
use crate::mux::{FfmpegMuxer, Muxer};
use crate::net::HttpClients;
use crate::post::fetch_post;
use crate::resolver::resolve_post_url;

/// Entry point for the whole pipeline. One instance serves any number of
/// concurrent resolutions; runs share nothing but the cache and muxer
/// collaborators.
pub struct MediaResolver {
    config: ResolverConfig,
    clients: HttpClients,
    cache: Box<dyn LinkCache>,
    muxer: Box<dyn Muxer>,
}

impl MediaResolver {
    /// Builds a resolver with no cache and the system ffmpeg.
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        let clients = HttpClients::new(&config)?;
        let muxer: Box<dyn Muxer> = match config.ffmpeg_path.as_ref() {
            Some(path) => Box::new(FfmpegMuxer::with_binary(path.clone())),
            None => Box::new(FfmpegMuxer::new()),
        };
        Ok(Self {
            config,
            clients,
            cache: Box::new(NoCache),
            muxer,
        })
    }

    pub fn with_cache(mut self, cache: impl LinkCache + 'static) -> Self {
        self.cache = Box::new(cache);
        self
    }

    pub fn with_muxer(mut self, muxer: impl Muxer + 'static) -> Self {
        self.muxer = Box::new(muxer);
        self
    }

    /// Resolves one link to its media artifact.
    ///
    /// On success the artifact's `temp_dir` (when present) belongs to the
    /// caller, who must delete it after consuming the files.
    pub async fn resolve(&self, url: &str) -> Result<MediaArtifact, ResolveError> {
        match self.run(url).await {
            Ok(artifact) => {
                info!(stage = %Stage::Done, url, "resolved");
                Ok(artifact)
            }
            Err(err) => {
                error!(stage = %Stage::Failed, url, error = %err, "resolution failed");
                Err(err)
            }
        }
    }

    /// Like [`MediaResolver::resolve`], flattened into the user-facing
    /// envelope.
    pub async fn resolve_response(&self, url: &str) -> ResolveResponse {
        match self.resolve(url).await {
            Ok(artifact) => ResolveResponse::Success { data: artifact },
            Err(err) => ResolveResponse::Error {
                message: err.to_string(),
            },
        }
    }

    async fn run(&self, url: &str) -> Result<MediaArtifact, ResolveError> {
        info!(stage = %Stage::ResolvingUrl, url, "pipeline started");
        let locator = resolve_post_url(&self.clients, url).await?;
        let endpoint = locator.endpoint(&self.config.reddit_base);

        info!(stage = %Stage::CheckingCache, endpoint = %endpoint, "consulting cache");
        if let Some(cached) = self.cache.lookup(&endpoint).await {
            info!(endpoint = %endpoint, "cache hit");
            return Ok(cached);
        }

        info!(stage = %Stage::FetchingPost, endpoint = %endpoint, "fetching post");
        let post = fetch_post(&self.clients, &endpoint).await?;

        let kind = classify(&post);
        info!(stage = %Stage::Classifying, kind = ?kind, "post classified");

        let artifact = match kind {
            PostKind::Other => extractors::other::extract(&post),
            _ => self.extract_with_scratch(kind, &post).await?,
        };

        self.cache.insert(&endpoint, &artifact).await;
        Ok(artifact)
    }

    /// Runs a downloading extractor inside a fresh scratch directory.
    ///
    /// On success the directory is kept and handed over through the
    /// artifact's `temp_dir`; on failure it is removed with everything
    /// inside it.
    async fn extract_with_scratch(
        &self,
        kind: PostKind,
        post: &PostDescriptor,
    ) -> Result<MediaArtifact, ResolveError> {
        let scratch = self.scratch_dir()?;
        info!(stage = %Stage::ExtractingMedia, dir = %scratch.path().display(), "extracting media");

        let result = match kind {
            PostKind::Redgifs => {
                extractors::redgifs::extract(&self.clients, &self.config, post, scratch.path())
                    .await
            }
            PostKind::Gallery => {
                extractors::gallery::extract(&self.clients, &self.config, post, scratch.path())
                    .await
            }
            PostKind::Video => {
                extractors::video::extract(
                    &self.clients,
                    &self.config,
                    self.muxer.as_ref(),
                    post,
                    scratch.path(),
                )
                .await
            }
            PostKind::Image => {
                extractors::image::extract(&self.clients, post, scratch.path()).await
            }
            PostKind::Other => unreachable!("passthrough posts never reach extraction"),
        };

        let mut artifact = result?;
        artifact.temp_dir = Some(scratch.keep());
        Ok(artifact)
    }

    fn scratch_dir(&self) -> Result<TempDir, ResolveError> {
        std::fs::create_dir_all(&self.config.media_root)?;
        let dir = tempfile::Builder::new()
            .prefix("post-")
            .tempdir_in(&self.config.media_root)?;
        Ok(dir)
    }
}
