// Resolved-link cache seam

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::MediaArtifact;

/// Lookup table from normalized post endpoints to previously resolved
/// artifacts.
///
/// Implementations decide persistence; the pipeline only inserts after a
/// fully successful run.
#[async_trait]
pub trait LinkCache: Send + Sync {
    async fn lookup(&self, url: &str) -> Option<MediaArtifact>;
    async fn insert(&self, url: &str, artifact: &MediaArtifact);
}

/// Cache that never hits and never stores.
#[derive(Debug, Default)]
pub struct NoCache;

#[async_trait]
impl LinkCache for NoCache {
    async fn lookup(&self, _url: &str) -> Option<MediaArtifact> {
        None
    }

    async fn insert(&self, _url: &str, _artifact: &MediaArtifact) {}
}

/// Process-local cache, useful for runs that revisit the same links.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, MediaArtifact>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkCache for MemoryCache {
    async fn lookup(&self, url: &str) -> Option<MediaArtifact> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(url).cloned()
    }

    async fn insert(&self, url: &str, artifact: &MediaArtifact) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(url.to_string(), artifact.clone());
    }
}
