pub mod accessor;
pub mod cache;
pub mod classify;
pub mod config;
pub mod dash;
pub mod errors;
pub mod extractors;
pub mod models;
pub mod mux;
pub mod net;
pub mod orchestrator;
pub mod post;
pub mod resolver;
mod utils;

pub use cache::{LinkCache, MemoryCache, NoCache};
pub use config::ResolverConfig;
pub use errors::ResolveError;
pub use models::{ArtifactKind, MediaArtifact, MediaCandidate, PostDescriptor, ResolveResponse};
pub use mux::{FfmpegMuxer, Muxer};
pub use orchestrator::MediaResolver;
