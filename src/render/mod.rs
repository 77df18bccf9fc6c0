//! Rendering pipeline: context, engine, per-revision cache and diff.

pub mod cache;
pub mod context;
pub mod diff;
pub mod engine;

pub use cache::{CacheStats, NameSet, RenderCache};
pub use context::{RenderContext, RenderContextBuilder};
pub use diff::{HtmlDiffer, WordDiff};
pub use engine::{PageRenderer, RenderingEngine, RevisionHistory};
