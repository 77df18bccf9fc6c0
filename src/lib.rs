//! wikiloom - Wiki Page Rendering and Reference Tracking
//!
//! Renders wiki revisions to HTML, keeps the reference graph between pages
//! current, and produces word-level diffs between revisions.
//!
//! ## Core Features
//!
//! - **Render modes**: display, publish and export HTML per revision
//! - **Per-revision cache**: display and publish results memoized until the
//!   revision changes
//! - **Reference graph**: linked, wanted, included and category references
//!   replaced atomically on every save
//! - **Revision diffs**: word diff of rendered HTML
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use wikiloom::{Database, RenderContext, RenderingEngine, UrlGenerator, WikiStore};
//!
//! let db = Database::open("wiki.db")?;
//! db.initialize()?;
//! let store = WikiStore::new(Arc::new(db));
//!
//! let web = store.require_web("wiki")?;
//! let (page, revision) = store.save_revision(&web, "HomePage", "See [[SomePage]]", "Alice")?;
//!
//! let context = RenderContext::builder()
//!     .link_resolver(Arc::new(UrlGenerator::new("", store.page_index()?)))
//!     .includes(Arc::new(store.clone()))
//!     .build()?;
//! let renderer = RenderingEngine::new(context).bind(web, page, revision)?;
//! let (html, report) = renderer.display_content_updating_references(&store)?;
//! ```
//!
//! ## Modules
//!
//! - [`markup`]: wiki grammar, chunks and link resolution
//! - [`render`]: rendering engine, cache and diff
//! - [`references`]: reference extraction and synchronization
//! - [`storage`]: SQLite persistence with connection pooling
//! - [`config`]: layered configuration

pub mod cli;
pub mod config;
pub mod constants;
pub mod markup;
pub mod references;
pub mod render;
pub mod storage;
pub mod types;

#[cfg(test)]
mod test_support;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, RenderConfig, StorageConfig, WikiConfig};

// Error Types
pub use types::error::{Result, ResultExt, WikiError};

// Domain
pub use types::{
    LinkType, Page, PageId, Reference, RenderMode, Revision, RevisionId, Web, WebId, WebSettings,
};

// Storage
pub use storage::{Database, PoolConfig, SharedDatabase, WikiStore};

// =============================================================================
// Rendering Re-exports
// =============================================================================

pub use markup::{
    Chunk, IncludeSource, LinkResolver, MarkupEngine, RenderingResult, UrlGenerator, WebLookup,
    WikiMarkup,
};
pub use references::{ReferenceStore, ReferenceSynchronizer, SyncReport};
pub use render::{
    HtmlDiffer, PageRenderer, RenderContext, RenderingEngine, RevisionHistory, WordDiff,
};
