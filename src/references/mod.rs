//! Reference graph: name extraction and persistence of a page's references.

pub mod extract;
pub mod synchronizer;

pub use extract::{
    categories, existing_pages, unexisting_pages, wiki_includes, wiki_references, wiki_words,
};
pub use synchronizer::{ReferenceCollection, ReferenceStore, ReferenceSynchronizer, SyncReport};
