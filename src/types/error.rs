//! Unified Error Type System
//!
//! Centralized error type for the whole crate.
//!
//! ## Error Classes
//!
//! - **Configuration**: programmer or operator mistakes (missing link resolver,
//!   invalid config values). Never retried.
//! - **Storage**: SQLite and pool failures. A failed reference
//!   synchronization is reported as [`WikiError::Synchronization`] and can be
//!   retried as a whole.
//! - **Lookup**: a named web, page or revision does not exist.
//!
//! Extraction outcomes (escaped chunks, links to missing pages) are data, not
//! errors, and never appear here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WikiError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    /// Rendering was attempted without a link resolver in the context.
    #[error("Render context has no link resolver configured")]
    MissingLinkResolver,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not initialized: run 'wikiloom init' first")]
    NotInitialized,

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    /// The reference graph of a page could not be replaced. Nothing was
    /// committed; the whole synchronization may be retried.
    #[error("Reference synchronization failed for page '{page}': {message}")]
    Synchronization { page: String, message: String },
}

pub type Result<T> = std::result::Result<T, WikiError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl WikiError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    pub fn synchronization(page: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Synchronization {
            page: page.into(),
            message: message.into(),
        }
    }

    /// Check if the failed operation can be retried unchanged
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Synchronization { .. } | Self::Storage(_) => true,
            Self::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }

    /// Check if this error signals a programming or configuration mistake
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingLinkResolver | Self::Config(_) | Self::NotInitialized
        )
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| WikiError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| WikiError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
