pub mod error;
pub mod reference;
pub mod utils;
pub mod web;

pub use error::{Result, ResultExt, WikiError};
pub use reference::{LinkType, NewReference, Reference};
pub use utils::{ParseWithDefault, log_filter_error};
pub use web::{Page, Revision, Web, WebSettings};

// =============================================================================
// Domain Newtypes
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl rusqlite::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.0))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                <i64 as rusqlite::types::FromSql>::column_result(value).map(Self)
            }
        }
    };
}

row_id!(
    /// Row id of a web
    WebId
);
row_id!(
    /// Row id of a page
    PageId
);
row_id!(
    /// Row id of a revision
    RevisionId
);

/// Output shape requested from the rendering engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Interactive HTML; links to missing pages offer a "create" affordance
    #[default]
    Display,
    /// Static self-contained HTML
    Export,
    /// Public read-only HTML
    Publish,
}

impl RenderMode {
    /// Export output depends on the latest state of included pages and is
    /// never memoized.
    pub fn is_cacheable(self) -> bool {
        !matches!(self, RenderMode::Export)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Display => write!(f, "display"),
            RenderMode::Export => write!(f, "export"),
            RenderMode::Publish => write!(f, "publish"),
        }
    }
}

impl std::str::FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        <RenderMode as ParseWithDefault>::try_parse(s).ok_or_else(|| {
            format!(
                "Unknown render mode: {}. Valid values: display, export, publish",
                s
            )
        })
    }
}
