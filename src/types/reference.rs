use serde::{Deserialize, Serialize};
use std::fmt;

use super::PageId;

/// Relationship between a page and a name it mentions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkType {
    /// Link to a page that exists (or to the page itself)
    LinkedPage,
    /// Link to a page that has not been written yet
    LinkedUnexistingPage,
    /// Inclusion of another page's content
    IncludedPage,
    /// Category tag
    Category,
}

impl LinkType {
    pub const ALL: [LinkType; 4] = [
        LinkType::LinkedPage,
        LinkType::LinkedUnexistingPage,
        LinkType::IncludedPage,
        LinkType::Category,
    ];

    /// Single-letter code stored in the `link_type` column
    pub fn code(self) -> &'static str {
        match self {
            LinkType::LinkedPage => "L",
            LinkType::LinkedUnexistingPage => "W",
            LinkType::IncludedPage => "I",
            LinkType::Category => "C",
        }
    }

    /// Classify a link target by existence
    pub fn for_link(exists: bool) -> Self {
        if exists {
            LinkType::LinkedPage
        } else {
            LinkType::LinkedUnexistingPage
        }
    }

    pub fn is_link(self) -> bool {
        matches!(self, LinkType::LinkedPage | LinkType::LinkedUnexistingPage)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::LinkedPage => write!(f, "linked"),
            LinkType::LinkedUnexistingPage => write!(f, "wanted"),
            LinkType::IncludedPage => write!(f, "included"),
            LinkType::Category => write!(f, "category"),
        }
    }
}

/// Persisted outgoing reference of a page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub page_id: PageId,
    pub referenced_name: String,
    pub link_type: LinkType,
}

/// Attributes of a reference staged for insertion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewReference {
    pub referenced_name: String,
    pub link_type: LinkType,
}

impl NewReference {
    pub fn new(referenced_name: impl Into<String>, link_type: LinkType) -> Self {
        Self {
            referenced_name: referenced_name.into(),
            link_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_link() {
        assert_eq!(LinkType::for_link(true), LinkType::LinkedPage);
        assert_eq!(LinkType::for_link(false), LinkType::LinkedUnexistingPage);
        assert!(LinkType::LinkedUnexistingPage.is_link());
        assert!(!LinkType::Category.is_link());
    }
}
