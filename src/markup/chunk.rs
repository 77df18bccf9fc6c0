//! Chunk Model
//!
//! Typed spans recognized while rendering markup. Each chunk records whether
//! the author escaped it; escaped chunks render as literal text and take no
//! part in reference extraction.

use serde::{Deserialize, Serialize};

/// What a wiki link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Another wiki page
    #[default]
    Page,
    /// An uploaded file (`[[report.pdf:file]]`)
    File,
    /// An uploaded picture (`[[photo.jpg:pic]]`)
    Picture,
}

impl LinkKind {
    /// Parse the suffix after the last `:` of a bracketed link
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "file" => Some(LinkKind::File),
            "pic" => Some(LinkKind::Picture),
            _ => None,
        }
    }
}

/// A link to a page, file or picture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiLink {
    pub page_name: String,
    pub link_text: String,
    pub kind: LinkKind,
    pub escaped: bool,
    /// Written as `[[...]]` rather than a bare CamelCase word
    pub bracketed: bool,
}

/// An inclusion of another page's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    pub page_name: String,
    pub escaped: bool,
}

/// A category declaration; one line may declare several names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub names: Vec<String>,
    pub escaped: bool,
}

/// Chunks that name another page: every link kind and inclusions
pub trait WikiReference {
    fn page_name(&self) -> &str;
    fn is_escaped(&self) -> bool;
}

impl WikiReference for WikiLink {
    fn page_name(&self) -> &str {
        &self.page_name
    }

    fn is_escaped(&self) -> bool {
        self.escaped
    }
}

impl WikiReference for Include {
    fn page_name(&self) -> &str {
        &self.page_name
    }

    fn is_escaped(&self) -> bool {
        self.escaped
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chunk {
    WikiLink(WikiLink),
    Include(Include),
    Category(Category),
}

impl Chunk {
    pub fn is_escaped(&self) -> bool {
        match self {
            Chunk::WikiLink(link) => link.escaped,
            Chunk::Include(include) => include.escaped,
            Chunk::Category(category) => category.escaped,
        }
    }

    pub fn as_wiki_link(&self) -> Option<&WikiLink> {
        match self {
            Chunk::WikiLink(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_include(&self) -> Option<&Include> {
        match self {
            Chunk::Include(include) => Some(include),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<&Category> {
        match self {
            Chunk::Category(category) => Some(category),
            _ => None,
        }
    }

    /// View this chunk as a page reference, if it names a page
    pub fn as_wiki_reference(&self) -> Option<&dyn WikiReference> {
        match self {
            Chunk::WikiLink(link) => Some(link),
            Chunk::Include(include) => Some(include),
            Chunk::Category(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(name: &str, kind: LinkKind, escaped: bool) -> Chunk {
        Chunk::WikiLink(WikiLink {
            page_name: name.to_string(),
            link_text: name.to_string(),
            kind,
            escaped,
            bracketed: true,
        })
    }

    #[test]
    fn test_link_kind_from_suffix() {
        assert_eq!(LinkKind::from_suffix("file"), Some(LinkKind::File));
        assert_eq!(LinkKind::from_suffix("pic"), Some(LinkKind::Picture));
        assert_eq!(LinkKind::from_suffix("page"), None);
    }

    #[test]
    fn test_wiki_reference_view() {
        let include = Chunk::Include(Include {
            page_name: "Header".to_string(),
            escaped: false,
        });
        let category = Chunk::Category(Category {
            names: vec!["draft".to_string()],
            escaped: false,
        });

        assert_eq!(
            include.as_wiki_reference().map(|r| r.page_name()),
            Some("Header")
        );
        assert!(category.as_wiki_reference().is_none());
        assert_eq!(
            link("pic.jpg", LinkKind::Picture, true)
                .as_wiki_reference()
                .map(|r| r.is_escaped()),
            Some(true)
        );
    }

    #[test]
    fn test_chunk_serializes_with_type_tag() {
        let json = serde_json::to_value(link("HomePage", LinkKind::Page, false)).unwrap();
        assert_eq!(json["type"], "wiki_link");
        assert_eq!(json["kind"], "page");
    }
}
