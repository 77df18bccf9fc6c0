//! Name extraction from a rendering result.
//!
//! Escaped chunks never contribute a name. Every list is deduplicated and
//! keeps the order in which names first appear.

use std::collections::HashSet;

use crate::markup::{LinkKind, RenderingResult, WebLookup};
use crate::types::{Result, Web};

/// Page names linked from the result; file and picture links excluded
pub fn wiki_words(result: &RenderingResult) -> Vec<String> {
    unique(
        result
            .wiki_links()
            .filter(|link| !link.escaped && link.kind == LinkKind::Page)
            .map(|link| link.page_name.as_str()),
    )
}

pub fn wiki_includes(result: &RenderingResult) -> Vec<String> {
    unique(
        result
            .includes()
            .filter(|include| !include.escaped)
            .map(|include| include.page_name.as_str()),
    )
}

/// Names of every link kind and inclusion
pub fn wiki_references(result: &RenderingResult) -> Vec<String> {
    unique(
        result
            .wiki_references()
            .filter(|reference| !reference.is_escaped())
            .map(|reference| reference.page_name()),
    )
}

/// Category names across all category declarations
pub fn categories(result: &RenderingResult) -> Vec<String> {
    unique(
        result
            .categories()
            .filter(|category| !category.escaped)
            .flat_map(|category| category.names.iter().map(String::as_str)),
    )
}

/// Names among `words` that resolve to a page of `web`
pub fn existing_pages(words: &[String], web: &Web, lookup: &dyn WebLookup) -> Result<Vec<String>> {
    let mut existing = Vec::new();
    for word in words {
        if lookup.page_exists(web, word)? {
            existing.push(word.clone());
        }
    }
    Ok(existing)
}

/// `words` minus [`existing_pages`]
pub fn unexisting_pages(
    words: &[String],
    web: &Web,
    lookup: &dyn WebLookup,
) -> Result<Vec<String>> {
    let existing: HashSet<String> = existing_pages(words, web, lookup)?.into_iter().collect();
    Ok(words
        .iter()
        .filter(|word| !existing.contains(*word))
        .cloned()
        .collect())
}

fn unique<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .filter(|name| seen.insert(*name))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::markup::{Category, Chunk, Include, WikiLink};
    use crate::test_support;
    use crate::types::{Page, RenderMode, RevisionId};

    struct Existing(Vec<&'static str>);

    impl WebLookup for Existing {
        fn page(&self, web: &Web, name: &str) -> Result<Option<Page>> {
            Ok(self
                .0
                .contains(&name)
                .then(|| test_support::page(1, web, name)))
        }
    }

    fn link(name: &str, kind: LinkKind, escaped: bool) -> Chunk {
        Chunk::WikiLink(WikiLink {
            page_name: name.to_string(),
            link_text: name.to_string(),
            kind,
            escaped,
            bracketed: true,
        })
    }

    fn include(name: &str, escaped: bool) -> Chunk {
        Chunk::Include(Include {
            page_name: name.to_string(),
            escaped,
        })
    }

    fn category(names: &[&str], escaped: bool) -> Chunk {
        Chunk::Category(Category {
            names: names.iter().map(|n| n.to_string()).collect(),
            escaped,
        })
    }

    fn result(chunks: Vec<Chunk>) -> RenderingResult {
        RenderingResult::new("", chunks, RenderMode::Display, RevisionId::new(1))
    }

    fn sample() -> RenderingResult {
        result(vec![
            link("SomePage", LinkKind::Page, false),
            link("EscapedPage", LinkKind::Page, true),
            link("pic.jpg", LinkKind::Picture, false),
            link("OtherPage", LinkKind::Page, false),
            link("SomePage", LinkKind::Page, false),
            include("Footer", false),
            include("Hidden", true),
            include("Footer", false),
            category(&["draft", "howto"], false),
            category(&["secret"], true),
            category(&["howto", "faq"], false),
        ])
    }

    #[test]
    fn test_wiki_words_skip_escaped_files_and_duplicates() {
        assert_eq!(wiki_words(&sample()), vec!["SomePage", "OtherPage"]);
    }

    #[test]
    fn test_wiki_includes() {
        assert_eq!(wiki_includes(&sample()), vec!["Footer"]);
    }

    #[test]
    fn test_wiki_references_cover_all_link_kinds_and_includes() {
        assert_eq!(
            wiki_references(&sample()),
            vec!["SomePage", "pic.jpg", "OtherPage", "Footer"]
        );
    }

    #[test]
    fn test_categories_flattened() {
        assert_eq!(categories(&sample()), vec!["draft", "howto", "faq"]);
    }

    #[test]
    fn test_existing_and_unexisting_pages() {
        let web = test_support::web(1, "wiki");
        let lookup = Existing(vec!["OtherPage"]);
        let words = wiki_words(&sample());

        assert_eq!(
            existing_pages(&words, &web, &lookup).unwrap(),
            vec!["OtherPage"]
        );
        assert_eq!(
            unexisting_pages(&words, &web, &lookup).unwrap(),
            vec!["SomePage"]
        );
    }

    fn arb_chunk() -> impl Strategy<Value = Chunk> {
        let name = prop::sample::select(vec!["HomePage", "SomePage", "Footer", "pic.jpg"]);
        let kind = prop::sample::select(vec![LinkKind::Page, LinkKind::File, LinkKind::Picture]);
        prop_oneof![
            (name.clone(), kind, any::<bool>())
                .prop_map(|(name, kind, escaped)| link(name, kind, escaped)),
            (name, any::<bool>()).prop_map(|(name, escaped)| include(name, escaped)),
        ]
    }

    proptest! {
        #[test]
        fn prop_escaped_and_file_links_never_wiki_words(chunks in prop::collection::vec(arb_chunk(), 0..12)) {
            let result = result(chunks);
            let words = wiki_words(&result);
            let counted: HashSet<&str> = result
                .wiki_links()
                .filter(|l| !l.escaped && l.kind == LinkKind::Page)
                .map(|l| l.page_name.as_str())
                .collect();

            prop_assert_eq!(words.len(), counted.len());
            for word in &words {
                prop_assert!(counted.contains(word.as_str()));
            }
        }

        #[test]
        fn prop_existing_and_unexisting_partition_wiki_words(
            chunks in prop::collection::vec(arb_chunk(), 0..12),
            existing in prop::sample::subsequence(vec!["HomePage", "SomePage", "Footer"], 0..=3),
        ) {
            let web = test_support::web(1, "wiki");
            let lookup = Existing(existing);
            let words = wiki_words(&result(chunks));

            let found = existing_pages(&words, &web, &lookup).unwrap();
            let missing = unexisting_pages(&words, &web, &lookup).unwrap();

            prop_assert_eq!(found.len() + missing.len(), words.len());
            for word in &words {
                prop_assert!(found.contains(word) != missing.contains(word));
            }
        }
    }
}
