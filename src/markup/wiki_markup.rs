//! Bundled wiki grammar.
//!
//! Blocks are separated by blank lines. A line of the form
//! `category: a, b` is a block of its own. Inside paragraphs the grammar
//! recognizes:
//!
//! - `[[Target]]`, `[[Target|text]]`: page links
//! - `[[name.ext:file]]`, `[[name.ext:pic]]`: file and picture links
//! - `[[!include Target]]`: inclusion of another page
//! - bare CamelCase words, unless the web is brackets-only
//!
//! A leading backslash escapes any construct. The chunk is still recorded,
//! flagged as escaped, and the construct renders literally.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::{
    Category, Chunk, Include, LinkContext, LinkKind, LinkResolver, MarkupEngine, RenderOptions,
    RenderSource, RenderingResult, WikiLink, escape_html,
};
use crate::types::{Result, Web};

static INLINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<esc>\\)?(?:\[\[(?P<inner>[^\[\]\n]+)\]\]|(?P<word>\b[A-Z][a-z0-9]+(?:[A-Z][a-z0-9]+)+\b))",
    )
    .unwrap()
});

static CATEGORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?P<esc>\\)?(?P<decl>category\s*:\s*(?P<names>.*?))\s*$").unwrap()
});

static INCLUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!include\s+(?P<target>.+)$").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct WikiMarkup;

impl MarkupEngine for WikiMarkup {
    fn render(
        &self,
        source: &RenderSource<'_>,
        resolver: &dyn LinkResolver,
        options: &RenderOptions<'_>,
    ) -> Result<RenderingResult> {
        let pass = Pass {
            web: source.web,
            resolver,
            options,
        };

        let mut chunks = Vec::new();
        let mut stack = vec![source.page.name.clone()];
        let html = pass.render_document(&source.revision.content, &mut stack, &mut chunks)?;

        tracing::debug!(
            page = %source.page.name,
            revision = source.revision.number,
            mode = %options.mode,
            chunks = chunks.len(),
            "Rendered revision"
        );

        Ok(RenderingResult::new(
            html,
            chunks,
            options.mode,
            source.revision.id,
        ))
    }
}

// =============================================================================
// Block Structure
// =============================================================================

enum Block<'t> {
    Paragraph(String),
    Category {
        escaped: bool,
        decl: &'t str,
        names: Vec<String>,
    },
}

fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut lines, &mut blocks);
            continue;
        }

        if let Some(caps) = CATEGORY_PATTERN.captures(line) {
            let names: Vec<String> = caps
                .name("names")
                .map(|m| m.as_str())
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();

            if !names.is_empty()
                && let Some(decl) = caps.name("decl")
            {
                flush_paragraph(&mut lines, &mut blocks);
                blocks.push(Block::Category {
                    escaped: caps.name("esc").is_some(),
                    decl: decl.as_str(),
                    names,
                });
                continue;
            }
        }

        lines.push(line);
    }
    flush_paragraph(&mut lines, &mut blocks);

    blocks
}

fn flush_paragraph(lines: &mut Vec<&str>, blocks: &mut Vec<Block<'_>>) {
    if !lines.is_empty() {
        blocks.push(Block::Paragraph(lines.join("\n")));
        lines.clear();
    }
}

// =============================================================================
// Rendering Pass
// =============================================================================

/// One rendering of a revision. `stack` holds the page being rendered and
/// every page included on the way to the current position.
struct Pass<'a> {
    web: &'a Web,
    resolver: &'a dyn LinkResolver,
    options: &'a RenderOptions<'a>,
}

impl Pass<'_> {
    fn render_document(
        &self,
        text: &str,
        stack: &mut Vec<String>,
        chunks: &mut Vec<Chunk>,
    ) -> Result<String> {
        let mut rendered = Vec::new();

        for block in split_blocks(text) {
            let html = match block {
                Block::Paragraph(text) => self.render_paragraph(&text, stack, chunks)?,
                Block::Category {
                    escaped: true,
                    decl,
                    names,
                } => {
                    chunks.push(Chunk::Category(Category {
                        names,
                        escaped: true,
                    }));
                    format!("<p>{}</p>", escape_html(decl))
                }
                Block::Category {
                    escaped: false,
                    names,
                    ..
                } => {
                    let links: Vec<String> = names
                        .iter()
                        .map(|name| self.resolver.category_link(self.web, name, self.options.mode))
                        .collect();
                    chunks.push(Chunk::Category(Category {
                        names,
                        escaped: false,
                    }));
                    format!(
                        r#"<div class="property">category: {}</div>"#,
                        links.join(", ")
                    )
                }
            };
            rendered.push(html);
        }

        Ok(rendered.join("\n"))
    }

    fn render_paragraph(
        &self,
        text: &str,
        stack: &mut Vec<String>,
        chunks: &mut Vec<Chunk>,
    ) -> Result<String> {
        let inclusions = inclusions(text);
        if inclusions.is_empty() {
            return Ok(format!("<p>{}</p>", self.render_inline(text, stack, chunks)?));
        }

        // Inclusions are blocks: the paragraph is split around each of them
        let mut parts = Vec::new();
        let mut last = 0;
        for (range, target) in inclusions {
            self.push_segment(&text[last..range.start], &mut parts, stack, chunks)?;
            chunks.push(Chunk::Include(Include {
                page_name: target.to_string(),
                escaped: false,
            }));
            parts.push(self.render_include(target, stack)?);
            last = range.end;
        }
        self.push_segment(&text[last..], &mut parts, stack, chunks)?;

        Ok(parts.join("\n"))
    }

    fn push_segment(
        &self,
        segment: &str,
        parts: &mut Vec<String>,
        stack: &mut Vec<String>,
        chunks: &mut Vec<Chunk>,
    ) -> Result<()> {
        let segment = segment.trim();
        if !segment.is_empty() {
            parts.push(format!("<p>{}</p>", self.render_inline(segment, stack, chunks)?));
        }
        Ok(())
    }

    fn render_inline(
        &self,
        text: &str,
        stack: &mut Vec<String>,
        chunks: &mut Vec<Chunk>,
    ) -> Result<String> {
        let mut html = String::with_capacity(text.len());
        let mut last = 0;

        for caps in INLINE_PATTERN.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            html.push_str(&escape_html(&text[last..whole.start()]));
            last = whole.end();

            let escaped = caps.name("esc").is_some();
            if let Some(inner) = caps.name("inner") {
                html.push_str(&self.render_bracket(inner.as_str(), escaped, stack, chunks)?);
            } else if let Some(word) = caps.name("word") {
                html.push_str(&self.render_word(whole.as_str(), word.as_str(), escaped, stack, chunks));
            }
        }

        html.push_str(&escape_html(&text[last..]));
        Ok(html)
    }

    fn render_word(
        &self,
        raw: &str,
        word: &str,
        escaped: bool,
        stack: &[String],
        chunks: &mut Vec<Chunk>,
    ) -> String {
        if self.web.settings.brackets_only {
            return escape_html(raw);
        }
        // A page mentioning its own name in running text is not linking
        if stack.last().is_some_and(|current| current == word) {
            return escape_html(word);
        }

        chunks.push(Chunk::WikiLink(WikiLink {
            page_name: word.to_string(),
            link_text: word.to_string(),
            kind: LinkKind::Page,
            escaped,
            bracketed: false,
        }));

        if escaped {
            escape_html(word)
        } else {
            self.resolver.make_link(
                self.web,
                word,
                word,
                LinkContext::new(self.options.mode, LinkKind::Page),
            )
        }
    }

    fn render_bracket(
        &self,
        inner: &str,
        escaped: bool,
        stack: &mut Vec<String>,
        chunks: &mut Vec<Chunk>,
    ) -> Result<String> {
        let literal = escape_html(&format!("[[{}]]", inner));

        if let Some(caps) = INCLUDE_PATTERN.captures(inner.trim()) {
            let target = caps.name("target").map(|m| m.as_str().trim()).unwrap_or_default();
            if target.is_empty() {
                return Ok(literal);
            }
            chunks.push(Chunk::Include(Include {
                page_name: target.to_string(),
                escaped,
            }));
            if escaped {
                return Ok(literal);
            }
            return self.render_include(target, stack);
        }

        let (target, text) = match inner.split_once('|') {
            Some((target, text)) => (target.trim(), Some(text.trim())),
            None => (inner.trim(), None),
        };
        let (name, kind) = target
            .rsplit_once(':')
            .and_then(|(name, suffix)| {
                LinkKind::from_suffix(suffix.trim()).map(|kind| (name.trim(), kind))
            })
            .unwrap_or((target, LinkKind::Page));

        if name.is_empty() {
            return Ok(literal);
        }
        let link_text = text.filter(|t| !t.is_empty()).unwrap_or(name);

        chunks.push(Chunk::WikiLink(WikiLink {
            page_name: name.to_string(),
            link_text: link_text.to_string(),
            kind,
            escaped,
            bracketed: true,
        }));

        if escaped {
            return Ok(literal);
        }
        Ok(self.resolver.make_link(
            self.web,
            name,
            link_text,
            LinkContext::new(self.options.mode, kind),
        ))
    }

    fn render_include(&self, target: &str, stack: &mut Vec<String>) -> Result<String> {
        if stack.iter().any(|name| name == target) {
            return Ok(notice(&format!("Recursive include of {} ignored", target)));
        }
        if stack.len() > self.options.max_include_depth {
            return Ok(notice(&format!(
                "Include of {} skipped: nesting deeper than {}",
                target, self.options.max_include_depth
            )));
        }
        let Some(source) = self.options.includes else {
            return Ok(notice(&format!("Could not include {}", target)));
        };
        let Some(content) = source.included_content(self.web, target)? else {
            return Ok(notice(&format!(
                "Could not include {}: page does not exist",
                target
            )));
        };

        tracing::debug!(page = %target, depth = stack.len(), "Including page");

        // Included pages contribute HTML only, never chunks
        let mut discarded = Vec::new();
        stack.push(target.to_string());
        let rendered = self.render_document(&content, stack, &mut discarded);
        stack.pop();

        Ok(format!(r#"<div class="include">{}</div>"#, rendered?))
    }
}

/// Unescaped `[[!include X]]` spans of a paragraph with their targets
fn inclusions(text: &str) -> Vec<(Range<usize>, &str)> {
    INLINE_PATTERN
        .captures_iter(text)
        .filter(|caps| caps.name("esc").is_none())
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.name("inner")?.as_str();
            let target = INCLUDE_PATTERN
                .captures(inner.trim())?
                .name("target")?
                .as_str()
                .trim();
            (!target.is_empty()).then_some((whole.range(), target))
        })
        .collect()
}

fn notice(message: &str) -> String {
    format!(r#"<span class="includeNotice">{}</span>"#, escape_html(message))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::markup::{IncludeSource, PageIndex, UrlGenerator};
    use crate::test_support;
    use crate::types::RenderMode;

    struct Pages(HashMap<&'static str, &'static str>);

    impl IncludeSource for Pages {
        fn included_content(&self, _web: &Web, page_name: &str) -> Result<Option<String>> {
            Ok(self.0.get(page_name).map(|c| c.to_string()))
        }
    }

    fn render_with(
        web: &Web,
        page_name: &str,
        content: &str,
        mode: RenderMode,
        includes: Option<&dyn IncludeSource>,
    ) -> RenderingResult {
        let page = test_support::page(1, web, page_name);
        let revision = test_support::revision(1, &page, 1, content);
        let index: PageIndex = [(web.id, "HomePage"), (web.id, "Footer")]
            .into_iter()
            .collect();
        let urls = UrlGenerator::new("", index);
        let options = RenderOptions {
            mode,
            includes,
            max_include_depth: 3,
        };
        WikiMarkup
            .render(&RenderSource::new(web, &page, &revision), &urls, &options)
            .unwrap()
    }

    fn render(content: &str) -> RenderingResult {
        render_with(
            &test_support::web(1, "wiki"),
            "HomePage",
            content,
            RenderMode::Display,
            None,
        )
    }

    #[test]
    fn test_mixed_links_and_escapes() {
        let result = render(r"HomePage [[SomePage]] \[[EscapedPage]] [[pic.jpg:pic]]");

        let links: Vec<(&str, LinkKind, bool)> = result
            .wiki_links()
            .map(|l| (l.page_name.as_str(), l.kind, l.escaped))
            .collect();
        assert_eq!(
            links,
            vec![
                ("SomePage", LinkKind::Page, false),
                ("EscapedPage", LinkKind::Page, true),
                ("pic.jpg", LinkKind::Picture, false),
            ]
        );
        assert!(result.html().starts_with("<p>HomePage "));
        assert!(result.html().contains(r#"<span class="newWikiWord">SomePage"#));
        assert!(result.html().contains("[[EscapedPage]]"));
        assert!(!result.html().contains(r"\[["));
        assert!(result.html().contains(r#"<img alt="pic.jpg" src="/wiki/file/pic.jpg" />"#));
    }

    #[test]
    fn test_camel_case_words() {
        let result = render("See HomePage, SandBox and NASA or iPhone. \\EscapedWord");
        let names: Vec<&str> = result.wiki_links().map(|l| l.page_name.as_str()).collect();
        // HomePage is the page's own name
        assert_eq!(names, vec!["SandBox", "EscapedWord"]);
        assert!(result.wiki_links().all(|l| !l.bracketed));
        assert!(result.html().contains("EscapedWord</p>"));
    }

    #[test]
    fn test_brackets_only_web_ignores_camel_case() {
        let mut web = test_support::web(1, "wiki");
        web.settings.brackets_only = true;
        let result = render_with(&web, "Start", "SandBox [[SandBox]]", RenderMode::Display, None);

        assert_eq!(result.wiki_links().count(), 1);
        assert!(result.html().starts_with("<p>SandBox <span"));
    }

    #[test]
    fn test_bracketed_self_link_is_a_chunk() {
        let result = render("[[HomePage|home]]");
        let link = result.wiki_links().next().unwrap();
        assert_eq!(link.page_name, "HomePage");
        assert_eq!(link.link_text, "home");
        assert_eq!(
            result.html(),
            r#"<p><a class="existingWikiWord" href="/wiki/show/HomePage">home</a></p>"#
        );
    }

    #[test]
    fn test_file_link_with_text() {
        let result = render("[[report.pdf:file|Q3 report]] and [[odd:name]]");
        let links: Vec<(&str, LinkKind)> = result
            .wiki_links()
            .map(|l| (l.page_name.as_str(), l.kind))
            .collect();
        assert_eq!(
            links,
            vec![("report.pdf", LinkKind::File), ("odd:name", LinkKind::Page)]
        );
        assert!(result.html().contains(">Q3 report</a>"));
    }

    #[test]
    fn test_paragraphs_and_html_escaping() {
        let result = render("one <b>\nline two\n\n\n<script>x</script>");
        assert_eq!(
            result.html(),
            "<p>one &lt;b&gt;\nline two</p>\n<p>&lt;script&gt;x&lt;/script&gt;</p>"
        );
        assert!(result.chunks().is_empty());
    }

    #[test]
    fn test_categories() {
        let result = render("Intro\ncategory: draft, , Howto\n\\category: hidden");
        let categories: Vec<(Vec<String>, bool)> = result
            .categories()
            .map(|c| (c.names.clone(), c.escaped))
            .collect();
        assert_eq!(
            categories,
            vec![
                (vec!["draft".to_string(), "Howto".to_string()], false),
                (vec!["hidden".to_string()], true),
            ]
        );
        assert_eq!(
            result.html(),
            concat!(
                "<p>Intro</p>\n",
                r#"<div class="property">category: <a class="category_link" href="/wiki/list/draft">draft</a>, "#,
                r#"<a class="category_link" href="/wiki/list/Howto">Howto</a></div>"#,
                "\n<p>category: hidden</p>"
            )
        );
    }

    #[test]
    fn test_include_renders_content_without_chunks() {
        let pages = Pages(HashMap::from([("Footer", "Written by SomeOne")]));
        let web = test_support::web(1, "wiki");
        let result = render_with(
            &web,
            "HomePage",
            "[[!include Footer]]\n\nText [[!include Footer]]",
            RenderMode::Display,
            Some(&pages),
        );

        let includes: Vec<&str> = result.includes().map(|i| i.page_name.as_str()).collect();
        assert_eq!(includes, vec!["Footer", "Footer"]);
        assert_eq!(result.wiki_links().count(), 0);
        assert!(result.html().starts_with(r#"<div class="include"><p>Written by <span"#));
        assert!(result.html().contains("<p>Text</p>\n<div class=\"include\">"));
        assert!(!result.html().contains("<p>Text <div"));
    }

    #[test]
    fn test_inline_include_splits_paragraph() {
        let pages = Pages(HashMap::from([("Footer", "footer")]));
        let web = test_support::web(1, "wiki");
        let result = render_with(
            &web,
            "HomePage",
            "Before SomePage [[!include Footer]] after \\[[!include Footer]]",
            RenderMode::Export,
            Some(&pages),
        );

        assert_eq!(
            result.html(),
            concat!(
                r#"<p>Before <span class="newWikiWord">SomePage</span></p>"#,
                "\n",
                r#"<div class="include"><p>footer</p></div>"#,
                "\n<p>after [[!include Footer]]</p>"
            )
        );
        let includes: Vec<(&str, bool)> = result
            .includes()
            .map(|i| (i.page_name.as_str(), i.escaped))
            .collect();
        assert_eq!(includes, vec![("Footer", false), ("Footer", true)]);
        assert_eq!(result.wiki_links().count(), 1);
    }

    #[test]
    fn test_include_notices() {
        let pages = Pages(HashMap::from([
            ("Loop", "[[!include HomePage]]"),
            ("A", "[[!include B]]"),
            ("B", "[[!include C]]"),
            ("C", "[[!include D]]"),
            ("D", "deep"),
        ]));
        let web = test_support::web(1, "wiki");
        let render_include = |content: &str, includes: Option<&dyn IncludeSource>| {
            render_with(&web, "HomePage", content, RenderMode::Display, includes)
                .into_html()
        };

        assert!(render_include("[[!include HomePage]]", Some(&pages)).contains("Recursive include"));
        assert!(render_include("[[!include Loop]]", Some(&pages)).contains("Recursive include"));
        assert!(render_include("[[!include Nope]]", Some(&pages)).contains("page does not exist"));
        assert!(render_include("[[!include Footer]]", None).contains("Could not include Footer"));

        let deep = render_include("[[!include A]]", Some(&pages));
        assert!(deep.contains("nesting deeper than 3"));
        assert!(!deep.contains("deep</p>"));
    }

    #[test]
    fn test_escaped_include_is_literal() {
        let result = render(r"\[[!include Footer]]");
        let include = result.includes().next().unwrap();
        assert!(include.escaped);
        assert_eq!(result.html(), "<p>[[!include Footer]]</p>");
    }

    #[test]
    fn test_export_mode_links() {
        let web = test_support::web(1, "wiki");
        let result = render_with(&web, "Start", "HomePage", RenderMode::Export, None);
        assert_eq!(result.mode(), RenderMode::Export);
        assert_eq!(
            result.html(),
            r#"<p><a class="existingWikiWord" href="HomePage.html">HomePage</a></p>"#
        );
    }
}
