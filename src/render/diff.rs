//! Word-level HTML diff.
//!
//! Both documents are split into tags, words, whitespace and punctuation.
//! The token streams are compared with the histogram algorithm and the new
//! document is re-emitted with changed runs marked up:
//!
//! | change      | markup                                                        |
//! |-------------|---------------------------------------------------------------|
//! | insertion   | `<ins class="diffins">`                                        |
//! | deletion    | `<del class="diffdel">`                                        |
//! | replacement | `<del class="diffmod">old</del><ins class="diffmod">new</ins>` |
//!
//! Tags inside inserted runs are kept; tags inside deleted runs are dropped so
//! the result stays well nested.

use std::ops::Range;
use std::sync::LazyLock;

use imara_diff::intern::InternedInput;
use imara_diff::intern::TokenSource;
use imara_diff::{Algorithm, diff};
use regex::Regex;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>|\s+|\w+|[^\w\s]").unwrap());

/// Computes a visual diff between two rendered HTML documents
pub trait HtmlDiffer: Send + Sync {
    fn diff(&self, old_html: &str, new_html: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WordDiff;

impl HtmlDiffer for WordDiff {
    fn diff(&self, old_html: &str, new_html: &str) -> String {
        let old = tokenize(old_html);
        let new = tokenize(new_html);

        let input = InternedInput::new(Tokens(&old), Tokens(&new));
        let mut out = String::with_capacity(new_html.len() + 64);
        let mut cursor = 0usize;
        let mut hunks = 0usize;

        diff(
            Algorithm::Histogram,
            &input,
            |before: Range<u32>, after: Range<u32>| {
                let before = before.start as usize..before.end as usize;
                let after = after.start as usize..after.end as usize;

                for token in &new[cursor..after.start] {
                    out.push_str(token);
                }

                let class = match (before.is_empty(), after.is_empty()) {
                    (false, false) => "diffmod",
                    (true, _) => "diffins",
                    (_, true) => "diffdel",
                };
                push_deleted(&mut out, &old[before], class);
                push_inserted(&mut out, &new[after.clone()], class);

                cursor = after.end;
                hunks += 1;
            },
        );

        for token in &new[cursor..] {
            out.push_str(token);
        }

        tracing::debug!(
            old_tokens = old.len(),
            new_tokens = new.len(),
            hunks,
            "Computed word diff"
        );
        out
    }
}

struct Tokens<'a>(&'a [&'a str]);

impl<'a> TokenSource for Tokens<'a> {
    type Token = &'a str;
    type Tokenizer = std::iter::Copied<std::slice::Iter<'a, &'a str>>;

    fn tokenize(&self) -> Self::Tokenizer {
        self.0.iter().copied()
    }

    fn estimate_tokens(&self) -> u32 {
        self.0.len() as u32
    }
}

fn tokenize(html: &str) -> Vec<&str> {
    TOKEN_PATTERN.find_iter(html).map(|m| m.as_str()).collect()
}

fn is_tag(token: &str) -> bool {
    token.starts_with('<') && token.ends_with('>') && token.len() > 1
}

fn push_deleted(out: &mut String, tokens: &[&str], class: &str) {
    let text: String = tokens.iter().filter(|t| !is_tag(t)).copied().collect();
    if !text.trim().is_empty() {
        out.push_str(&format!(r#"<del class="{}">{}</del>"#, class, text));
    }
}

fn push_inserted(out: &mut String, tokens: &[&str], class: &str) {
    let mut run = String::new();
    for token in tokens {
        if is_tag(token) {
            flush_insert(out, &mut run, class);
            out.push_str(token);
        } else {
            run.push_str(token);
        }
    }
    flush_insert(out, &mut run, class);
}

fn flush_insert(out: &mut String, run: &mut String, class: &str) {
    if run.is_empty() {
        return;
    }
    if run.trim().is_empty() {
        out.push_str(run);
    } else {
        out.push_str(&format!(r#"<ins class="{}">{}</ins>"#, class, run));
    }
    run.clear();
}
