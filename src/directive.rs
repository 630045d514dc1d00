//! Bake-time directives embedded in rendered HTML.
//!
//! Templates can hide content that should only be active in the baked site
//! inside a comment-style marker:
//!
//! ```text
//! /*enable-on-bake*<action>*/
//! ```
//!
//! The dynamic site leaves the marker inert (it usually sits inside a
//! `<script>` or `<style>` block, where it is a comment). During a bake every
//! marker is replaced by plain text.
//!
//! ## Replacement rule
//!
//! All markers in a document collapse to the action text of the *first*
//! marker in document order:
//!
//! ```text
//! /*enable-on-bake*A*/ ... /*enable-on-bake*B*/ ... /*enable-on-bake*A*/
//!                    ↓ bake ↓
//! A ... A ... A
//! ```
//!
//! A marker is not replaced by its own action (`B` does not stay `B`).
//!
//! The transform is textual. It never parses markup, and a marker spans a
//! single line with the action ending at the first `*/`.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

const MARKER_OPEN: &str = "/*enable-on-bake*";
const MARKER_CLOSE: &str = "*/";

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*enable-on-bake\*(?P<action>.+?)\*/").unwrap());

/// A whole-document text transform applied to each rendered page before it
/// is written.
pub trait HtmlTransform: Sync {
    /// Returns the input unchanged (borrowed) when nothing applies.
    fn apply<'a>(&self, html: &'a str) -> Cow<'a, str>;
}

/// Resolves `/*enable-on-bake*...*/` markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BakeDirectives;

impl HtmlTransform for BakeDirectives {
    fn apply<'a>(&self, html: &'a str) -> Cow<'a, str> {
        let actions = directive_actions(html);
        let Some(first) = actions.first().copied() else {
            return Cow::Borrowed(html);
        };

        let mut out = html.to_string();
        for action in distinct(&actions) {
            let marker = format!("{MARKER_OPEN}{action}{MARKER_CLOSE}");
            out = out.replace(&marker, first);
        }
        Cow::Owned(out)
    }
}

/// Action texts of every marker, in document order, duplicates included.
pub fn directive_actions(html: &str) -> Vec<&str> {
    DIRECTIVE_RE
        .captures_iter(html)
        .filter_map(|c| c.name("action"))
        .map(|m| m.as_str())
        .collect()
}

fn distinct<'a>(actions: &[&'a str]) -> Vec<&'a str> {
    let mut seen = Vec::with_capacity(actions.len());
    for action in actions {
        if !seen.contains(action) {
            seen.push(*action);
        }
    }
    seen
}
