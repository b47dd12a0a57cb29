//! Presentation helpers layered over plain reply text: link detection,
//! anchor segmentation, and typewriter frames.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::RenderHint;

pub const TYPEWRITER_TICK: Duration = Duration::from_millis(16);

static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://[^\s<>]+|(?:^|[\s(\[])(/[A-Za-z0-9_\-./~%]+\.[A-Za-z0-9]{1,8})")
        .expect("valid link regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Url,
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSpan {
    pub start: usize,
    pub end: usize,
    pub href: String,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Link(String),
}

pub fn detect_links(text: &str) -> Vec<LinkSpan> {
    LINK_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let (matched, kind) = match caps.get(1) {
                Some(path) => (path, LinkKind::Path),
                None => (caps.get(0)?, LinkKind::Url),
            };
            let href = trim_trailing_punctuation(matched.as_str());
            if href.is_empty() {
                return None;
            }
            Some(LinkSpan {
                start: matched.start(),
                end: matched.start() + href.len(),
                href: href.to_string(),
                kind,
            })
        })
        .collect()
}

pub fn contains_link(text: &str) -> bool {
    !detect_links(text).is_empty()
}

/// Replies carrying links render at once so the anchors are clickable immediately.
pub fn render_hint(text: &str) -> RenderHint {
    if contains_link(text) {
        RenderHint::Instant
    } else {
        RenderHint::Typewriter
    }
}

pub fn segments(text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut cursor = 0;

    for link in detect_links(text) {
        if link.start > cursor {
            out.push(Segment::Text(text[cursor..link.start].to_string()));
        }
        out.push(Segment::Link(link.href));
        cursor = link.end;
    }

    if cursor < text.len() {
        out.push(Segment::Text(text[cursor..].to_string()));
    }

    out
}

/// Successive grapheme prefixes of `text`, one per typewriter tick.
pub fn typewriter_frames(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.grapheme_indices(true)
        .map(move |(idx, grapheme)| &text[..idx + grapheme.len()])
}

fn trim_trailing_punctuation(value: &str) -> &str {
    value.trim_end_matches(|ch: char| {
        matches!(ch, '.' | ',' | ';' | ':' | '!' | '?' | ')' | ']' | '\'' | '"')
    })
}
