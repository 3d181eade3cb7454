//! Query-term highlighting over result content.
//!
//! The query is split on whitespace and tokens of two characters or fewer are
//! dropped. The rest are escaped and joined into one case-insensitive
//! alternation; every match in the content becomes a [`Segment::Match`].

use regex::{Regex, RegexBuilder};

/// Tokens this short are too noisy to highlight.
const MIN_TOKEN_CHARS: usize = 3;

/// A run of content, either untouched or matching a query term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Self::Plain(s) | Self::Match(s) => s,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match(_))
    }
}

/// Build the matcher for `query`, or `None` when no token survives filtering.
pub fn highlight_pattern(query: &str) -> Option<Regex> {
    let mut tokens: Vec<&str> = query
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .collect();
    if tokens.is_empty() {
        return None;
    }

    // Leftmost-first alternation: longer tokens go first so "cellular" is not
    // cut short by "cell". Ties sort by text so repeats end up adjacent.
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    tokens.dedup();

    let alternation = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");

    match RegexBuilder::new(&alternation).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!(error = %e, "highlight pattern rejected, leaving content plain");
            None
        }
    }
}

/// Split `content` into plain and matching segments for `query`.
pub fn highlight<'a>(content: &'a str, query: &str) -> Vec<Segment<'a>> {
    if content.is_empty() {
        return Vec::new();
    }
    let Some(re) = highlight_pattern(query) else {
        return vec![Segment::Plain(content)];
    };

    let mut segments = Vec::new();
    let mut last = 0;
    for m in re.find_iter(content) {
        if m.start() > last {
            segments.push(Segment::Plain(&content[last..m.start()]));
        }
        segments.push(Segment::Match(m.as_str()));
        last = m.end();
    }
    if last < content.len() {
        segments.push(Segment::Plain(&content[last..]));
    }
    segments
}

/// Wrap every match in `open`/`close` markers, leaving the rest untouched.
pub fn render_highlight(content: &str, query: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for segment in highlight(content, query) {
        match segment {
            Segment::Plain(text) => out.push_str(text),
            Segment::Match(text) => {
                out.push_str(open);
                out.push_str(text);
                out.push_str(close);
            }
        }
    }
    out
}
