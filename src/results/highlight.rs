// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

/// One highlighted snippet of a hit's text field.
///
/// Matched words are wrapped in the session's fixed marker pair on the wire;
/// [`Highlight::format`] swaps the markers for caller-supplied markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    field_name: String,
    raw: String,
    pre: String,
    post: String,
}

impl Highlight {
    pub fn new(
        field_name: impl Into<String>,
        raw: impl Into<String>,
        pre: impl Into<String>,
        post: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            raw: raw.into(),
            pre: pre.into(),
            post: post.into(),
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Snippet with every highlighted word passed through `wrap`.
    ///
    /// With an empty marker the snippet is returned as received.
    ///
    /// ```rust
    /// # use search_mapper::config::{HIGHLIGHT_POST, HIGHLIGHT_PRE};
    /// # use search_mapper::results::Highlight;
    /// let highlight = Highlight::new("body", "the @@@hl@@@pizza@@@endhl@@@ place", HIGHLIGHT_PRE, HIGHLIGHT_POST);
    /// assert_eq!(highlight.format(|w| format!("<em>{}</em>", w)), "the <em>pizza</em> place");
    /// ```
    pub fn format<F>(&self, mut wrap: F) -> String
    where
        F: FnMut(&str) -> String,
    {
        if self.pre.is_empty() || self.post.is_empty() {
            return self.raw.clone();
        }
        let mut out = String::with_capacity(self.raw.len());
        let mut rest = self.raw.as_str();
        while let Some(open) = rest.find(&self.pre) {
            let after_open = &rest[open + self.pre.len()..];
            match after_open.find(&self.post) {
                Some(close) => {
                    out.push_str(&rest[..open]);
                    out.push_str(&wrap(&after_open[..close]));
                    rest = &after_open[close + self.post.len()..];
                }
                None => break,
            }
        }
        out.push_str(rest);
        out
    }

    /// Snippet with markers stripped.
    pub fn plain(&self) -> String {
        self.format(str::to_string)
    }
}
