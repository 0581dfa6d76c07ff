// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Full-text keyword queries and highlighting parameters.
//!
//! ```text
//! q=pizza delivery
//! defType=edismax
//! qf=title_text^2 body_text
//! pf=title_text
//! mm=2
//! hl=on  hl.fl=title_text  hl.simple.pre=@@@hl@@@  hl.simple.post=@@@endhl@@@
//! ```

use crate::config::SessionConfig;
use crate::error::Result;
use crate::schema::{CompositeSetup, FieldDeclaration};

use super::params::RequestParams;

/// Keyword search options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordOptions {
    /// Restrict the search to these text fields (default: all text fields)
    pub fields: Vec<String>,
    /// Per-field boosts overriding declared boosts
    pub boost_fields: Vec<(String, f32)>,
    /// Text fields to boost when all terms appear as a phrase
    pub phrase_fields: Vec<(String, f32)>,
    /// Minimum number (or percentage) of terms that must match
    pub minimum_match: Option<String>,
    pub highlight: Option<HighlightOptions>,
}

impl KeywordOptions {
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn boost_field(mut self, field: impl Into<String>, boost: f32) -> Self {
        self.boost_fields.push((field.into(), boost));
        self
    }

    pub fn phrase_field(mut self, field: impl Into<String>, boost: f32) -> Self {
        self.phrase_fields.push((field.into(), boost));
        self
    }

    pub fn minimum_match(mut self, mm: impl Into<String>) -> Self {
        self.minimum_match = Some(mm.into());
        self
    }

    pub fn highlight(mut self, highlight: HighlightOptions) -> Self {
        self.highlight = Some(highlight);
        self
    }
}

/// Highlighting options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightOptions {
    /// Fields to highlight (default: the searched fields)
    pub fields: Vec<String>,
    pub max_snippets: Option<u32>,
    pub fragment_size: Option<u32>,
    pub merge_contiguous_fragments: bool,
}

/// A resolved keyword query
#[derive(Debug, Clone)]
pub(crate) struct Keywords {
    text: String,
    fields: Vec<(FieldDeclaration, Option<f32>)>,
    phrase_fields: Vec<(FieldDeclaration, f32)>,
    minimum_match: Option<String>,
    highlight: Option<(HighlightOptions, Vec<FieldDeclaration>)>,
}

impl Keywords {
    /// Resolve every named field before anything is sent.
    pub(crate) fn resolve(setup: &CompositeSetup, text: &str, options: KeywordOptions) -> Result<Self> {
        let declared: Vec<FieldDeclaration> = if options.fields.is_empty() {
            setup.all_text_fields()
        } else {
            options
                .fields
                .iter()
                .map(|name| setup.text_field(name))
                .collect::<Result<_>>()?
        };

        let mut fields: Vec<(FieldDeclaration, Option<f32>)> = declared
            .into_iter()
            .map(|f| {
                let boost = f.options().boost;
                (f, boost)
            })
            .collect();
        for (name, boost) in &options.boost_fields {
            let field = setup.text_field(name)?;
            match fields.iter_mut().find(|(f, _)| f.indexed_name() == field.indexed_name()) {
                Some(entry) => entry.1 = Some(*boost),
                None => fields.push((field, Some(*boost))),
            }
        }

        let phrase_fields = options
            .phrase_fields
            .iter()
            .map(|(name, boost)| Ok((setup.text_field(name)?, *boost)))
            .collect::<Result<Vec<_>>>()?;

        let highlight = match options.highlight {
            Some(hl) => {
                let hl_fields = if hl.fields.is_empty() {
                    Vec::new()
                } else {
                    hl.fields
                        .iter()
                        .map(|name| setup.text_field(name))
                        .collect::<Result<Vec<_>>>()?
                };
                Some((hl, hl_fields))
            }
            None => None,
        };

        Ok(Self {
            text: text.to_string(),
            fields,
            phrase_fields,
            minimum_match: options.minimum_match,
            highlight,
        })
    }

    pub(crate) fn append_params(&self, params: &mut RequestParams, config: &SessionConfig) {
        params.push("q", self.text.clone());
        params.push("defType", "edismax");
        if !self.fields.is_empty() {
            let qf = self
                .fields
                .iter()
                .map(|(f, boost)| boosted(f.indexed_name(), *boost))
                .collect::<Vec<_>>()
                .join(" ");
            params.push("qf", qf);
        }
        if !self.phrase_fields.is_empty() {
            let pf = self
                .phrase_fields
                .iter()
                .map(|(f, boost)| boosted(f.indexed_name(), Some(*boost)))
                .collect::<Vec<_>>()
                .join(" ");
            params.push("pf", pf);
        }
        if let Some(mm) = &self.minimum_match {
            params.push("mm", mm.clone());
        }
        if let Some((hl, hl_fields)) = &self.highlight {
            params.push("hl", "on");
            let names: Vec<&str> = if hl_fields.is_empty() {
                self.fields.iter().map(|(f, _)| f.indexed_name()).collect()
            } else {
                hl_fields.iter().map(|f| f.indexed_name()).collect()
            };
            params.push("hl.fl", names.join(" "));
            params.push("hl.simple.pre", config.highlight_pre.clone());
            params.push("hl.simple.post", config.highlight_post.clone());
            if let Some(n) = hl.max_snippets {
                params.push("hl.snippets", n.to_string());
            }
            if let Some(n) = hl.fragment_size {
                params.push("hl.fragsize", n.to_string());
            }
            if hl.merge_contiguous_fragments {
                params.push("hl.mergeContiguous", "true");
            }
        }
    }
}

fn boosted(name: &str, boost: Option<f32>) -> String {
    match boost {
        Some(b) => format!("{}^{}", name, b),
        None => name.to_string(),
    }
}
