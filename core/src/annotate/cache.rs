use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::style::{DecorationStyle, StyleBuilder};
use crate::blame::BlameCommit;
use crate::config::AnnotationOptions;
use crate::error::Result;

/// Inclusive, 0-based line range.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn line(line: u32) -> Self {
        Self { start: line, end: line }
    }
}

/// One renderable overlay. The style is shared with every other decoration
/// of the same commit in a pass; only the range differs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Decoration {
    pub range: LineRange,
    pub style: Arc<DecorationStyle>,
}

/// Per-pass memo of decoration styles keyed by commit sha.
///
/// Lives for a single annotation pass and is dropped with it.
#[derive(Debug)]
pub struct DecorationCache {
    builder: StyleBuilder,
    styles: HashMap<String, Arc<DecorationStyle>>,
}

impl DecorationCache {
    pub fn new(options: &AnnotationOptions) -> Result<Self> {
        Ok(Self {
            builder: StyleBuilder::new(options)?,
            styles: HashMap::new(),
        })
    }

    /// Decoration for `line`, reusing the cached style when `sha` was seen
    /// earlier in the pass. An unresolved commit yields nothing.
    pub fn build_or_reuse(
        &mut self,
        sha: &str,
        commit: Option<&BlameCommit>,
        line: u32,
        now: u64,
    ) -> Option<Decoration> {
        let commit = commit?;
        let range = LineRange::line(line);

        if let Some(style) = self.styles.get(sha) {
            return Some(Decoration {
                range,
                style: Arc::clone(style),
            });
        }

        let style = Arc::new(self.builder.build(commit, now));
        self.styles.insert(sha.to_string(), Arc::clone(&style));
        Some(Decoration { range, style })
    }

    /// Number of distinct styles built so far.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
