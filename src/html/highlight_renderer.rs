//! Highlight rendering
//!
//! Produces display markup for a contract: the escaped document text with a
//! wrapper span around every highlight. Offsets are always resolved against
//! the raw document and each text segment is escaped on its own, so entity
//! expansion can never shift a highlight.
//!
//! Highlights are laid down from the highest start offset to the lowest.
//! With [`OverlapStrategy::Nest`] a highlight that starts earlier and runs
//! into one already placed is widened to wrap it whole, which keeps the
//! markup well-formed. [`OverlapStrategy::Segment`] instead splits the text
//! into maximal runs covered by the same set of highlights.

use std::str::FromStr;

use lol_html::{doc_text, element, rewrite_str, RewriteStrSettings};
use serde::{Deserialize, Serialize};

use crate::annotations::{is_hex_color, Highlight, HighlightCategory};
use crate::config::RenderConfig;
use crate::text::{char_slice, find_all};

/// Background used when neither the highlight nor its category has a usable color
pub const NEUTRAL_COLOR: &str = "#E0E0E0";

/// How overlapping highlights are laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapStrategy {
    /// Nested wrapper spans, widening partial overlaps
    #[default]
    Nest,
    /// One span per maximal run of identically-covered text
    Segment,
}

impl FromStr for OverlapStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nest" => Ok(OverlapStrategy::Nest),
            "segment" => Ok(OverlapStrategy::Segment),
            other => Err(format!("unknown overlap strategy: {}", other)),
        }
    }
}

/// What to do when a stored slice no longer matches the highlight text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorPolicy {
    /// Use stored offsets as they are
    #[default]
    Trust,
    /// Search for the text nearest the stored offset
    Relocate,
    /// Skip the highlight
    Invalidate,
}

impl FromStr for AnchorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trust" => Ok(AnchorPolicy::Trust),
            "relocate" => Ok(AnchorPolicy::Relocate),
            "invalidate" => Ok(AnchorPolicy::Invalidate),
            other => Err(format!("unknown anchor policy: {}", other)),
        }
    }
}

/// Configuration for highlight rendering
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub overlap: OverlapStrategy,
    pub anchor: AnchorPolicy,
    /// CSS class on every wrapper span
    pub class_name: String,
    /// Data attribute for the highlight ID
    pub id_attribute: String,
    /// Data attribute for the category ID
    pub category_attribute: String,
    pub fallback_color: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            overlap: OverlapStrategy::Nest,
            anchor: AnchorPolicy::Trust,
            class_name: "contract-highlight".to_string(),
            id_attribute: "data-highlight-id".to_string(),
            category_attribute: "data-category".to_string(),
            fallback_color: NEUTRAL_COLOR.to_string(),
        }
    }
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            overlap: config.overlap,
            anchor: config.anchor,
            fallback_color: config.fallback_color.clone(),
            ..Default::default()
        }
    }
}

/// Result of rendering
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    /// Escaped document with highlight spans
    pub html: String,
    /// Number of highlights placed
    pub rendered: usize,
    /// Highlights left out (bad offsets, or stale under the anchor policy)
    pub skipped: Vec<String>,
    /// Highlights placed at a different offset than stored
    pub relocated: Vec<String>,
}

/// Errors during markup rewriting
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("HTML rewrite failed: {0}")]
    RewriteError(String),
}

/// A highlight resolved to character offsets in the current document
struct Anchor<'a> {
    highlight: &'a Highlight,
    start: usize,
    end: usize,
}

/// Render with default options and no category metadata
pub fn render(document: &str, highlights: &[Highlight]) -> RenderOutput {
    render_with(document, highlights, &[], &RenderOptions::default())
}

/// Render `document` with `highlights` superimposed
///
/// Never fails: highlights that cannot be placed are reported in
/// [`RenderOutput::skipped`] and the rest of the document still renders.
pub fn render_with(
    document: &str,
    highlights: &[Highlight],
    categories: &[HighlightCategory],
    options: &RenderOptions,
) -> RenderOutput {
    // Byte position of every char boundary, including the end
    let bounds: Vec<usize> = document
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(document.len()))
        .collect();
    let len = bounds.len() - 1;

    let mut skipped = Vec::new();
    let mut relocated = Vec::new();
    let mut anchors = Vec::with_capacity(highlights.len());

    for highlight in highlights {
        match resolve_anchor(document, len, highlight, options.anchor) {
            Some(anchor) => {
                if anchor.start != highlight.start_index {
                    relocated.push(highlight.id.clone());
                }
                anchors.push(anchor);
            }
            None => {
                tracing::debug!(
                    id = %highlight.id,
                    start = highlight.start_index,
                    end = highlight.end_index,
                    len = len,
                    "Skipping highlight that cannot be placed"
                );
                skipped.push(highlight.id.clone());
            }
        }
    }

    let writer = SpanWriter {
        document,
        bounds: &bounds,
        categories,
        options,
    };
    let html = match options.overlap {
        OverlapStrategy::Nest => writer.nested(&anchors),
        OverlapStrategy::Segment => writer.segmented(&anchors),
    };

    RenderOutput {
        html,
        rendered: anchors.len(),
        skipped,
        relocated,
    }
}

/// Resolve where a highlight sits in the current document
fn resolve_anchor<'a>(
    document: &str,
    len: usize,
    highlight: &'a Highlight,
    policy: AnchorPolicy,
) -> Option<Anchor<'a>> {
    let (start, end) = (highlight.start_index, highlight.end_index);
    let in_bounds = start < end && end <= len;
    let matches = in_bounds && char_slice(document, start, end) == Some(highlight.text.as_str());

    match policy {
        AnchorPolicy::Trust if in_bounds => Some(Anchor { highlight, start, end }),
        AnchorPolicy::Trust => None,
        AnchorPolicy::Invalidate if matches => Some(Anchor { highlight, start, end }),
        AnchorPolicy::Invalidate => None,
        AnchorPolicy::Relocate if matches => Some(Anchor { highlight, start, end }),
        AnchorPolicy::Relocate => {
            let width = highlight.text.chars().count();
            find_all(document, &highlight.text)
                .into_iter()
                .min_by_key(|pos| pos.abs_diff(start))
                .map(|pos| Anchor {
                    highlight,
                    start: pos,
                    end: pos + width,
                })
        }
    }
}

struct SpanWriter<'a> {
    document: &'a str,
    bounds: &'a [usize],
    categories: &'a [HighlightCategory],
    options: &'a RenderOptions,
}

impl SpanWriter<'_> {
    /// Nested layout: descending placement with widening
    fn nested(&self, anchors: &[Anchor<'_>]) -> String {
        // Placement order: highest start first; at equal starts the shorter
        // one is placed first so the longer one wraps it
        let mut order: Vec<usize> = (0..anchors.len()).collect();
        order.sort_by(|&a, &b| {
            anchors[b]
                .start
                .cmp(&anchors[a].start)
                .then(anchors[a].end.cmp(&anchors[b].end))
        });

        // Effective end after wrapping everything already placed that this
        // highlight runs into. `placed` stays sorted by descending start.
        let mut eff_end = vec![0; anchors.len()];
        let mut rank = vec![0; anchors.len()];
        let mut placed: Vec<usize> = Vec::with_capacity(anchors.len());
        for (step, &i) in order.iter().enumerate() {
            let mut end = anchors[i].end;
            for &p in placed.iter().rev() {
                if anchors[p].start >= end {
                    break;
                }
                end = end.max(eff_end[p]);
            }
            eff_end[i] = end;
            rank[i] = step;
            placed.push(i);
        }

        // Emit outermost first: start ascending, wider first, later-placed first
        let mut opens: Vec<usize> = (0..anchors.len()).collect();
        opens.sort_by(|&a, &b| {
            anchors[a]
                .start
                .cmp(&anchors[b].start)
                .then(eff_end[b].cmp(&eff_end[a]))
                .then(rank[b].cmp(&rank[a]))
        });

        let mut html = String::with_capacity(self.document.len() + anchors.len() * 128);
        let mut cursor = 0;
        let mut stack: Vec<usize> = Vec::new();

        for &i in &opens {
            let start = anchors[i].start;
            while let Some(&top) = stack.last() {
                if eff_end[top] > start {
                    break;
                }
                self.push_text(&mut html, cursor, eff_end[top]);
                html.push_str("</span>");
                cursor = eff_end[top];
                stack.pop();
            }
            self.push_text(&mut html, cursor, start);
            self.push_open(&mut html, anchors[i].highlight, None);
            cursor = start;
            stack.push(i);
        }
        while let Some(top) = stack.pop() {
            self.push_text(&mut html, cursor, eff_end[top]);
            html.push_str("</span>");
            cursor = eff_end[top];
        }
        self.push_text(&mut html, cursor, self.bounds.len() - 1);

        html
    }

    /// Segmented layout: one span per run covered by the same highlights
    fn segmented(&self, anchors: &[Anchor<'_>]) -> String {
        let len = self.bounds.len() - 1;
        let mut points: Vec<usize> = anchors
            .iter()
            .flat_map(|a| [a.start, a.end])
            .chain([0, len])
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut html = String::with_capacity(self.document.len() + anchors.len() * 160);
        for pair in points.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let mut covering: Vec<&Anchor<'_>> = anchors
                .iter()
                .filter(|a| a.start <= from && a.end >= to)
                .collect();

            if covering.is_empty() {
                self.push_text(&mut html, from, to);
                continue;
            }

            // Innermost (latest start, then shortest) decides the look
            covering.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
            let ids: Vec<&str> = covering.iter().map(|a| a.highlight.id.as_str()).collect();
            let innermost = covering[covering.len() - 1].highlight;

            self.push_open(&mut html, innermost, Some(&ids));
            self.push_text(&mut html, from, to);
            html.push_str("</span>");
        }

        html
    }

    /// Append the escaped document text between two char offsets
    fn push_text(&self, html: &mut String, from: usize, to: usize) {
        if from < to {
            let text = &self.document[self.bounds[from]..self.bounds[to]];
            html.push_str(&html_escape::encode_safe(text));
        }
    }

    fn push_open(&self, html: &mut String, highlight: &Highlight, all_ids: Option<&[&str]>) {
        let category = self.categories.iter().find(|c| c.id == highlight.category);
        let color = self.resolve_color(highlight, category);

        let mut title = category
            .map(|c| c.name.clone())
            .unwrap_or_else(|| highlight.category.clone());
        if let Some(ref note) = highlight.note {
            title.push_str(": ");
            title.push_str(note);
        }

        html.push_str("<span class=\"");
        html.push_str(&html_escape::encode_safe(&self.options.class_name));
        html.push_str("\" ");
        html.push_str(&self.options.id_attribute);
        html.push_str("=\"");
        html.push_str(&html_escape::encode_safe(&highlight.id));
        html.push('"');
        if let Some(ids) = all_ids {
            html.push(' ');
            html.push_str(&self.options.id_attribute);
            html.push_str("s=\"");
            html.push_str(&html_escape::encode_safe(&ids.join(" ")));
            html.push('"');
        }
        html.push(' ');
        html.push_str(&self.options.category_attribute);
        html.push_str("=\"");
        html.push_str(&html_escape::encode_safe(&highlight.category));
        html.push_str("\" style=\"background-color: ");
        html.push_str(color);
        html.push_str(";\" title=\"");
        html.push_str(&html_escape::encode_safe(&title));
        html.push_str("\">");
    }

    /// Stored color, then the category's color, then the neutral fallback
    fn resolve_color<'c>(
        &'c self,
        highlight: &'c Highlight,
        category: Option<&'c HighlightCategory>,
    ) -> &'c str {
        if is_hex_color(&highlight.color) {
            return &highlight.color;
        }
        match category {
            Some(c) if is_hex_color(&c.color) => &c.color,
            _ if is_hex_color(&self.options.fallback_color) => &self.options.fallback_color,
            _ => NEUTRAL_COLOR,
        }
    }
}

/// Remove highlight wrapper spans, keeping their content
pub fn strip_highlights(html: &str) -> Result<String, RenderError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("span[data-highlight-id]", |el| {
                el.remove_and_keep_content();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| RenderError::RewriteError(e.to_string()))
}

/// Decoded text content of a markup fragment
pub fn text_content(html: &str) -> Result<String, RenderError> {
    let mut raw = String::with_capacity(html.len());

    rewrite_str(
        html,
        RewriteStrSettings {
            document_content_handlers: vec![doc_text!(|t| {
                raw.push_str(t.as_str());
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| RenderError::RewriteError(e.to_string()))?;

    Ok(html_escape::decode_html_entities(&raw).into_owned())
}
