//! HTML processing module
//!
//! Turns a contract's plain text plus its highlights into display markup:
//! - Escaped text with highlight wrapper spans
//! - Stripping wrapper spans back out
//! - Text content extraction (used to map selections in rendered markup)
//!
//! Uses lol_html for streaming rewrites of rendered markup.

mod highlight_renderer;

pub use highlight_renderer::{
    render, render_with, strip_highlights, text_content, AnchorPolicy, OverlapStrategy,
    RenderError, RenderOptions, RenderOutput, NEUTRAL_COLOR,
};
