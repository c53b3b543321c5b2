use crate::view::TootRenderOptions;
use crate::view::render_toot;

/// Plain text of `markup` with default options: no indent, no wrapping, no styling.
pub fn toot_text(markup: &str) -> String {
    render_toot(markup, &TootRenderOptions::default()).into_string()
}
