//! Terminal rendering for Mastodon toots.
//!
//! This is the batteries-included entry point. It re-exports the building blocks and adds the
//! pieces that need a whole toot record rather than just its markup:
//!
//! - [`toot`]: serde records for API statuses and the multi-line display block
//!   ([`toot::TootFormatter`]).
//! - [`glyphs`]: the symbols used for counts, visibility and status markers.
//! - `ansi` (feature `ansi`): turns rendered output back into a ratatui [`Text`](ratatui::text::Text).
//!
//! ```
//! use tootview::{TootRenderOptions, render_toot};
//!
//! let rendered = render_toot("<p>Hello</p><p>world</p>", &TootRenderOptions::default());
//! assert_eq!(rendered.text(), "Hello\n\nworld");
//! ```
pub use tootview_core::emoji;
pub use tootview_core::ids;
pub use tootview_core::style;
pub use tootview_core::wrapping;

pub use tootview_html as html;
pub use tootview_html::MentionMetadata;
pub use tootview_html::RenderedToot;
pub use tootview_html::TootRenderOptions;
pub use tootview_html::TootRenderer;
pub use tootview_html::render_toot;

#[cfg(feature = "ansi")]
pub mod ansi;

pub mod glyphs;
pub mod toot;
