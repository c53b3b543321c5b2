//! Toot markup rendering for `tootview`.
//!
//! Servers deliver a toot body as a small subset of HTML: paragraphs, line breaks, anchors, and
//! spans that mark which part of a long link may be hidden. This crate turns that markup into
//! wrapped terminal text.
//!
//! - [`tokenizer`]: forgiving tokenizer producing text / start-tag / end-tag tokens.
//! - [`view::TootRenderer`]: the renderer, configured with [`view::TootRenderOptions`].
//! - [`mention`]: optional per-toot metadata that decorates mention anchors.
//!
//! Rendering never fails. Markup that does not parse is kept as text.
mod entities;
pub mod mention;
pub mod render;
pub mod tokenizer;
pub mod view;

pub use mention::MentionMetadata;
pub use view::RenderedToot;
pub use view::TootRenderOptions;
pub use view::TootRenderer;
pub use view::render_toot;
