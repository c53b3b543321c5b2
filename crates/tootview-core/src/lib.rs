//! `tootview-core` holds the small, dependency-light pieces that the toot renderer is built from.
//!
//! - [`wrapping`]: width-aware line wrapping that ignores embedded style escapes.
//! - [`emoji`]: `:short_code:` ⇄ unicode emoji conversion over the full Unicode emoji set.
//! - [`ids`]: session-scoped local ids for long server ids, with a typed error for bad input.
//! - [`style`]: ratatui [`Style`](ratatui::style::Style) → SGR style tokens, and the anchor theme.
//!
//! Everything here is synchronous and allocation-light. Nothing is read from disk; callers build
//! options in code.
pub mod emoji;
pub mod ids;
pub mod style;
pub mod wrapping;
