//! Single-character markers shown next to counts and status flags.

pub const BOOST: &str = "\u{267A}";
pub const FAVE: &str = "\u{2665}";
pub const LOCKED: &str = "\u{1F512}";
/// Shown when the current user has already favourited the toot.
pub const FAVOURITED: &str = "\u{2605}";
/// Shown when the current user has already boosted the toot.
pub const REBLOGGED: &str = "\u{1F1E7}";

pub const PUBLIC: &str = "\u{1F30E}";
pub const UNLISTED: &str = "\u{1F47B}";
pub const PRIVATE: &str = "\u{1F512}";
pub const DIRECT: &str = "\u{1F4E7}";
pub const UNKNOWN: &str = "\u{1F34D}";
