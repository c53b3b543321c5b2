//! Emoji short-code conversion.
//!
//! [`shortcode_to_unicode`] turns `:thumbs_up:` (or the GitHub alias `:thumbsup:`) into 👍 and
//! [`unicode_to_shortcode`] goes the other way, always producing the canonical name. Both are
//! total: text that does not match is passed through untouched.
//!
//! The emoji set is the full Unicode list from the [`emojis`] crate, skin tones and flags
//! included. Canonical names are the CLDR names with spaces and separators turned into `_`, so
//! 👍🏽 is `:thumbs_up_medium_skin_tone:` and 🇫🇷 is `:France:`. GitHub short-codes decode only.

use std::collections::HashMap;
use std::sync::LazyLock;

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Builds the canonical short-code name for a CLDR emoji name.
fn canonical_name(cldr: &str) -> String {
    let cldr = cldr.strip_prefix("flag: ").unwrap_or(cldr);
    let mut out = String::with_capacity(cldr.len());
    for ch in cldr.chars() {
        match ch {
            c if c.is_alphanumeric() || c == '-' => out.push(c),
            ' ' | ':' | ',' | '_' => {
                if !out.is_empty() && !out.ends_with('_') {
                    out.push('_');
                }
            }
            '#' => out.push_str("number_sign"),
            '*' => out.push_str("asterisk"),
            _ => {}
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

fn all_emoji() -> impl Iterator<Item = &'static emojis::Emoji> {
    emojis::iter().flat_map(|e| {
        let variants: Vec<&'static emojis::Emoji> = match e.skin_tones() {
            Some(tones) => tones.collect(),
            None => vec![e],
        };
        variants
    })
}

struct Table {
    /// Canonical `(name, glyph)` pairs. Names and glyphs are both unique.
    canonical: Vec<(String, &'static str)>,
    by_name: HashMap<String, &'static str>,
    by_glyph: HashMap<String, String>,
    max_chars: usize,
}

static TABLE: LazyLock<Table> = LazyLock::new(|| {
    let mut canonical: Vec<(String, &'static str)> = Vec::new();
    let mut by_name: HashMap<String, &'static str> = HashMap::new();
    let mut by_glyph: HashMap<String, String> = HashMap::new();
    let mut max_chars = 0usize;

    for emoji in all_emoji() {
        let glyph = emoji.as_str();
        let name = canonical_name(emoji.name());
        if name.is_empty() || by_name.contains_key(&name) || by_glyph.contains_key(glyph) {
            continue;
        }
        by_name.insert(name.clone(), glyph);
        by_glyph.insert(glyph.to_string(), name.clone());
        max_chars = max_chars.max(glyph.chars().count());
        canonical.push((name, glyph));
    }

    // GitHub short-codes decode only, and never shadow a canonical name.
    for emoji in all_emoji() {
        for code in emoji.shortcodes() {
            by_name.entry(code.to_string()).or_insert(emoji.as_str());
        }
    }

    // Bare forms (no variation selector) match too, without shadowing a full glyph.
    for (name, glyph) in &canonical {
        if let Some(bare) = strip_variation(glyph) {
            by_glyph.entry(bare).or_insert_with(|| name.clone());
        }
    }

    tracing::debug!(canonical = canonical.len(), names = by_name.len(), "built emoji table");
    Table {
        canonical,
        by_name,
        by_glyph,
        max_chars,
    }
});

fn strip_variation(glyph: &str) -> Option<String> {
    glyph
        .contains(VARIATION_SELECTOR)
        .then(|| glyph.chars().filter(|&c| c != VARIATION_SELECTOR).collect())
}

fn is_shortcode_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '+')
}

/// Canonical `(name, glyph)` pairs, one per emoji.
pub fn canonical_table() -> impl Iterator<Item = (&'static str, &'static str)> {
    TABLE
        .canonical
        .iter()
        .map(|(name, glyph)| (name.as_str(), *glyph))
}

/// Looks up the glyph for a short-code name (without colons), canonical or GitHub alias.
pub fn glyph_for(name: &str) -> Option<&'static str> {
    TABLE.by_name.get(name).copied()
}

/// Looks up the canonical short-code name for a glyph.
pub fn name_for(glyph: &str) -> Option<&'static str> {
    TABLE.by_glyph.get(glyph).map(String::as_str)
}

/// Replaces every `:name:` with a known name by its unicode glyph.
pub fn shortcode_to_unicode(text: &str) -> String {
    if !text.contains(':') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find(':') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find(':') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        let glyph = (!name.is_empty() && name.chars().all(is_shortcode_char))
            .then(|| glyph_for(name))
            .flatten();
        match glyph {
            Some(glyph) => {
                out.push_str(glyph);
                rest = &after[close + 1..];
            }
            None => {
                // The closing colon may open the next short-code.
                out.push(':');
                out.push_str(name);
                rest = &after[close..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Replaces every known emoji glyph with its canonical `:name:` short-code.
pub fn unicode_to_shortcode(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let table = &*TABLE;
    let mut out = String::with_capacity(text.len());
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;

    let mut i = 0usize;
    while i < char_count {
        let longest = table.max_chars.min(char_count - i);
        let hit = (1..=longest).rev().find_map(|n| {
            let candidate = &text[bounds[i]..bounds[i + n]];
            table.by_glyph.get(candidate).map(|name| (n, name))
        });
        match hit {
            Some((n, name)) => {
                out.push(':');
                out.push_str(name);
                out.push(':');
                i += n;
                if i < char_count && text[bounds[i]..].starts_with(VARIATION_SELECTOR) {
                    i += 1;
                }
            }
            None => {
                out.push_str(&text[bounds[i]..bounds[i + 1]]);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn converts_canonical_and_alias_names() {
        assert_eq!(shortcode_to_unicode("nice :thumbs_up:"), "nice \u{1F44D}");
        assert_eq!(shortcode_to_unicode(":thumbsup: :+1:"), "\u{1F44D} \u{1F44D}");
        assert_eq!(shortcode_to_unicode("I :heart: Rust"), "I \u{2764}\u{FE0F} Rust");
        assert_eq!(shortcode_to_unicode(":tada:"), "\u{1F389}");
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(shortcode_to_unicode("at 10:30:00"), "at 10:30:00");
        assert_eq!(shortcode_to_unicode(":not_an_emoji:"), ":not_an_emoji:");
        assert_eq!(shortcode_to_unicode("a: b :c"), "a: b :c");
        assert_eq!(shortcode_to_unicode("trailing:"), "trailing:");
        assert_eq!(shortcode_to_unicode("::"), "::");
    }

    #[test]
    fn colon_after_unknown_name_can_open_a_code() {
        assert_eq!(shortcode_to_unicode("x:fire:"), "x\u{1F525}");
        assert_eq!(shortcode_to_unicode("ratio:fire:"), "ratio\u{1F525}");
        assert_eq!(shortcode_to_unicode("foo:bar:fire:"), "foo:bar\u{1F525}");
    }

    #[test]
    fn glyphs_become_canonical_names() {
        assert_eq!(unicode_to_shortcode("hi \u{1F44B}!"), "hi :waving_hand:!");
        assert_eq!(unicode_to_shortcode("\u{2764}\u{FE0F}"), ":red_heart:");
        assert_eq!(unicode_to_shortcode("\u{2764}"), ":red_heart:");
        assert_eq!(unicode_to_shortcode("caf\u{E9}"), "caf\u{E9}");
    }

    #[test]
    fn skin_tones_and_flags_have_names() {
        assert_eq!(
            unicode_to_shortcode("\u{1F44D}\u{1F3FD}"),
            ":thumbs_up_medium_skin_tone:"
        );
        assert_eq!(unicode_to_shortcode("\u{1F1EB}\u{1F1F7}"), ":France:");
        assert_eq!(shortcode_to_unicode(":France:"), "\u{1F1EB}\u{1F1F7}");
        assert_eq!(
            shortcode_to_unicode(":thumbs_up_medium_skin_tone:"),
            "\u{1F44D}\u{1F3FD}"
        );
    }

    #[test]
    fn keycaps_keep_their_symbol_in_the_name() {
        assert_eq!(canonical_name("keycap: #"), "keycap_number_sign");
        assert_eq!(canonical_name("keycap: *"), "keycap_asterisk");
        assert_eq!(canonical_name("flag: United States"), "United_States");
        assert_eq!(canonical_name("man\u{2019}s shoe"), "mans_shoe");
    }

    #[test]
    fn longest_glyph_wins() {
        assert_eq!(
            unicode_to_shortcode("\u{1F3F3}\u{FE0F}\u{200D}\u{1F308}"),
            ":rainbow_flag:"
        );
        assert_eq!(unicode_to_shortcode("\u{1F3F3}\u{FE0F}"), ":white_flag:");
    }

    #[test]
    fn table_is_one_to_one() {
        let table = canonical_table().collect::<Vec<_>>();
        let names: HashSet<_> = table.iter().map(|(n, _)| *n).collect();
        let glyphs: HashSet<_> = table.iter().map(|(_, g)| *g).collect();
        assert!(table.len() > 2500, "only {} emoji", table.len());
        assert_eq!(names.len(), table.len());
        assert_eq!(glyphs.len(), table.len());
        for (name, glyph) in &table {
            assert_eq!(name_for(glyph), Some(*name));
        }
    }

    #[test]
    fn every_canonical_code_round_trips() {
        for (name, _) in canonical_table() {
            let code = format!(":{name}:");
            assert_eq!(unicode_to_shortcode(&shortcode_to_unicode(&code)), code);
        }
    }
}
