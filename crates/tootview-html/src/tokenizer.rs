//! A forgiving tokenizer for the small HTML subset servers put in toot bodies.
//!
//! It never fails: anything that does not look like a tag is text, and a tag left open at the end
//! of input is returned as text too. Character references are decoded in text and attribute
//! values.

use crate::entities;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Text(String),
    StartTag {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Doctype(String),
}

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

/// Returns the value of attribute `name`, if present with a value.
pub fn attr<'a>(attributes: &'a [(String, Option<String>)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == name)
        .and_then(|(_, v)| v.as_deref())
}

/// Returns whether the `class` attribute lists `class` as one of its space-separated names.
pub fn has_class(attributes: &[(String, Option<String>)], class: &str) -> bool {
    attr(attributes, "class").is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
}

fn starts_with_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

fn push_text(out: &mut Vec<Token>, raw: &str) {
    let decoded = decode_entities(raw);
    if decoded.is_empty() {
        return;
    }
    if let Some(Token::Text(prev)) = out.last_mut() {
        prev.push_str(&decoded);
    } else {
        out.push(Token::Text(decoded));
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    // Slices are only cut at ASCII structural bytes, so every endpoint is a char boundary.
    while i < len {
        if bytes[i] != b'<' {
            let start = i;
            while i < len && bytes[i] != b'<' {
                i += 1;
            }
            push_text(&mut out, &input[start..i]);
            continue;
        }

        let next = bytes.get(i + 1).copied();

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + COMMENT_END.len();
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    i = len;
                }
            }
            continue;
        }

        if next == Some(b'!') || next == Some(b'?') {
            // Doctypes and bogus comments run to the next '>'.
            let body_start = i + 2;
            let Some(end) = input[body_start..].find('>') else {
                push_text(&mut out, &input[i..]);
                break;
            };
            let body = input[body_start..body_start + end].trim();
            if starts_with_ignore_ascii_case(&bytes[i..], b"<!doctype") {
                out.push(Token::Doctype(body.to_string()));
            } else {
                out.push(Token::Comment(body.to_string()));
            }
            i = body_start + end + 1;
            continue;
        }

        if next == Some(b'/') {
            let start = i + 2;
            if !bytes.get(start).is_some_and(u8::is_ascii_alphabetic) {
                push_text(&mut out, "</");
                i = start;
                continue;
            }
            let mut j = start;
            while j < len && bytes[j].is_ascii_alphanumeric() {
                j += 1;
            }
            let name = input[start..j].to_ascii_lowercase();
            while j < len && bytes[j] != b'>' {
                j += 1;
            }
            if j >= len {
                push_text(&mut out, &input[i..]);
                break;
            }
            out.push(Token::EndTag(name));
            i = j + 1;
            continue;
        }

        if !next.is_some_and(|b| b.is_ascii_alphabetic()) {
            push_text(&mut out, "<");
            i += 1;
            continue;
        }

        match scan_start_tag(input, i) {
            Some((token, end)) => {
                out.push(token);
                i = end;
            }
            None => {
                push_text(&mut out, &input[i..]);
                break;
            }
        }
    }
    out
}

/// Scans a start tag beginning at `at` (the `<`). Returns the token and the index just past `>`,
/// or `None` if input ends before the tag is closed.
fn scan_start_tag(input: &str, at: usize) -> Option<(Token, usize)> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let start = at + 1;
    let mut k = start;
    while k < len && bytes[k].is_ascii_alphanumeric() {
        k += 1;
    }
    let name = input[start..k].to_ascii_lowercase();
    let mut attributes: Vec<(String, Option<String>)> = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };
    let is_name_char = |c: u8| c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b':' | b'.');

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            return None;
        }
        if bytes[k] == b'>' {
            k += 1;
            break;
        }
        if bytes[k] == b'/' {
            if bytes.get(k + 1) == Some(&b'>') {
                self_closing = true;
                k += 2;
                break;
            }
            k += 1;
            continue;
        }
        let name_start = k;
        while k < len && is_name_char(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            // Stray byte inside the tag, e.g. a lone quote.
            k += 1;
            continue;
        }
        let attribute_name = input[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        let value = if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let vstart = k;
                while k < len && bytes[k] != quote {
                    k += 1;
                }
                if k >= len {
                    return None;
                }
                let raw = &input[vstart..k];
                k += 1;
                Some(decode_entities(raw))
            } else {
                let vstart = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    k += 1;
                }
                Some(decode_entities(&input[vstart..k]))
            }
        } else {
            None
        };
        attributes.push((attribute_name, value));
    }

    Some((
        Token::StartTag {
            name,
            attributes,
            self_closing,
        },
        k,
    ))
}

const REPLACEMENT: char = '\u{FFFD}';

/// What numeric references in `0x80..=0x9F` mean in practice: the windows-1252 characters.
const WINDOWS_1252: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

/// Maps a numeric reference to its character. `None` drops the reference; a value too large to
/// parse arrives as `None` and becomes U+FFFD.
fn numeric_entity(code: Option<u32>) -> Option<char> {
    let Some(code) = code else {
        return Some(REPLACEMENT);
    };
    match code {
        0 => Some(REPLACEMENT),
        0x0D => Some('\r'),
        0x80..=0x9F => Some(WINDOWS_1252[(code - 0x80) as usize]),
        0xD800..=0xDFFF => Some(REPLACEMENT),
        c if c > 0x10FFFF => Some(REPLACEMENT),
        0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F | 0xFDD0..=0xFDEF => None,
        c if c & 0xFFFE == 0xFFFE => None,
        c => char::from_u32(c),
    }
}

fn is_name_char(ch: char) -> bool {
    !matches!(ch, '\t' | '\n' | '\x0c' | ' ' | '<' | '&' | '#' | ';')
}

/// Decodes the reference right after an `&` into `out`, returning how many bytes it used.
fn decode_reference(after: &str, out: &mut String) -> Option<usize> {
    if let Some(num) = after.strip_prefix('#') {
        let (digits, radix, prefix) = match num.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 2),
            None => (num, 10, 1),
        };
        let len = digits
            .bytes()
            .take_while(|b| match radix {
                16 => b.is_ascii_hexdigit(),
                _ => b.is_ascii_digit(),
            })
            .count();
        if len == 0 {
            return None;
        }
        let code = u32::from_str_radix(&digits[..len], radix).ok();
        if let Some(ch) = numeric_entity(code) {
            out.push(ch);
        }
        let end = prefix + len;
        return Some(if after[end..].starts_with(';') { end + 1 } else { end });
    }

    let len = after
        .char_indices()
        .take_while(|&(_, c)| is_name_char(c))
        .take(32)
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    if len == 0 {
        return None;
    }
    let end = if after[len..].starts_with(';') { len + 1 } else { len };
    let name = &after[..end];
    if let Some(value) = entities::lookup(name) {
        out.push_str(value);
        return Some(end);
    }
    // Legacy names match unterminated, as a prefix of a longer run.
    let prefix = (2..name.len())
        .rev()
        .filter(|&x| name.is_char_boundary(x))
        .find_map(|x| entities::lookup(&name[..x]).map(|value| (x, value)));
    let (x, value) = prefix?;
    out.push_str(value);
    out.push_str(&name[x..]);
    Some(end)
}

/// Decodes named (`&amp;`), decimal (`&#39;`) and hex (`&#x27;`) character references.
///
/// The terminating `;` is optional. A name that is not an entity decodes through its longest
/// legacy prefix (`&notit;` is `¬it;`), and anything else is left as written.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match decode_reference(after, &mut out) {
            Some(used) => rest = &after[used..],
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str, attributes: &[(&str, &str)]) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
            self_closing: false,
        }
    }

    #[test]
    fn tokenizes_toot_markup() {
        let tokens = tokenize(r#"<p>Hi <a href="https://x/1" class="u-url mention">@bob</a></p>"#);
        assert_eq!(
            tokens,
            vec![
                start("p", &[]),
                Token::Text("Hi ".to_string()),
                start("a", &[("href", "https://x/1"), ("class", "u-url mention")]),
                Token::Text("@bob".to_string()),
                Token::EndTag("a".to_string()),
                Token::EndTag("p".to_string()),
            ]
        );
    }

    #[test]
    fn decodes_character_references() {
        assert_eq!(
            tokenize("a &amp; b &lt;3 &#39;q&#x27; &bogus; &amp"),
            vec![Token::Text("a & b <3 'q' &bogus; &".to_string())]
        );
        assert_eq!(decode_entities("&#0;&#x110000;"), "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn decodes_the_full_named_set() {
        assert_eq!(
            decode_entities("caf&eacute; &hearts; &NotEqualTilde;"),
            "caf\u{E9} \u{2665} \u{2242}\u{338}"
        );
        assert_eq!(decode_entities("&copy 2024 &COPY;"), "\u{A9} 2024 \u{A9}");
        assert_eq!(decode_entities("&notit; &amp;&ampx"), "\u{AC}it; &&x");
        assert_eq!(decode_entities("&hearts"), "&hearts");
        assert_eq!(decode_entities("& &; &#; &#x;"), "& &; &#; &#x;");
    }

    #[test]
    fn numeric_references_follow_browser_rules() {
        assert_eq!(decode_entities("&#39&#x41;&#X42"), "'AB");
        assert_eq!(decode_entities("&#x80;&#150;"), "\u{20AC}\u{2013}");
        assert_eq!(decode_entities("&#xD800;&#99999999999;"), "\u{FFFD}\u{FFFD}");
        assert_eq!(decode_entities("a&#1;b&#xFFFF;c"), "abc");
        assert_eq!(decode_entities("&#13;"), "\r");
    }

    #[test]
    fn decodes_attribute_values() {
        let tokens = tokenize(r#"<a href="https://x/?a=1&amp;b=2">"#);
        assert_eq!(
            tokens,
            vec![start("a", &[("href", "https://x/?a=1&b=2")])]
        );
    }

    #[test]
    fn lone_angle_brackets_are_text() {
        assert_eq!(
            tokenize("a < b <3 </ c"),
            vec![Token::Text("a < b <3 </ c".to_string())]
        );
    }

    #[test]
    fn unterminated_tag_becomes_text() {
        assert_eq!(
            tokenize(r#"ok <a href="x"#),
            vec![Token::Text(r#"ok <a href="x"#.to_string())]
        );
        assert_eq!(
            tokenize("ok </span"),
            vec![Token::Text("ok </span".to_string())]
        );
    }

    #[test]
    fn uppercase_tags_and_self_closing_br() {
        let tokens = tokenize("A<BR/>B<br>");
        assert_eq!(
            tokens,
            vec![
                Token::Text("A".to_string()),
                Token::StartTag {
                    name: "br".to_string(),
                    attributes: vec![],
                    self_closing: true,
                },
                Token::Text("B".to_string()),
                start("br", &[]),
            ]
        );
    }

    #[test]
    fn comments_and_doctype() {
        assert_eq!(
            tokenize("<!DOCTYPE html><!-- hi -->x<!-- open"),
            vec![
                Token::Doctype("DOCTYPE html".to_string()),
                Token::Comment(" hi ".to_string()),
                Token::Text("x".to_string()),
                Token::Comment(" open".to_string()),
            ]
        );
    }

    #[test]
    fn class_matching_uses_whole_names() {
        let attrs = vec![("class".to_string(), Some("mention hashtag".to_string()))];
        assert!(has_class(&attrs, "hashtag"));
        assert!(has_class(&attrs, "mention"));
        assert!(!has_class(&attrs, "hash"));
        assert!(!has_class(&[], "mention"));
    }

    #[test]
    fn preserves_utf8_around_tags() {
        assert_eq!(
            tokenize("é<b>ï</b>ö 😊"),
            vec![
                Token::Text("é".to_string()),
                start("b", &[]),
                Token::Text("ï".to_string()),
                Token::EndTag("b".to_string()),
                Token::Text("ö 😊".to_string()),
            ]
        );
    }
}
