use std::iter::Peekable;
use std::str::Chars;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const TAB_SIZE: usize = 8;

/// Returns the width of `s` in terminal cells.
///
/// Width is measured per grapheme cluster, so combining marks and joined emoji sequences take the
/// cells of the cluster they belong to. ANSI escape sequences (CSI and OSC) occupy no cells, so
/// style tokens embedded in a line do not count against the wrap width.
pub fn visible_width(s: &str) -> usize {
    if !s.contains('\x1b') {
        return graphemes_width(s);
    }
    let mut visible = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            skip_escape(&mut chars);
            continue;
        }
        visible.push(ch);
    }
    graphemes_width(&visible)
}

// A cluster never spans more than two cells.
fn graphemes_width(s: &str) -> usize {
    s.graphemes(true).map(|g| g.width().min(2)).sum()
}

fn skip_escape(chars: &mut Peekable<Chars<'_>>) {
    match chars.peek() {
        Some('[') => {
            chars.next();
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
        Some(']') => {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '\x07' {
                    break;
                }
                if c == '\x1b' {
                    if chars.peek() == Some(&'\\') {
                        chars.next();
                    }
                    break;
                }
            }
        }
        Some(_) => {
            chars.next();
        }
        None => {}
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Word(&'a str),
    Space(&'a str),
}

fn is_break_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut in_space: Option<bool> = None;
    for (idx, ch) in s.char_indices() {
        let space = is_break_space(ch);
        match in_space {
            Some(prev) if prev != space => {
                out.push(make_chunk(&s[start..idx], prev));
                start = idx;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if let Some(space) = in_space {
        out.push(make_chunk(&s[start..], space));
    }
    out
}

fn make_chunk(s: &str, space: bool) -> Chunk<'_> {
    if space { Chunk::Space(s) } else { Chunk::Word(s) }
}

/// Wraps one logical line into physical lines no wider than `width` cells.
///
/// Breaks happen at whitespace; whitespace at a break is dropped. The first physical line starts
/// with `initial_indent`, the rest with `subsequent_indent`. A word that cannot fit even on an empty
/// line is emitted alone on its own line rather than split. A line with no words yields no output.
pub fn wrap_line(
    line: &str,
    width: usize,
    initial_indent: &str,
    subsequent_indent: &str,
) -> Vec<String> {
    let line = normalize_whitespace(line);
    let mut out: Vec<String> = Vec::new();
    let mut cur = initial_indent.to_string();
    let mut cur_cols = visible_width(initial_indent);
    let mut has_word = false;
    let mut pending_ws = "";

    for chunk in chunks(&line) {
        let word = match chunk {
            Chunk::Space(ws) => {
                pending_ws = ws;
                continue;
            }
            Chunk::Word(word) => word,
        };

        let word_cols = visible_width(word);
        let ws_cols = visible_width(pending_ws);

        if has_word {
            if cur_cols + ws_cols + word_cols > width {
                out.push(std::mem::take(&mut cur));
                cur.push_str(subsequent_indent);
                cur_cols = visible_width(subsequent_indent);
            } else {
                cur.push_str(pending_ws);
                cur_cols += ws_cols;
            }
        } else if out.is_empty() && !pending_ws.is_empty() && cur_cols + ws_cols + word_cols <= width
        {
            // Leading whitespace survives on the first line only.
            cur.push_str(pending_ws);
            cur_cols += ws_cols;
        }

        cur.push_str(word);
        cur_cols += word_cols;
        has_word = true;
        pending_ws = "";
    }

    if has_word {
        out.push(cur);
    }
    out
}

/// Like [`wrap_line`], joined with `\n`.
pub fn fill_line(line: &str, width: usize, initial_indent: &str, subsequent_indent: &str) -> String {
    wrap_line(line, width, initial_indent, subsequent_indent).join("\n")
}

/// Expands tabs to the next multiple of eight columns and turns the other whitespace controls
/// into single spaces. A newline or carriage return restarts the tab column.
fn normalize_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut col = 0usize;
    for ch in s.chars() {
        match ch {
            '\t' => {
                let pad = TAB_SIZE - col % TAB_SIZE;
                out.extend(std::iter::repeat_n(' ', pad));
                col += pad;
            }
            '\n' | '\r' => {
                out.push(' ');
                col = 0;
            }
            '\x0b' | '\x0c' => {
                out.push(' ');
                col += 1;
            }
            _ => {
                out.push(ch);
                col += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wraps_at_whitespace_nearest_the_limit() {
        assert_eq!(
            wrap_line("hello world foo bar", 11, "", ""),
            vec!["hello world".to_string(), "foo bar".to_string()]
        );
    }

    #[test]
    fn applies_initial_and_subsequent_indent() {
        assert_eq!(
            wrap_line("aaa bbb ccc", 6, "> ", "  "),
            vec!["> aaa".to_string(), "  bbb".to_string(), "  ccc".to_string()]
        );
    }

    #[test]
    fn overlong_word_is_emitted_alone() {
        assert_eq!(
            wrap_line("a https://example.com/a/very/long/path b", 10, "", ""),
            vec![
                "a".to_string(),
                "https://example.com/a/very/long/path".to_string(),
                "b".to_string()
            ]
        );
    }

    #[test]
    fn zero_width_still_terminates() {
        assert_eq!(
            wrap_line("one two", 0, "", ""),
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn whitespace_only_line_yields_nothing() {
        assert!(wrap_line("   ", 10, "  ", "  ").is_empty());
        assert_eq!(fill_line("", 10, "", ""), "");
    }

    #[test]
    fn style_tokens_do_not_count_toward_width() {
        let line = "see \x1b[34mlink\x1b[0m now";
        assert_eq!(visible_width(line), 12);
        assert_eq!(wrap_line(line, 12, "", ""), vec![line.to_string()]);
    }

    #[test]
    fn wide_characters_use_cell_width() {
        assert_eq!(visible_width("日本"), 4);
        assert_eq!(
            wrap_line("日本 日本", 4, "", ""),
            vec!["日本".to_string(), "日本".to_string()]
        );
    }

    #[test]
    fn expands_tabs_to_eight_column_stops() {
        assert_eq!(wrap_line("a\tb", 80, "", ""), vec![format!("a{}b", " ".repeat(7))]);
        assert_eq!(
            wrap_line("abcdefgh\tb", 80, "", ""),
            vec![format!("abcdefgh{}b", " ".repeat(8))]
        );
        assert_eq!(wrap_line("ab\ncd\te", 80, "", ""), vec![format!("ab cd{}e", " ".repeat(6))]);
        assert_eq!(wrap_line("a\nb\r\nc", 80, "", ""), vec!["a b  c".to_string()]);
    }

    #[test]
    fn clusters_take_the_width_of_their_base() {
        assert_eq!(visible_width("e\u{301}"), 1);
        assert_eq!(visible_width("cafe\u{301} ok"), 7);
        assert_eq!(visible_width("\x1b[1me\u{301}\x1b[0m"), 1);
        assert_eq!(
            wrap_line("e\u{301}e\u{301}e\u{301} xyz", 7, "", ""),
            vec!["e\u{301}e\u{301}e\u{301} xyz".to_string()]
        );
    }

    #[test]
    fn joined_emoji_count_as_one_wide_cluster() {
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        assert_eq!(visible_width(family), 2);
        assert_eq!(visible_width("\u{1F44D}\u{1F3FD}"), 2);
    }

    proptest! {
        #[test]
        fn never_exceeds_width_unless_single_token(
            words in proptest::collection::vec("[a-z]{1,15}", 0..40),
            width in 1usize..40,
        ) {
            let line = words.join(" ");
            let indent = "  ";
            for physical in wrap_line(&line, width, indent, indent) {
                if visible_width(&physical) > width {
                    let body = &physical[indent.len()..];
                    prop_assert!(!body.contains(' '), "multi-word line over width: {physical:?}");
                }
            }
        }

        #[test]
        fn wrapping_keeps_every_word(
            words in proptest::collection::vec("[a-z]{1,12}", 1..30),
            width in 1usize..30,
        ) {
            let line = words.join(" ");
            let rejoined = wrap_line(&line, width, "", "")
                .iter()
                .flat_map(|l| l.split(' ').map(str::to_string).collect::<Vec<_>>())
                .collect::<Vec<_>>();
            prop_assert_eq!(rejoined, words);
        }
    }
}
