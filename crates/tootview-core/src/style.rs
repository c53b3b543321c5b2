use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;

/// Resets all attributes. Appended after a styled run.
pub const RESET: &str = "\x1b[0m";

const MODIFIER_CODES: &[(Modifier, u8)] = &[
    (Modifier::BOLD, 1),
    (Modifier::DIM, 2),
    (Modifier::ITALIC, 3),
    (Modifier::UNDERLINED, 4),
    (Modifier::SLOW_BLINK, 5),
    (Modifier::RAPID_BLINK, 6),
    (Modifier::REVERSED, 7),
    (Modifier::HIDDEN, 8),
    (Modifier::CROSSED_OUT, 9),
];

/// Styles applied to the three kinds of anchors in a toot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TootTheme {
    pub link: Style,
    pub mention: Style,
    pub hashtag: Style,
}

impl Default for TootTheme {
    fn default() -> Self {
        use ratatui::style::Stylize;

        Self {
            link: Style::default().blue().underlined(),
            mention: Style::default().green(),
            hashtag: Style::default().cyan(),
        }
    }
}

impl TootTheme {
    pub fn link_token(&self) -> Option<String> {
        style_token(self.link)
    }

    pub fn mention_token(&self) -> Option<String> {
        style_token(self.mention)
    }

    pub fn hashtag_token(&self) -> Option<String> {
        style_token(self.hashtag)
    }
}

/// Encodes `style` as a single SGR escape sequence, or `None` if it sets nothing.
///
/// Only added modifiers and colors are encoded; the caller is expected to emit [`RESET`] once the
/// styled run ends.
pub fn style_token(style: Style) -> Option<String> {
    let mut codes: Vec<String> = MODIFIER_CODES
        .iter()
        .filter(|(m, _)| style.add_modifier.contains(*m))
        .map(|(_, code)| code.to_string())
        .collect();
    if let Some(fg) = style.fg {
        codes.push(color_code(fg, false));
    }
    if let Some(bg) = style.bg {
        codes.push(color_code(bg, true));
    }
    if codes.is_empty() {
        return None;
    }
    Some(format!("\x1b[{}m", codes.join(";")))
}

fn color_code(color: Color, background: bool) -> String {
    let base: u8 = if background { 40 } else { 30 };
    let bright: u8 = if background { 100 } else { 90 };
    let extended = if background { 48 } else { 38 };
    match color {
        Color::Reset => (base + 9).to_string(),
        Color::Black => base.to_string(),
        Color::Red => (base + 1).to_string(),
        Color::Green => (base + 2).to_string(),
        Color::Yellow => (base + 3).to_string(),
        Color::Blue => (base + 4).to_string(),
        Color::Magenta => (base + 5).to_string(),
        Color::Cyan => (base + 6).to_string(),
        Color::Gray => (base + 7).to_string(),
        Color::DarkGray => bright.to_string(),
        Color::LightRed => (bright + 1).to_string(),
        Color::LightGreen => (bright + 2).to_string(),
        Color::LightYellow => (bright + 3).to_string(),
        Color::LightBlue => (bright + 4).to_string(),
        Color::LightMagenta => (bright + 5).to_string(),
        Color::LightCyan => (bright + 6).to_string(),
        Color::White => (bright + 7).to_string(),
        Color::Indexed(idx) => format!("{extended};5;{idx}"),
        Color::Rgb(r, g, b) => format!("{extended};2;{r};{g};{b}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Stylize;

    #[test]
    fn empty_style_has_no_token() {
        assert_eq!(style_token(Style::default()), None);
    }

    #[test]
    fn encodes_modifiers_then_colors() {
        assert_eq!(
            style_token(Style::default().blue().underlined()).as_deref(),
            Some("\x1b[4;34m")
        );
        assert_eq!(
            style_token(Style::default().fg(Color::Rgb(1, 2, 3)).bg(Color::Indexed(17)))
                .as_deref(),
            Some("\x1b[38;2;1;2;3;48;5;17m")
        );
        assert_eq!(
            style_token(Style::default().fg(Color::LightMagenta).bold()).as_deref(),
            Some("\x1b[1;95m")
        );
    }

    #[test]
    fn default_theme_styles_every_anchor_kind() {
        let theme = TootTheme::default();
        assert!(theme.link_token().is_some());
        assert_eq!(theme.mention_token().as_deref(), Some("\x1b[32m"));
        assert_eq!(theme.hashtag_token().as_deref(), Some("\x1b[36m"));
    }
}
