use ansi_to_tui::IntoText;
use ratatui::text::Text;
use tootview_html::RenderedToot;

fn expand_tabs(s: &str) -> std::borrow::Cow<'_, str> {
    if s.contains('\t') {
        std::borrow::Cow::Owned(s.replace('\t', "    "))
    } else {
        std::borrow::Cow::Borrowed(s)
    }
}

/// Converts SGR-styled output (a rendered toot, a display block) into a [`Text`].
///
/// Input that the ANSI parser rejects is kept as unstyled text.
pub fn ansi_text(input: &str) -> Text<'static> {
    let input = expand_tabs(input);
    input.as_ref().into_text().unwrap_or_else(|err| {
        tracing::debug!(?err, "ansi parse failed, keeping plain text");
        Text::from(input.to_string())
    })
}

/// [`ansi_text`] over a rendered toot body.
pub fn rendered_text(rendered: &RenderedToot) -> Text<'static> {
    ansi_text(rendered.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;
    use tootview_core::style::TootTheme;
    use tootview_html::TootRenderOptions;
    use tootview_html::render_toot;

    #[test]
    fn keeps_anchor_styles() {
        let options = TootRenderOptions::default().with_theme(&TootTheme::default());
        let rendered = render_toot(
            r#"<p>tagged <a href="https://s/tags/x" class="mention hashtag">#x</a></p><p>next</p>"#,
            &options,
        );
        let text = rendered_text(&rendered);
        assert_eq!(text.lines.len(), 3);
        let tag = text.lines[0]
            .spans
            .iter()
            .find(|span| span.content.contains("#x"))
            .expect("hashtag span");
        assert_eq!(tag.style.fg, Some(Color::Cyan));
    }

    #[test]
    fn plain_text_passes_through() {
        let text = ansi_text("a\tb");
        assert_eq!(text.lines.len(), 1);
        let plain = text.lines[0]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect::<String>();
        assert_eq!(plain, "a    b");
    }
}
