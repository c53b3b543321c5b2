use tootview_core::emoji;
use tootview_core::style::RESET;
use tootview_core::style::TootTheme;
use tootview_core::wrapping::wrap_line;

use crate::mention::MentionMetadata;
use crate::tokenizer::Token;
use crate::tokenizer::attr;
use crate::tokenizer::has_class;
use crate::tokenizer::tokenize;

/// Configuration for [`TootRenderer`].
///
/// Style tokens are inserted verbatim into the output, so they can be SGR sequences (see
/// [`TootTheme`]) or any other markers a caller knows how to display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TootRenderOptions {
    /// Prepended to every output line.
    pub indent: String,
    /// Maximum line width in terminal cells. `0` disables wrapping.
    pub width: usize,
    pub emoji_to_unicode: bool,
    pub unicode_to_emoji: bool,
    /// Use the `invisible` / `ellipsis` spans servers put inside long links.
    pub shorten_links: bool,
    pub link_style: Option<String>,
    pub mention_style: Option<String>,
    pub hashtag_style: Option<String>,
    /// Appended when a styled anchor closes.
    pub reset: String,
}

impl Default for TootRenderOptions {
    fn default() -> Self {
        Self {
            indent: String::new(),
            width: 0,
            emoji_to_unicode: false,
            unicode_to_emoji: false,
            shorten_links: false,
            link_style: None,
            mention_style: None,
            hashtag_style: None,
            reset: RESET.to_string(),
        }
    }
}

impl TootRenderOptions {
    /// Sets the three anchor style tokens from `theme`.
    pub fn with_theme(self, theme: &TootTheme) -> Self {
        Self {
            link_style: theme.link_token(),
            mention_style: theme.mention_token(),
            hashtag_style: theme.hashtag_token(),
            ..self
        }
    }
}

/// How the anchor currently being rendered was classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AnchorKind {
    Hashtag,
    Mention,
    Link,
}

/// The result of rendering one toot body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedToot {
    text: String,
    links: Vec<String>,
    weblinks: Vec<String>,
}

impl RenderedToot {
    /// Returns the rendered text, lines joined with `\n`.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.text.split('\n')
    }

    /// Every anchor target in document order, duplicates included.
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Targets of plain links (not hashtags or mentions), deduplicated in first-occurrence order.
    pub fn weblinks(&self) -> Vec<String> {
        unique(self.weblinks.iter())
    }

    /// Plain links first, then every other anchor target, deduplicated.
    ///
    /// This is the order link-opening commands number targets in.
    pub fn link_targets(&self) -> Vec<String> {
        unique(self.weblinks.iter().chain(self.links.iter()))
    }
}

fn unique<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Renders toot markup into wrapped, styled terminal text.
///
/// A renderer holds only its options; each [`render`](Self::render) call works on fresh state, so
/// one renderer can be reused for every toot in a timeline.
#[derive(Clone, Debug, Default)]
pub struct TootRenderer {
    options: TootRenderOptions,
}

impl TootRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TootRenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TootRenderOptions {
        &self.options
    }

    pub fn render(&self, markup: &str, mentions: Option<&MentionMetadata>) -> RenderedToot {
        Builder::new(&self.options, mentions).run(markup)
    }
}

/// Renders `markup` without mention metadata.
pub fn render_toot(markup: &str, options: &TootRenderOptions) -> RenderedToot {
    Builder::new(options, None).run(markup)
}

struct Builder<'a> {
    options: &'a TootRenderOptions,
    mentions: Option<&'a MentionMetadata>,
    scratch: String,
    lines: Vec<String>,
    anchor: Option<AnchorKind>,
    // Whether a style token was emitted for the open anchor.
    styled: bool,
    // Anchor text replaced by a mention label.
    replaced: bool,
    hide: bool,
    ellipsis: bool,
    links: Vec<String>,
    weblinks: Vec<String>,
}

impl<'a> Builder<'a> {
    fn new(options: &'a TootRenderOptions, mentions: Option<&'a MentionMetadata>) -> Self {
        Self {
            options,
            mentions,
            scratch: String::new(),
            lines: Vec::new(),
            anchor: None,
            styled: false,
            replaced: false,
            hide: false,
            ellipsis: false,
            links: Vec::new(),
            weblinks: Vec::new(),
        }
    }

    fn run(mut self, markup: &str) -> RenderedToot {
        for token in tokenize(markup) {
            self.handle(token);
        }
        self.finish()
    }

    fn handle(&mut self, token: Token) {
        match token {
            Token::Text(text) => self.text(&text),
            Token::StartTag {
                name, attributes, ..
            } => match name.as_str() {
                "br" => self.flush_line(),
                "p" => {
                    if !self.scratch.is_empty() {
                        self.flush_line();
                        self.lines.push(String::new());
                    }
                }
                "a" => self.start_anchor(&attributes),
                "span" => self.start_span(&attributes),
                other => tracing::trace!(tag = other, "ignoring start tag"),
            },
            Token::EndTag(name) => match name.as_str() {
                "a" => self.end_anchor(),
                "span" => self.end_span(),
                other => tracing::trace!(tag = other, "ignoring end tag"),
            },
            Token::Comment(_) | Token::Doctype(_) => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.hide || self.replaced {
            return;
        }
        let mut text = text.to_string();
        if self.options.emoji_to_unicode {
            text = emoji::shortcode_to_unicode(&text);
        }
        if self.options.unicode_to_emoji {
            text = emoji::unicode_to_shortcode(&text);
        }
        self.scratch.push_str(&text);
    }

    fn flush_line(&mut self) {
        if self.replaced {
            // A mention label never spans a line break.
            tracing::debug!("closing mention left open at line break");
            self.end_anchor();
        }
        let line = std::mem::take(&mut self.scratch);
        self.lines.push(line);
    }

    fn push_style(&mut self, token: Option<&str>) {
        if let Some(token) = token {
            self.scratch.push_str(token);
            self.styled = true;
        }
    }

    fn start_anchor(&mut self, attributes: &[(String, Option<String>)]) {
        if self.anchor.is_some() {
            tracing::debug!("closing anchor before a nested anchor");
            self.end_anchor();
        }

        let href = attr(attributes, "href");
        if let Some(href) = href {
            self.links.push(href.to_string());
        }

        let options = self.options;
        if has_class(attributes, "hashtag") {
            self.anchor = Some(AnchorKind::Hashtag);
            self.push_style(options.hashtag_style.as_deref());
        } else if has_class(attributes, "mention") {
            self.anchor = Some(AnchorKind::Mention);
            self.push_style(options.mention_style.as_deref());
            let mentions = self.mentions;
            let target = href.and_then(|href| mentions?.get(href));
            if let Some(target) = target {
                self.scratch.push_str(&target.label());
                self.replaced = true;
            }
        } else {
            self.anchor = Some(AnchorKind::Link);
            if let Some(href) = href {
                self.weblinks.push(href.to_string());
            }
            self.push_style(options.link_style.as_deref());
        }
    }

    fn end_anchor(&mut self) {
        if self.styled {
            self.scratch.push_str(&self.options.reset);
        }
        self.anchor = None;
        self.styled = false;
        self.replaced = false;
    }

    fn start_span(&mut self, attributes: &[(String, Option<String>)]) {
        if !self.options.shorten_links || self.anchor != Some(AnchorKind::Link) {
            return;
        }
        if has_class(attributes, "invisible") {
            self.hide = true;
        } else if has_class(attributes, "ellipsis") {
            self.ellipsis = true;
        }
    }

    fn end_span(&mut self) {
        self.hide = false;
        if self.ellipsis {
            self.scratch.push_str("...");
            self.ellipsis = false;
        }
    }

    fn finish(mut self) -> RenderedToot {
        if self.hide || self.ellipsis {
            tracing::debug!("closing span left open at end of input");
            self.end_span();
        }
        if self.anchor.is_some() {
            tracing::debug!("closing anchor left open at end of input");
            self.end_anchor();
        }
        self.flush_line();

        let options = self.options;
        let indent = options.indent.as_str();
        let text = if options.width == 0 {
            self.lines
                .iter()
                .map(|line| format!("{indent}{line}"))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            self.lines
                .iter()
                .map(|line| {
                    if line.is_empty() {
                        String::new()
                    } else {
                        wrap_line(line, options.width, indent, indent).join("\n")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        tracing::debug!(
            lines = self.lines.len(),
            links = self.links.len(),
            "rendered toot"
        );

        RenderedToot {
            text,
            links: self.links,
            weblinks: self.weblinks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tootview_core::ids::GlobalId;
    use tracing_test::traced_test;

    fn plain(markup: &str) -> String {
        render_toot(markup, &TootRenderOptions::default()).into_string()
    }

    const SHORTENED: &str = concat!(
        r#"<p>see <a href="https://example.com/a/really/long/path" rel="nofollow noopener" "#,
        r#"target="_blank"><span class="invisible">https://</span><span class="ellipsis">"#,
        r#"example.com/</span><span class="invisible">a/really/long/path</span></a></p>"#,
    );

    #[test]
    fn tagless_text_gets_indent_only() {
        let options = TootRenderOptions {
            indent: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(render_toot("just words", &options).text(), "  just words");
        assert_eq!(plain("just words"), "just words");
    }

    #[test]
    fn paragraphs_are_separated_by_an_empty_line() {
        let rendered = render_toot("<p>A</p><p>B</p>", &TootRenderOptions::default());
        assert_eq!(rendered.lines().collect::<Vec<_>>(), vec!["A", "", "B"]);
    }

    #[test]
    fn br_breaks_the_line() {
        assert_eq!(plain("A<br>B"), "A\nB");
        assert_eq!(plain("A<br/>B<br />"), "A\nB\n");
    }

    #[test]
    fn empty_markup_renders_one_empty_line() {
        assert_eq!(plain(""), "");
        let options = TootRenderOptions {
            indent: "> ".to_string(),
            ..Default::default()
        };
        assert_eq!(render_toot("", &options).text(), "> ");
    }

    #[test]
    fn indent_applies_to_every_line_without_wrapping() {
        let options = TootRenderOptions {
            indent: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            render_toot("<p>one</p><p>two<br>three</p>", &options).text(),
            "  one\n  \n  two\n  three"
        );
    }

    #[test]
    fn wraps_lines_and_keeps_paragraph_gaps_bare() {
        let options = TootRenderOptions {
            indent: "  ".to_string(),
            width: 12,
            ..Default::default()
        };
        assert_eq!(
            render_toot("<p>alpha beta gamma</p><p>delta</p>", &options).text(),
            "  alpha beta\n  gamma\n\n  delta"
        );
    }

    #[test]
    fn separates_weblinks_from_hashtags() {
        let rendered = render_toot(
            concat!(
                r#"<p><a href="https://a.example/x">x</a> "#,
                r#"<a href="https://inst/tags/rust" class="mention hashtag">#<span>rust</span></a></p>"#,
            ),
            &TootRenderOptions::default(),
        );
        assert_eq!(rendered.text(), "x #rust");
        assert_eq!(rendered.weblinks(), vec!["https://a.example/x".to_string()]);
        assert_eq!(
            rendered.links(),
            ["https://a.example/x".to_string(), "https://inst/tags/rust".to_string()]
        );
    }

    #[test]
    fn link_targets_put_weblinks_first_and_dedupe() {
        let rendered = render_toot(
            concat!(
                r#"<a href="https://inst/@bob" class="u-url mention">@bob</a> "#,
                r#"<a href="https://w/1">1</a> <a href="https://w/1">again</a> "#,
                r#"<a href="https://w/2">2</a>"#,
            ),
            &TootRenderOptions::default(),
        );
        assert_eq!(
            rendered.weblinks(),
            vec!["https://w/1".to_string(), "https://w/2".to_string()]
        );
        assert_eq!(
            rendered.link_targets(),
            vec![
                "https://w/1".to_string(),
                "https://w/2".to_string(),
                "https://inst/@bob".to_string(),
            ]
        );
        assert_eq!(rendered.links().len(), 4);
    }

    #[test]
    fn mention_metadata_replaces_anchor_text() {
        let metadata: MentionMetadata = [("https://inst/@bob", "bob", GlobalId(42))]
            .into_iter()
            .collect();
        let markup = concat!(
            r#"<p>hi <span class="h-card"><a href="https://inst/@bob" class="u-url mention">"#,
            r#"@<span>bob</span></a></span>!</p>"#,
        );
        let renderer = TootRenderer::new();
        assert_eq!(renderer.render(markup, Some(&metadata)).text(), "hi @bob (id:42)!");
        assert_eq!(renderer.render(markup, None).text(), "hi @bob!");
    }

    #[test]
    #[traced_test]
    fn unclosed_mention_ends_at_the_paragraph() {
        let metadata: MentionMetadata = [("https://inst/@bob", "bob", GlobalId(42))]
            .into_iter()
            .collect();
        let markup = r#"<p>hi <a class="mention" href="https://inst/@bob">@bob</p><p>important text</p>"#;
        assert_eq!(
            TootRenderer::new().render(markup, Some(&metadata)).text(),
            "hi @bob (id:42)\n\nimportant text"
        );
        assert!(logs_contain("closing mention left open at line break"));

        let styled = TootRenderer::with_options(TootRenderOptions {
            mention_style: Some("<M>".to_string()),
            reset: "</>".to_string(),
            ..Default::default()
        });
        assert_eq!(
            styled
                .render(r#"<a class="mention" href="https://inst/@bob">@bob<br>after"#, Some(&metadata))
                .text(),
            "<M>@bob (id:42)</>\nafter"
        );
    }

    #[test]
    fn unknown_mentions_keep_literal_text() {
        let metadata: MentionMetadata = [("https://inst/@bob", "bob", GlobalId(42))]
            .into_iter()
            .collect();
        let rendered = TootRenderer::new().render(
            r#"<a href="https://inst/@eve" class="u-url mention">@eve</a>"#,
            Some(&metadata),
        );
        assert_eq!(rendered.text(), "@eve");
    }

    #[test]
    fn shortens_links_with_invisible_and_ellipsis_spans() {
        let options = TootRenderOptions {
            shorten_links: true,
            ..Default::default()
        };
        let rendered = render_toot(SHORTENED, &options);
        assert_eq!(rendered.text(), "see example.com/...");
        assert_eq!(
            rendered.weblinks(),
            vec!["https://example.com/a/really/long/path".to_string()]
        );

        assert_eq!(plain(SHORTENED), "see https://example.com/a/really/long/path");
    }

    #[test]
    fn ellipsis_span_text_stays_before_the_marker() {
        let options = TootRenderOptions {
            shorten_links: true,
            ..Default::default()
        };
        let rendered = render_toot(
            concat!(
                r#"<a href="https://example.com/very/long"><span class="invisible">https://</span>"#,
                r#"example.com/<span class="ellipsis">very/long</span></a>"#,
            ),
            &options,
        );
        assert_eq!(rendered.text(), "example.com/very/long...");
        assert_eq!(
            rendered.weblinks(),
            vec!["https://example.com/very/long".to_string()]
        );
    }

    #[test]
    fn spans_outside_plain_links_are_ignored() {
        let options = TootRenderOptions {
            shorten_links: true,
            ..Default::default()
        };
        assert_eq!(
            render_toot(r#"<span class="invisible">shown</span>"#, &options).text(),
            "shown"
        );
        assert_eq!(
            render_toot(
                r##"<a href="#t" class="hashtag"><span class="invisible">#tag</span></a>"##,
                &options
            )
            .text(),
            "#tag"
        );
    }

    #[test]
    fn styled_anchors_are_reset_on_close() {
        let options = TootRenderOptions {
            link_style: Some("<L>".to_string()),
            mention_style: Some("<M>".to_string()),
            reset: "</>".to_string(),
            ..Default::default()
        };
        assert_eq!(
            render_toot(
                concat!(
                    r#"<a href="https://w">w</a> <a class="mention" href="https://m">@m</a> "#,
                    r#"<a class="hashtag" href="https://h">#h</a>"#,
                ),
                &options
            )
            .text(),
            "<L>w</> <M>@m</> #h"
        );
    }

    #[test]
    #[traced_test]
    fn nested_anchor_closes_the_outer_one_first() {
        let options = TootRenderOptions {
            link_style: Some("<L>".to_string()),
            hashtag_style: Some("<H>".to_string()),
            reset: "</>".to_string(),
            ..Default::default()
        };
        let rendered = render_toot(
            r#"<a href="https://w">out <a class="hashtag" href="https://h">#in</a> tail</a>"#,
            &options,
        );
        assert_eq!(rendered.text(), "<L>out </><H>#in</> tail");
        assert_eq!(rendered.weblinks(), vec!["https://w".to_string()]);
        assert!(logs_contain("closing anchor before a nested anchor"));
    }

    #[test]
    fn theme_tokens_are_sgr_sequences() {
        let options = TootRenderOptions::default().with_theme(&TootTheme::default());
        assert_eq!(
            render_toot(r#"<a class="hashtag" href="https://h">#h</a>"#, &options).text(),
            "\x1b[36m#h\x1b[0m"
        );
    }

    #[test]
    #[traced_test]
    fn unclosed_anchor_is_closed_at_end_of_input() {
        let options = TootRenderOptions {
            link_style: Some("<L>".to_string()),
            reset: "</>".to_string(),
            shorten_links: true,
            ..Default::default()
        };
        assert_eq!(
            render_toot(
                r#"go <a href="https://w/x"><span class="ellipsis">w/x"#,
                &options
            )
            .text(),
            "go <L>w/x...</>"
        );
        assert!(logs_contain("closing anchor left open at end of input"));
    }

    #[test]
    fn converts_emoji_in_text_only() {
        let to_unicode = TootRenderOptions {
            emoji_to_unicode: true,
            ..Default::default()
        };
        assert_eq!(
            render_toot(r#"<p>nice :thumbs_up: <a href="https://w/:x:">:tada:</a></p>"#, &to_unicode)
                .text(),
            "nice \u{1F44D} \u{1F389}"
        );

        let to_shortcode = TootRenderOptions {
            unicode_to_emoji: true,
            ..Default::default()
        };
        assert_eq!(
            render_toot("<p>nice \u{1F44D}</p>", &to_shortcode).text(),
            "nice :thumbs_up:"
        );
    }

    #[test]
    fn malformed_markup_degrades_to_text() {
        assert_eq!(plain("a < b </p"), "a < b </p");
        assert_eq!(plain("<p>x</div></span></a>y"), "xy");
        assert_eq!(plain("<unknown attr=1>t</unknown><!-- c -->"), "t");
    }

    #[test]
    fn decodes_entities_in_content() {
        assert_eq!(plain("<p>&lt;3 &amp; &quot;hi&quot;</p>"), "<3 & \"hi\"");
    }

    #[test]
    fn renderer_is_reusable() {
        let renderer = TootRenderer::with_options(TootRenderOptions {
            width: 20,
            ..Default::default()
        });
        let first = renderer.render(r#"<a href="https://one">one</a>"#, None);
        let second = renderer.render("two", None);
        assert_eq!(first.weblinks(), vec!["https://one".to_string()]);
        assert!(second.links().is_empty());
        assert_eq!(second.text(), "two");
    }

    proptest! {
        #[test]
        fn arbitrary_markup_never_panics(markup in ".{0,200}", width in 0usize..40) {
            let options = TootRenderOptions {
                width,
                shorten_links: true,
                emoji_to_unicode: true,
                ..Default::default()
            };
            let _ = render_toot(&markup, &options);
        }

        #[test]
        fn tagless_text_is_unchanged(text in "[a-zA-Z0-9 .,!?]{0,80}") {
            prop_assert_eq!(plain(&text), text);
        }
    }
}
