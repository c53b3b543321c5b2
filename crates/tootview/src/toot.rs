//! Toot records as the server API returns them, and the display block built from one.

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::style::Stylize;
use serde::Deserialize;
use serde::Deserializer;
use tootview_core::ids::GlobalId;
use tootview_core::ids::IdMap;
use tootview_core::ids::LocalId;
use tootview_core::style::RESET;
use tootview_core::style::TootTheme;
use tootview_core::style::style_token;
use tootview_html::MentionMetadata;
use tootview_html::RenderedToot;
use tootview_html::TootRenderOptions;
use tootview_html::TootRenderer;

use crate::glyphs;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

// Servers send ids as decimal strings; some older ones send numbers.
fn global_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GlobalId, D::Error> {
    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(GlobalId(n)),
        RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Account {
    #[serde(deserialize_with = "global_id")]
    pub id: GlobalId,
    pub acct: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

impl Account {
    /// `@acct`, followed by a lock when the account approves followers.
    pub fn handle(&self) -> String {
        if self.locked {
            format!("@{} {}", self.acct, glyphs::LOCKED)
        } else {
            format!("@{}", self.acct)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Mention {
    #[serde(deserialize_with = "global_id")]
    pub id: GlobalId,
    pub acct: String,
    pub url: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Application {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MediaAttachment {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
    #[serde(other)]
    Unknown,
}

impl Visibility {
    pub fn glyph(self) -> &'static str {
        match self {
            Visibility::Public => glyphs::PUBLIC,
            Visibility::Unlisted => glyphs::UNLISTED,
            Visibility::Private => glyphs::PRIVATE,
            Visibility::Direct => glyphs::DIRECT,
            Visibility::Unknown => glyphs::UNKNOWN,
        }
    }
}

/// One status. Only the fields the display uses are kept; everything else in the payload is
/// ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Toot {
    #[serde(deserialize_with = "global_id")]
    pub id: GlobalId,
    pub account: Account,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spoiler_text: String,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mentions: Vec<Mention>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media_attachments: Vec<MediaAttachment>,
    #[serde(default)]
    pub reblog: Option<Box<Toot>>,
    #[serde(default)]
    pub reblogs_count: u64,
    #[serde(default)]
    pub favourites_count: u64,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub favourited: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reblogged: bool,
}

impl Toot {
    /// Mention metadata for rendering this toot's content.
    pub fn mention_metadata(&self) -> MentionMetadata {
        self.mentions
            .iter()
            .map(|m| (m.url.as_str(), m.acct.clone(), m.id))
            .collect()
    }
}

const NAME_COLORS: &[Color] = &[
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::LightRed,
    Color::LightGreen,
    Color::LightYellow,
    Color::LightBlue,
    Color::LightMagenta,
    Color::LightCyan,
];

/// A stable color per display name, so the same author looks the same across a timeline.
fn name_color(display_name: &str) -> Color {
    // FNV-1a
    let hash = display_name
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
    NAME_COLORS[(hash % NAME_COLORS.len() as u64) as usize]
}

/// The display block for one toot.
#[derive(Clone, Debug)]
pub struct FormattedToot {
    /// Local id handed out for the displayed toot (the boosted one for reblogs).
    pub local_id: LocalId,
    pub text: String,
    /// The rendered content, with its links.
    pub body: RenderedToot,
}

/// Builds the multi-line block shown for a toot in a timeline: an optional boost header, the
/// author line, counts and ids, the content warning, the content, and a media summary.
#[derive(Clone, Debug)]
pub struct TootFormatter {
    renderer: TootRenderer,
    color: bool,
}

impl Default for TootFormatter {
    fn default() -> Self {
        Self::new(TootRenderOptions {
            indent: "  ".to_string(),
            shorten_links: true,
            emoji_to_unicode: true,
            ..TootRenderOptions::default()
        }
        .with_theme(&TootTheme::default()))
    }
}

impl TootFormatter {
    pub fn new(options: TootRenderOptions) -> Self {
        Self {
            renderer: TootRenderer::with_options(options),
            color: true,
        }
    }

    /// Disables SGR styling of the header lines. Content styling is controlled by the render
    /// options.
    pub fn plain(self) -> Self {
        Self {
            color: false,
            ..self
        }
    }

    pub fn renderer(&self) -> &TootRenderer {
        &self.renderer
    }

    fn paint(&self, text: &str, style: Style) -> String {
        match style_token(style).filter(|_| self.color) {
            Some(token) => format!("{token}{text}{RESET}"),
            None => text.to_string(),
        }
    }

    fn name_line(&self, toot: &Toot) -> String {
        let account = &toot.account;
        let mut parts = Vec::new();
        if !account.display_name.is_empty() {
            parts.push(self.paint(
                &account.display_name,
                Style::default().fg(name_color(&account.display_name)),
            ));
        }
        parts.push(self.paint(&account.handle(), Style::default().green()));
        if !toot.created_at.is_empty() {
            parts.push(self.paint(&toot.created_at, Style::default().dim()));
        }
        parts.join(" ")
    }

    fn id_line(&self, toot: &Toot, local_id: LocalId) -> String {
        let mut parts = vec![
            self.paint(
                &format!("{}:{}", glyphs::BOOST, toot.reblogs_count),
                Style::default().cyan(),
            ),
            self.paint(
                &format!("{}:{}", glyphs::FAVE, toot.favourites_count),
                Style::default().yellow(),
            ),
            self.paint(&format!("id:{local_id}"), Style::default().red()),
            self.paint(
                &format!("vis:{}", toot.visibility.glyph()),
                Style::default().blue(),
            ),
        ];
        if let Some(app) = toot.application.as_ref().filter(|a| !a.name.is_empty()) {
            parts.push(format!(
                "{}{}",
                self.paint("via ", Style::default().white()),
                self.paint(&app.name, Style::default().blue())
            ));
        }
        if toot.favourited {
            parts.push(self.paint(glyphs::FAVOURITED, Style::default().magenta()));
        }
        if toot.reblogged {
            parts.push(self.paint(glyphs::REBLOGGED, Style::default().magenta()));
        }
        parts.join(" ")
    }

    pub fn format(&self, toot: &Toot, ids: &mut IdMap) -> FormattedToot {
        let mut out = Vec::new();

        let toot = match toot.reblog.as_deref() {
            Some(boosted) => {
                let booster = &toot.account;
                out.push(format!(
                    "{}{}",
                    self.paint("  Boosted by ", Style::default().yellow()),
                    self.paint(
                        &format!("{} {}:", booster.display_name, booster.handle()),
                        Style::default().blue()
                    )
                ));
                boosted
            }
            None => toot,
        };

        let local_id = ids.to_local(toot.id);
        out.push(format!("  {}", self.name_line(toot)));
        out.push(format!("  {}", self.id_line(toot, local_id)));

        if !toot.spoiler_text.is_empty() {
            let warning = self
                .renderer
                .render(&format!("[CW: {}]", toot.spoiler_text), None);
            out.push(self.paint(warning.text(), Style::default().red()));
        }

        let mentions = toot.mention_metadata();
        let body = self.renderer.render(&toot.content, Some(&mentions));
        out.push(body.text().to_string());

        if !toot.media_attachments.is_empty() {
            let nsfw = if toot.sensitive { "NSFW " } else { "" };
            out.push(self.paint(
                &format!("  {nsfw}media: {}", toot.media_attachments.len()),
                Style::default().magenta(),
            ));
        }

        FormattedToot {
            local_id,
            text: out.join("\n"),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STATUS: &str = r#"{
        "id": "109876543210000001",
        "created_at": "2025-02-20T12:00:00.000Z",
        "spoiler_text": "",
        "sensitive": false,
        "visibility": "unlisted",
        "content": "<p>hi <span class=\"h-card\"><a href=\"https://inst.example/@bob\" class=\"u-url mention\">@<span>bob</span></a></span> :wave:</p><p>two</p>",
        "reblogs_count": 3,
        "favourites_count": 5,
        "favourited": true,
        "reblogged": null,
        "application": {"name": "tootview", "website": null},
        "account": {"id": "1", "acct": "alice", "display_name": "Alice", "locked": false, "url": "https://inst.example/@alice"},
        "mentions": [{"id": "42", "acct": "bob", "username": "bob", "url": "https://inst.example/@bob"}],
        "media_attachments": [],
        "reblog": null
    }"#;

    fn status() -> Toot {
        serde_json::from_str(STATUS).expect("status json")
    }

    #[test]
    fn parses_api_statuses() {
        let toot = status();
        assert_eq!(toot.id, GlobalId(109_876_543_210_000_001));
        assert_eq!(toot.visibility, Visibility::Unlisted);
        assert_eq!(toot.mentions[0].id, GlobalId(42));
        assert!(toot.favourited);
        assert!(!toot.reblogged);
        assert!(toot.reblog.is_none());
    }

    #[test]
    fn accepts_numeric_ids_and_unknown_visibility() {
        let toot: Toot = serde_json::from_str(
            r#"{"id": 7, "visibility": "limited", "account": {"id": 1, "acct": "a"}}"#,
        )
        .expect("minimal status");
        assert_eq!(toot.id, GlobalId(7));
        assert_eq!(toot.visibility, Visibility::Unknown);
        assert_eq!(toot.content, "");
    }

    #[test]
    fn rejects_malformed_ids() {
        let err = serde_json::from_str::<Toot>(r#"{"id": "abc", "account": {"id": 1, "acct": "a"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("malformed server id"), "{err}");
    }

    #[test]
    fn formats_the_display_block() {
        let formatter = TootFormatter::new(TootRenderOptions {
            indent: "  ".to_string(),
            emoji_to_unicode: true,
            ..TootRenderOptions::default()
        })
        .plain();
        let mut ids = IdMap::new();
        ids.to_local(GlobalId(99));

        let formatted = formatter.format(&status(), &mut ids);
        assert_eq!(formatted.local_id, 1);
        assert_eq!(
            formatted.text,
            [
                "  Alice @alice 2025-02-20T12:00:00.000Z",
                "  \u{267A}:3 \u{2665}:5 id:1 vis:\u{1F47B} via tootview \u{2605}",
                "  hi @bob (id:42) \u{1F44B}",
                "  ",
                "  two",
            ]
            .join("\n")
        );
        assert!(formatted.body.weblinks().is_empty());
        assert_eq!(ids.to_global(1), Ok(GlobalId(109_876_543_210_000_001)));
    }

    #[test]
    fn boosts_show_the_booster_then_the_boosted_toot() {
        let mut outer: Toot = serde_json::from_str(
            r#"{"id": "500", "account": {"id": "2", "acct": "carol@remote", "display_name": "Carol", "locked": true}}"#,
        )
        .expect("boost");
        let mut inner = status();
        inner.spoiler_text = "spoilers & more".to_string();
        inner.sensitive = true;
        inner.media_attachments = vec![MediaAttachment {
            kind: "image".to_string(),
            url: "https://inst.example/m/1.png".to_string(),
        }];
        outer.reblog = Some(Box::new(inner));

        let formatter = TootFormatter::new(TootRenderOptions::default()).plain();
        let mut ids = IdMap::new();
        let formatted = formatter.format(&outer, &mut ids);
        let lines = formatted.text.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "  Boosted by Carol @carol@remote \u{1F512}:");
        assert_eq!(formatted.local_id, 0);
        assert_eq!(ids.len(), 1);
        assert_eq!(lines[3], "[CW: spoilers & more]");
        assert_eq!(lines.last().copied(), Some("  NSFW media: 1"));
    }

    #[test]
    fn colors_header_lines_when_enabled() {
        let formatted = TootFormatter::default().format(&status(), &mut IdMap::new());
        let id_line = formatted.text.lines().nth(1).expect("id line");
        assert!(id_line.contains("\x1b[31mid:0\x1b[0m"), "{id_line:?}");
    }

    #[test]
    fn name_colors_are_stable() {
        assert_eq!(name_color("Alice"), name_color("Alice"));
        assert!(NAME_COLORS.contains(&name_color("")));
    }
}
