//! Prints toots from a JSON file the way a timeline shows them.
//!
//! ```text
//! cargo run -p tootview --example render_toot -- [--plain] [--width N] [statuses.json]
//! ```
//!
//! The file may hold one status object or an array of them. Without a file a built-in sample is
//! shown. Then type local ids (`0`, `1`, ...) to see the server id each one maps to.
use std::io;
use std::io::BufRead;
use std::io::Write;

use tootview::TootRenderOptions;
use tootview::ids::IdMap;
use tootview::style::TootTheme;
use tootview::toot::Toot;
use tootview::toot::TootFormatter;

const SAMPLE: &str = r#"[{
    "id": "109876543210000001",
    "created_at": "2025-02-20T12:00:00.000Z",
    "visibility": "public",
    "content": "<p>Release day! <a href=\"https://social.example/tags/rust\" class=\"mention hashtag\" rel=\"tag\">#<span>rust</span></a> :tada:</p><p>Notes: <a href=\"https://blog.example.org/2025/02/20/announcing-rust-1.85.0.html\" rel=\"nofollow noopener\" target=\"_blank\"><span class=\"invisible\">https://</span><span class=\"ellipsis\">blog.example.org/2025/02/20/an</span><span class=\"invisible\">nouncing-rust-1.85.0.html</span></a><br>thanks <span class=\"h-card\"><a href=\"https://social.example/@ferris\" class=\"u-url mention\">@<span>ferris</span></a></span></p>",
    "reblogs_count": 12,
    "favourites_count": 40,
    "application": {"name": "tootview"},
    "account": {"id": "1", "acct": "rustlang", "display_name": "Rust", "locked": false},
    "mentions": [{"id": "77", "acct": "ferris", "url": "https://social.example/@ferris"}],
    "media_attachments": [{"type": "image", "url": "https://social.example/m/1.png"}]
}]"#;

fn parse_statuses(json: &str) -> serde_json::Result<Vec<Toot>> {
    if json.trim_start().starts_with('[') {
        serde_json::from_str(json)
    } else {
        serde_json::from_str::<Toot>(json).map(|t| vec![t])
    }
}

fn main() -> io::Result<()> {
    let mut plain = false;
    let mut width: Option<usize> = None;
    let mut path: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--plain" => plain = true,
            "--width" => width = args.next().and_then(|w| w.parse().ok()),
            _ => path = Some(arg),
        }
    }

    let width = width.unwrap_or_else(|| {
        crossterm::terminal::size()
            .map(|(cols, _)| usize::from(cols))
            .unwrap_or(80)
    });

    let json = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };
    let statuses = parse_statuses(&json).map_err(io::Error::other)?;

    let mut options = TootRenderOptions {
        indent: "  ".to_string(),
        width,
        shorten_links: true,
        emoji_to_unicode: true,
        ..Default::default()
    };
    if !plain {
        options = options.with_theme(&TootTheme::default());
    }
    let mut formatter = TootFormatter::new(options);
    if plain {
        formatter = formatter.plain();
    }

    let mut ids = IdMap::new();
    let mut stdout = io::stdout().lock();
    for toot in &statuses {
        let formatted = formatter.format(toot, &mut ids);
        writeln!(stdout, "{}\n", formatted.text)?;
        for (n, link) in formatted.body.link_targets().iter().enumerate() {
            writeln!(stdout, "  [{n}] {link}")?;
        }
    }
    stdout.flush()?;
    drop(stdout);

    eprintln!("type a local id to resolve it, ctrl-d to quit");
    for line in io::stdin().lock().lines() {
        let line = line?;
        match ids.resolve(&line) {
            Ok(global) => println!("{line} -> {global}"),
            Err(err) => println!("{err}"),
        }
    }
    Ok(())
}
