use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tootview_core::ids::GlobalId;
use tootview_html::{MentionMetadata, TootRenderOptions, TootRenderer};

#[derive(Clone, Debug)]
struct GoldenCase {
    name: &'static str,
    fixture: &'static str,
    width: usize,
}

fn repo_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .canonicalize()
        .expect("repo root")
}

fn read_fixture(rel: &str) -> String {
    fs::read_to_string(repo_root().join(rel)).expect("read fixture")
}

fn golden_path(case: &GoldenCase) -> PathBuf {
    repo_root()
        .join("docs/fixtures/golden/toots")
        .join(format!("{}__w{}.txt", case.name, case.width))
}

fn normalize(s: &str) -> String {
    let mut out = String::new();
    for (i, line) in s.replace("\r\n", "\n").split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.trim_end());
    }
    out.trim_end_matches('\n').to_string()
}

fn render(case: &GoldenCase) -> String {
    let markup = read_fixture(case.fixture);
    let renderer = TootRenderer::with_options(TootRenderOptions {
        indent: "  ".to_string(),
        width: case.width,
        shorten_links: true,
        emoji_to_unicode: true,
        ..TootRenderOptions::default()
    });
    let mentions: MentionMetadata = [(
        "https://social.example/@ferris",
        "ferris",
        GlobalId(109_876_543_210),
    )]
    .into_iter()
    .collect();
    let rendered = renderer.render(&markup, Some(&mentions));

    let mut out = rendered.text().to_string();
    out.push_str("\n--- weblinks");
    for link in rendered.weblinks() {
        out.push('\n');
        out.push_str(&link);
    }
    out.push_str("\n--- link targets");
    for link in rendered.link_targets() {
        out.push('\n');
        out.push_str(&link);
    }
    normalize(&out)
}

fn update_goldens_enabled() -> bool {
    matches!(
        std::env::var("UPDATE_GOLDENS").as_deref(),
        Ok("1" | "true" | "yes")
    )
}

fn check_golden(case: GoldenCase) {
    let got = render(&case);
    let path = golden_path(&case);

    if update_goldens_enabled() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create golden dir");
        }
        fs::write(&path, format!("{got}\n")).expect("write golden");
        return;
    }

    let expected = fs::read_to_string(&path).unwrap_or_else(|_| {
        panic!(
            "missing golden file: {}\nRun: UPDATE_GOLDENS=1 cargo test -p tootview-html golden",
            path.display()
        )
    });
    let expected = normalize(&expected);
    assert_eq!(
        got,
        expected,
        "golden mismatch: {}\nRun: UPDATE_GOLDENS=1 cargo test -p tootview-html golden",
        path.display()
    );
}

#[test]
fn golden_status_w80() {
    check_golden(GoldenCase {
        name: "status",
        fixture: "docs/fixtures/toots/status.html",
        width: 80,
    });
}

#[test]
fn golden_status_w40() {
    check_golden(GoldenCase {
        name: "status",
        fixture: "docs/fixtures/toots/status.html",
        width: 40,
    });
}

#[test]
fn golden_messy_w80() {
    check_golden(GoldenCase {
        name: "messy",
        fixture: "docs/fixtures/toots/messy.html",
        width: 80,
    });
}

#[test]
fn golden_messy_w40() {
    check_golden(GoldenCase {
        name: "messy",
        fixture: "docs/fixtures/toots/messy.html",
        width: 40,
    });
}
