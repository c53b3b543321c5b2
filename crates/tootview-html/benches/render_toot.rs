use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use tootview_core::style::TootTheme;
use tootview_html::view::TootRenderOptions;
use tootview_html::view::TootRenderer;

fn sample_toot(paragraphs: usize) -> String {
    let mut s = String::new();
    for i in 0..paragraphs {
        s.push_str("<p>The quick brown fox jumps over the lazy dog :thumbs_up: ");
        s.push_str(r#"<a href="https://social.example/tags/fox" class="mention hashtag" rel="tag">#<span>fox</span></a> "#);
        s.push_str(r#"<span class="h-card"><a href="https://social.example/@dog" class="u-url mention">@<span>dog</span></a></span> "#);
        s.push_str(&format!(
            r#"<a href="https://example.com/a/very/long/path/{i}" rel="nofollow noopener" target="_blank"><span class="invisible">https://</span><span class="ellipsis">example.com/a/very/lo</span><span class="invisible">ng/path/{i}</span></a>"#
        ));
        s.push_str("<br>second line &amp; more</p>");
    }
    s
}

fn bench_render_plain(c: &mut Criterion) {
    let markup = sample_toot(20);
    let renderer = TootRenderer::new();
    c.bench_function("render_toot/plain", |b| {
        b.iter(|| {
            let rendered = renderer.render(black_box(&markup), None);
            black_box(rendered.text().len());
        })
    });
}

fn bench_render_wrapped_styled(c: &mut Criterion) {
    let markup = sample_toot(20);
    let renderer = TootRenderer::with_options(
        TootRenderOptions {
            indent: "  ".to_string(),
            width: 72,
            shorten_links: true,
            emoji_to_unicode: true,
            ..Default::default()
        }
        .with_theme(&TootTheme::default()),
    );
    c.bench_function("render_toot/wrapped_styled", |b| {
        b.iter(|| {
            let rendered = renderer.render(black_box(&markup), None);
            black_box(rendered.link_targets().len());
        })
    });
}

criterion_group!(benches, bench_render_plain, bench_render_wrapped_styled);
criterion_main!(benches);
