use pretty_assertions::assert_eq;
use tootview::TootRenderOptions;
use tootview::ids::{GlobalId, IdError, IdMap};
use tootview::toot::{Toot, TootFormatter};

fn timeline() -> Vec<Toot> {
    serde_json::from_str(
        r#"[
            {"id": "900", "content": "<p>first</p>", "account": {"id": "1", "acct": "a"}},
            {"id": "901", "content": "<p>second <a href=\"https://w.example/x\">link</a></p>", "account": {"id": "2", "acct": "b"}},
            {"id": "902", "account": {"id": "1", "acct": "a"},
             "reblog": {"id": "900", "content": "<p>first</p>", "account": {"id": "1", "acct": "a"}}}
        ]"#,
    )
    .expect("timeline json")
}

#[test]
fn local_ids_follow_display_order_and_resolve_back() {
    let formatter = TootFormatter::new(TootRenderOptions::default()).plain();
    let mut ids = IdMap::new();
    let locals = timeline()
        .iter()
        .map(|toot| formatter.format(toot, &mut ids).local_id)
        .collect::<Vec<_>>();

    // The boost displays toot 900 again, so it reuses its local id.
    assert_eq!(locals, vec![0, 1, 0]);
    assert_eq!(ids.len(), 2);
    assert_eq!(ids.resolve("1"), Ok(GlobalId(901)));
    assert_eq!(
        ids.resolve("2"),
        Err(IdError::InvalidId {
            input: "2".to_string()
        })
    );
}

#[test]
fn display_block_carries_body_links() {
    let formatter = TootFormatter::new(TootRenderOptions::default()).plain();
    let toots = timeline();
    let formatted = formatter.format(&toots[1], &mut IdMap::new());
    assert_eq!(formatted.body.text(), "second link");
    assert_eq!(
        formatted.body.link_targets(),
        vec!["https://w.example/x".to_string()]
    );
    assert_eq!(
        formatted.text,
        "  @b\n  \u{267A}:0 \u{2665}:0 id:0 vis:\u{1F30E}\nsecond link"
    );
}
