use super::*;

use serde_json::json;

fn origin() -> Url {
    Url::parse("https://swap.example.com/").expect("origin")
}

#[test]
fn parses_list_and_ignores_extra_fields() {
    let parsed = parse_catalog(json!([
        {"id": "dancer", "name": "Dancer", "thumbnail": "/templates/dancer.gif", "gif_path": "/templates/dancer.gif", "category": "general"}
    ]))
    .expect("catalog");
    assert_eq!(parsed.skipped, 0);
    assert_eq!(parsed.templates.len(), 1);
    assert_eq!(parsed.templates[0].name, "Dancer");
}

#[test]
fn rejects_non_list_payloads() {
    for payload in [json!(null), json!("oops"), json!({"templates": []}), json!(3)] {
        assert!(parse_catalog(payload.clone()).is_err(), "{payload}");
    }
}

#[test]
fn entry_without_thumbnail_and_numeric_id_are_loaded() {
    let update = apply_catalog_response(Ok(json!([
        {"id": "a", "name": "A"},
        {"id": 7, "name": "B", "thumbnail": "/t/b.gif"}
    ])));

    assert_eq!(update.status, "2 templates loaded");
    let catalog = update.catalog.expect("catalog");
    assert_eq!(catalog.count(), Some(2));
    assert!(catalog.find(&TemplateId::new("7")).is_some());

    let cards = template_cards(&catalog, None, &origin());
    assert_eq!(cards[0].thumbnail_url, PLACEHOLDER_THUMBNAIL);
    assert_eq!(cards[1].thumbnail_url, "https://swap.example.com/t/b.gif");
}

#[test]
fn unusable_entries_are_skipped_and_reported() {
    let update = apply_catalog_response(Ok(json!([
        {"id": "dancer", "name": "Dancer", "thumbnail": "/t/dancer.gif"},
        {"name": "missing id"},
        "not an object",
        {"id": "nameless"}
    ])));

    assert_eq!(update.status, "2 templates loaded (2 skipped)");
    let catalog = update.catalog.expect("catalog");
    assert_eq!(catalog.templates()[1].name, "nameless");
}

#[test]
fn off_origin_thumbnails_fall_back_to_placeholder() {
    for thumbnail in [
        "//evil.example/x.gif",
        "http://other/x.gif",
        "javascript:alert(1)",
        "/\\evil.example/x.gif",
    ] {
        assert_eq!(
            thumbnail_url(&origin(), thumbnail),
            PLACEHOLDER_THUMBNAIL,
            "{thumbnail}"
        );
    }
    assert_eq!(
        thumbnail_url(&origin(), "templates/x.gif"),
        "https://swap.example.com/templates/x.gif"
    );
}

#[test]
fn empty_list_is_loaded_but_still_offers_recovery() {
    let update = apply_catalog_response(Ok(json!([])));
    assert_eq!(update.catalog, Some(Catalog::Loaded(Vec::new())));
    assert_eq!(update.status, "0 templates loaded");
    assert_eq!(
        update.catalog.expect("catalog").recovery_actions(),
        vec![RecoveryAction::Reload, RecoveryAction::CreateDemos]
    );
}

#[test]
fn transport_failure_leaves_catalog_alone() {
    let update = apply_catalog_response(Err(WorkflowError::network("connection refused")));
    assert!(update.catalog.is_none());
    assert_eq!(
        update.status,
        "Error loading templates: connection error: connection refused"
    );
}

#[test]
fn cards_resolve_thumbnails_and_mark_selection() {
    let catalog = Catalog::Loaded(vec![
        Template {
            id: TemplateId::new("dancer"),
            name: "Dancer".into(),
            thumbnail: "/templates/dancer.gif".into(),
        },
        Template {
            id: TemplateId::new("blank"),
            name: "Blank".into(),
            thumbnail: "".into(),
        },
    ]);
    let selected = TemplateId::new("dancer");

    let cards = template_cards(&catalog, Some(&selected), &origin());

    assert_eq!(
        cards[0].thumbnail_url,
        "https://swap.example.com/templates/dancer.gif"
    );
    assert!(cards[0].selected);
    assert_eq!(cards[1].thumbnail_url, PLACEHOLDER_THUMBNAIL);
    assert!(!cards[1].selected);
}
