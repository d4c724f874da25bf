//! Encode → JSON → decode against whole documents

use anchoring::{decode_all, decode_range, AnchorError, Encoder, SelectionRange, Selector};
use dom::{
    BoundaryPoint, DocumentBuilder, DomArena, DomService, DomServiceConfig, NodeId, TextUnit,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn cdp_element(
    backend_id: u32,
    name: &str,
    attributes: &[&str],
    children: Vec<Value>,
) -> Value {
    json!({
        "nodeId": backend_id,
        "backendNodeId": backend_id,
        "nodeType": 1,
        "nodeName": name,
        "nodeValue": "",
        "attributes": attributes,
        "children": children,
    })
}

fn cdp_text(backend_id: u32, value: &str) -> Value {
    json!({
        "nodeId": backend_id,
        "backendNodeId": backend_id,
        "nodeType": 3,
        "nodeName": "#text",
        "nodeValue": value,
    })
}

fn cdp_document(body: Vec<Value>) -> Value {
    json!({
        "root": {
            "nodeId": 1,
            "backendNodeId": 1,
            "nodeType": 9,
            "nodeName": "#document",
            "nodeValue": "",
            "children": [cdp_element(2, "HTML", &[], vec![cdp_element(3, "BODY", &[], body)])],
        }
    })
}

fn load(document: &Value, text_unit: TextUnit) -> DomArena {
    let mut service = DomService::with_config(DomServiceConfig { text_unit });
    service.parse_cdp_dom_tree(document).unwrap();
    service.into_arena()
}

/// `<div id="a"><p>Hello <b>world</b></p></div>`
fn scenario() -> DomArena {
    let div = cdp_element(
        10,
        "DIV",
        &["id", "a"],
        vec![cdp_element(
            11,
            "P",
            &[],
            vec![
                cdp_text(12, "Hello "),
                cdp_element(13, "B", &[], vec![cdp_text(14, "world")]),
            ],
        )],
    );
    load(&cdp_document(vec![div]), TextUnit::Utf16)
}

fn cursors(start: i64, end: i64) -> Selector {
    Selector::range(Selector::cursor(start), Selector::cursor(end))
}

/// Encode, ship through JSON, decode, and return the selected text
fn round_trip(arena: &DomArena, range: SelectionRange<NodeId>) -> (Selector, String) {
    let html = arena.document_element().unwrap();
    let selector = Encoder::new().encode_range(arena, &range, html).unwrap();

    let stored = selector.to_json().unwrap();
    let restored = Selector::from_json(&stored).unwrap();
    assert_eq!(restored, selector);

    let resolved = decode_range(arena, &restored, html).unwrap();
    (selector, arena.range_text(&resolved).unwrap())
}

#[test]
fn test_scenario_common_ancestors() {
    let arena = scenario();
    let html = arena.document_element().unwrap();
    let b = arena.find_by_tag("b")[0];
    let div = arena.find_by_id("a").unwrap();
    let world = arena.find_text("world").unwrap();
    let select = |common| {
        SelectionRange::new(
            BoundaryPoint::new(world, 0),
            BoundaryPoint::new(world, 5),
            Some(common),
        )
    };

    let (selector, text) = round_trip(&arena, select(b));
    assert_eq!(
        selector,
        Selector::css("#a > p:nth-child(1) > b:nth-child(1)").refined_by(cursors(0, 5))
    );
    assert_eq!(text, "world");

    let (selector, text) = round_trip(&arena, select(div));
    assert_eq!(selector, Selector::css("#a").refined_by(cursors(6, 11)));
    assert_eq!(text, "world");

    let (selector, text) = round_trip(&arena, select(html));
    assert_eq!(selector, cursors(6, 11));
    assert_eq!(text, "world");
}

#[test]
fn test_stored_json_resolves() {
    let arena = scenario();
    let html = arena.document_element().unwrap();

    let stored = json!({
        "type": "CssSelector",
        "value": "#a",
        "refinedBy": {
            "type": "RangeSelector",
            "startSelector": {"type": "TextPositionSelector", "start": 0, "end": 0},
            "endSelector": {"type": "TextPositionSelector", "start": 5, "end": 5},
        },
    })
    .to_string();
    let range = decode_range(&arena, &Selector::from_json(&stored).unwrap(), html).unwrap();
    assert_eq!(arena.range_text(&range).unwrap(), "Hello");
}

#[test]
fn test_graceful_miss() {
    let arena = scenario();
    let html = arena.document_element().unwrap();

    let selector = Selector::from_json(r##"{"type":"CssSelector","value":"#missing"}"##).unwrap();
    match decode_range(&arena, &selector, html) {
        Err(AnchorError::NoMatch { selector }) => assert_eq!(selector, "#missing"),
        other => panic!("expected NoMatch, got {:?}", other),
    }
}

#[test]
fn test_survives_edits_outside_the_anchor() {
    let arena = scenario();
    let world = arena.find_text("world").unwrap();
    let div = arena.find_by_id("a").unwrap();
    let (selector, _) = round_trip(
        &arena,
        SelectionRange::new(
            BoundaryPoint::new(world, 1),
            BoundaryPoint::new(world, 4),
            Some(div),
        ),
    );

    // Same content re-rendered with a banner in front of it
    let mut b = DocumentBuilder::new();
    b.open("html")
        .open("body")
        .open("header")
        .text("New banner text")
        .close()
        .open("div")
        .attr("id", "a")
        .open("p")
        .text("Hello ")
        .open("b")
        .text("world")
        .close()
        .close()
        .close()
        .close()
        .close();
    let edited = b.build();
    let html = edited.document_element().unwrap();

    let range = decode_range(&edited, &selector, html).unwrap();
    assert_eq!(edited.range_text(&range).unwrap(), "orl");

    // Anchor gone entirely
    let mut b = DocumentBuilder::new();
    b.open("html").open("body").text("Hello world").close().close();
    let gutted = b.build();
    let html = gutted.document_element().unwrap();
    assert!(matches!(
        decode_range(&gutted, &selector, html),
        Err(AnchorError::NoMatch { .. })
    ));
}

#[test]
fn test_offsets_follow_the_host_text_unit() {
    let paragraph = cdp_element(10, "P", &["id", "u"], vec![cdp_text(11, "héllo 😀 wörld")]);
    let document = cdp_document(vec![paragraph]);

    for (unit, start, end) in [(TextUnit::Utf16, 9, 14), (TextUnit::Char, 8, 13)] {
        let arena = load(&document, unit);
        let leaf = arena.find_text("héllo 😀 wörld").unwrap();
        let range = SelectionRange::new(
            BoundaryPoint::new(leaf, start),
            BoundaryPoint::new(leaf, end),
            Some(leaf),
        );

        let (selector, text) = round_trip(&arena, range);
        assert_eq!(
            selector,
            Selector::css("#u").refined_by(cursors(start as i64, end as i64))
        );
        assert_eq!(text, "wörld");
    }
}

#[test]
fn test_selection_batch() {
    let arena = scenario();
    let html = arena.document_element().unwrap();
    let hello = arena.find_text("Hello ").unwrap();
    let world = arena.find_text("world").unwrap();
    let p = arena.find_by_tag("p")[0];

    let select = |start: (NodeId, usize), end: (NodeId, usize), common| {
        SelectionRange::new(
            BoundaryPoint::new(start.0, start.1),
            BoundaryPoint::new(end.0, end.1),
            Some(common),
        )
    };

    let ranges = [
        select((hello, 0), (hello, 5), hello),
        select((world, 2), (world, 2), world),
        select((hello, 4), (world, 2), p),
    ];
    let selectors = Encoder::new().encode_selection(&arena, ranges, html).unwrap();
    assert_eq!(selectors.len(), 2);

    let texts: Vec<String> = decode_all(&arena, &selectors, html)
        .into_iter()
        .map(|resolved| arena.range_text(&resolved.unwrap()).unwrap())
        .collect();
    assert_eq!(texts, vec!["Hello", "o wo"]);
}

#[test]
fn test_deeply_nested_anchor() {
    const DEPTH: usize = 2_000;

    let mut b = DocumentBuilder::new();
    b.open("html").open("body");
    for _ in 0..DEPTH {
        b.open("span");
    }
    b.text("nested leaf");
    for _ in 0..DEPTH {
        b.close();
    }
    b.close().close();
    let arena = b.build();

    let leaf = arena.find_text("nested leaf").unwrap();
    let range = SelectionRange::new(
        BoundaryPoint::new(leaf, 7),
        BoundaryPoint::new(leaf, 11),
        Some(leaf),
    );

    let (selector, text) = round_trip(&arena, range);
    assert_eq!(selector.refined_by, Some(Box::new(cursors(7, 11))));
    assert_eq!(text, "leaf");
}

/// Paragraphs of alternating plain and `<em>` chunks; even paragraphs get ids
fn build_document(paragraphs: &[Vec<String>]) -> DomArena {
    let mut b = DocumentBuilder::new();
    b.open("html").open("body");
    for (i, chunks) in paragraphs.iter().enumerate() {
        b.open("p");
        if i % 2 == 0 {
            b.attr("id", &format!("p{}", i));
        }
        for (j, chunk) in chunks.iter().enumerate() {
            if j % 2 == 1 {
                b.open("em").text(chunk).close();
            } else {
                b.text(chunk);
            }
        }
        b.close();
    }
    b.close().close();
    b.build()
}

proptest! {
    #[test]
    fn prop_encode_decode_preserves_document_offsets(
        paragraphs in prop::collection::vec(
            prop::collection::vec("[a-z ]{0,6}", 1..4),
            1..5,
        ),
        picks in (0usize..1000, 0usize..1000),
    ) {
        let arena = build_document(&paragraphs);
        let html = arena.document_element().unwrap();
        let total = anchoring::scanner::text_length(&arena, html);
        prop_assume!(total > 0);

        let (a, b) = (picks.0 % (total + 1), picks.1 % (total + 1));
        let (from, to) = (a.min(b), a.max(b));
        let anchors = anchoring::anchors_at_offsets(&arena, html, [from, to]);
        let range = arena
            .create_range(anchors[&from].into(), anchors[&to].into())
            .unwrap();

        let selector = Encoder::new().encode_host_range(&arena, &range, html).unwrap();
        let restored = Selector::from_json(&selector.to_json().unwrap()).unwrap();
        let resolved = decode_range(&arena, &restored, html).unwrap();

        prop_assert_eq!(arena.text_offset(html, resolved.start).unwrap(), from);
        prop_assert_eq!(arena.text_offset(html, resolved.end).unwrap(), to);
    }
}
