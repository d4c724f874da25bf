//! Round trip example - encode a selection, store it as JSON, resolve it again
//!
//! Run with `RUST_LOG=debug` to see the codec's decisions.

use anchoring::{decode_range, Encoder, SelectionRange, Selector};
use dom::{BoundaryPoint, DocumentBuilder};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // <html><body><div id="a"><p>Hello <b>world</b></p></div></body></html>
    let mut builder = DocumentBuilder::new();
    builder
        .open("html")
        .open("body")
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
    let arena = builder.build();

    let html = arena.document_element().ok_or("document has no element")?;
    let world = arena.find_text("world").ok_or("missing text")?;
    let div = arena.find_by_id("a").ok_or("missing #a")?;

    // "world", with the div as common ancestor
    let selection = SelectionRange::new(
        BoundaryPoint::new(world, 0),
        BoundaryPoint::new(world, 5),
        Some(div),
    );
    let selector = Encoder::new().encode_range(&arena, &selection, html)?;

    let stored = selector.to_json()?;
    println!("Stored selector: {}", stored);

    let restored = Selector::from_json(&stored)?;
    let range = decode_range(&arena, &restored, html)?;
    println!("Resolved text: {:?}", arena.range_text(&range)?);

    // Resolution failures are values, not panics
    let stale = Selector::css("#gone").refined_by(Selector::range(
        Selector::cursor(0),
        Selector::cursor(3),
    ));
    if let Err(err) = decode_range(&arena, &stale, html) {
        println!("Stale selector: {}", err);
    }

    Ok(())
}
