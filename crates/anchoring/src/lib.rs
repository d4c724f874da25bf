//! Annotation anchoring selector codec
//!
//! Turns a live selection inside a document tree into a portable
//! [`Selector`] and resolves stored selectors back into ranges, tolerating
//! drift (missing elements, shifted text) with descriptive errors instead of
//! panics.
//!
//! ## Core Design
//!
//! ```text
//! SelectionRange → Encoder → Selector ⇄ JSON
//!                              ↓
//!              decode_range(tree, selector, root) → host range
//! ```
//!
//! - **Offsets are relative**: text positions count from the start of the
//!   element the enclosing `CssSelector` matched, not from the document
//! - **Host-agnostic**: trees are read through the `dom` host traits, so any
//!   tree that implements them can be anchored against
//! - **No recursion**: scanning and refinement chains are walked iteratively

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod path;
pub mod scanner;
pub mod selector;

pub use config::CodecConfig;
pub use decoder::{decode_all, decode_range, resolve_marker};
pub use encoder::{Encoder, SelectionRange};
pub use error::{AnchorError, Result};
pub use path::PathBuilder;
pub use scanner::{anchor_at_offset, anchors_at_offsets, character_offset_of, Step};
pub use selector::{Selector, SelectorKind};
