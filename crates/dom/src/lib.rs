//! Document tree host for annotation anchoring
//!
//! Arena-backed document trees with just enough DOM behaviour for selectors
//! to be encoded against them and resolved back into ranges.
//!
//! ## Core Design
//!
//! ```text
//! CDP JSON / DocumentBuilder → DomArena (owned) → host traits → anchoring codec
//!                                   ↓
//!                             NodeId (u32), DomRange
//! ```
//!
//! - **Data structures first**: nodes live in one `Vec`, links are indices
//! - **No recursion**: traversals use explicit stacks
//! - **Host traits**: the codec only sees [`TreeShape`], [`TreeQuery`] and
//!   [`RangeMaterializer`]

pub mod arena;
pub mod builder;
pub mod error;
pub mod host;
pub mod query;
pub mod range;
pub mod service;
pub mod types;

pub use arena::DomArena;
pub use builder::DocumentBuilder;
pub use error::{DomError, Result};
pub use host::{Anchor, BoundaryPoint, NodeKind, RangeMaterializer, TreeQuery, TreeShape};
pub use query::{escape_identifier, quote_string, CompiledSelector};
pub use range::DomRange;
pub use service::{DomService, DomServiceConfig};
pub use types::*;
