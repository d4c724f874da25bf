//! Web Annotation selector model
//!
//! A [`Selector`] is a tagged variant plus an optional refinement that
//! narrows whatever the outer selector matched. The JSON shape is the
//! compatibility surface: a `type` discriminator, the variant's fields and an
//! optional `refinedBy`:
//!
//! ```json
//! {"type":"CssSelector","value":"#root > p:nth-child(2)",
//!  "refinedBy":{"type":"RangeSelector",
//!    "startSelector":{"type":"TextPositionSelector","start":4,"end":4},
//!    "endSelector":{"type":"TextPositionSelector","start":17,"end":17}}}
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A portable location or range descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(flatten)]
    pub kind: SelectorKind,

    #[serde(
        rename = "refinedBy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refined_by: Option<Box<Selector>>,
}

/// The closed set of selector variants.
///
/// Only `Css`, `TextPosition` and `Range` are produced and resolved by this
/// crate; the rest are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SelectorKind {
    #[serde(rename = "CssSelector")]
    Css { value: String },

    #[serde(rename = "TextPositionSelector")]
    TextPosition { start: i64, end: i64 },

    #[serde(rename = "RangeSelector")]
    Range {
        #[serde(rename = "startSelector")]
        start_selector: Box<Selector>,
        #[serde(rename = "endSelector")]
        end_selector: Box<Selector>,
    },

    #[serde(rename = "XPathSelector")]
    XPath { value: String },

    #[serde(rename = "TextQuoteSelector")]
    TextQuote {
        exact: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suffix: Option<String>,
    },

    #[serde(rename = "DataPositionSelector")]
    DataPosition { start: i64, end: i64 },

    #[serde(rename = "SvgSelector")]
    Svg { value: String },

    #[serde(rename = "FragmentSelector")]
    Fragment {
        #[serde(rename = "conformsTo", default, skip_serializing_if = "Option::is_none")]
        conforms_to: Option<String>,
        value: String,
    },
}

impl SelectorKind {
    /// Wire name of the variant
    pub fn tag(&self) -> &'static str {
        match self {
            SelectorKind::Css { .. } => "CssSelector",
            SelectorKind::TextPosition { .. } => "TextPositionSelector",
            SelectorKind::Range { .. } => "RangeSelector",
            SelectorKind::XPath { .. } => "XPathSelector",
            SelectorKind::TextQuote { .. } => "TextQuoteSelector",
            SelectorKind::DataPosition { .. } => "DataPositionSelector",
            SelectorKind::Svg { .. } => "SvgSelector",
            SelectorKind::Fragment { .. } => "FragmentSelector",
        }
    }
}

impl From<SelectorKind> for Selector {
    fn from(kind: SelectorKind) -> Self {
        Selector {
            kind,
            refined_by: None,
        }
    }
}

impl Selector {
    pub fn css(value: impl Into<String>) -> Self {
        SelectorKind::Css {
            value: value.into(),
        }
        .into()
    }

    pub fn text_position(start: i64, end: i64) -> Self {
        SelectorKind::TextPosition { start, end }.into()
    }

    /// Degenerate text position marking a single point
    pub fn cursor(offset: i64) -> Self {
        Self::text_position(offset, offset)
    }

    pub fn range(start: Selector, end: Selector) -> Self {
        SelectorKind::Range {
            start_selector: Box::new(start),
            end_selector: Box::new(end),
        }
        .into()
    }

    /// Attach `refinement`, replacing any existing one
    pub fn refined_by(mut self, refinement: Selector) -> Self {
        self.refined_by = Some(Box::new(refinement));
        self
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Refinement chain starting at this selector
    pub fn chain(&self) -> impl Iterator<Item = &Selector> {
        std::iter::successors(Some(self), |selector| selector.refined_by.as_deref())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
